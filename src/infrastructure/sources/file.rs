use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::RecordSource;
use crate::domain::error::{AppError, Result};
use crate::domain::health::SourceTable;
use crate::infrastructure::csv::{read_first_sheet, CsvParser};

/// A local `.csv` or `.xlsx` export, re-read on every cycle
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(path: &Path) -> Result<SourceTable> {
        if !path.is_file() {
            return Err(AppError::SourceUnavailable(format!(
                "File not found: {}",
                path.display()
            )));
        }

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();

        let table = match extension.as_str() {
            "xlsx" | "xlsm" => read_first_sheet(path),
            _ => CsvParser::new().parse_file(path),
        };

        table.map_err(|e| match e {
            AppError::IoError(msg) => AppError::SourceUnavailable(msg),
            other => other,
        })
    }
}

#[async_trait]
impl RecordSource for FileSource {
    async fn fetch(&self) -> Result<SourceTable> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || Self::read(&path))
            .await
            .map_err(|e| AppError::Internal(format!("File read task failed: {}", e)))?
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}
