pub mod file;
pub mod google_sheet;

use crate::domain::error::Result;
use crate::domain::health::SourceTable;
use async_trait::async_trait;

pub use file::FileSource;
pub use google_sheet::GoogleSheetSource;

/// Supplier of the raw tabular dataset for one reconciliation cycle
#[async_trait]
pub trait RecordSource {
    async fn fetch(&self) -> Result<SourceTable>;

    /// Short description for logs
    fn describe(&self) -> String;
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use crate::domain::error::AppError;
    use std::sync::Mutex;

    /// Serves a table until told to fail; the table can be swapped
    pub struct StaticSource {
        table: Mutex<SourceTable>,
        failure: Mutex<Option<AppError>>,
    }

    impl StaticSource {
        pub fn new(table: SourceTable) -> Self {
            Self {
                table: Mutex::new(table),
                failure: Mutex::new(None),
            }
        }

        pub fn replace(&self, table: SourceTable) {
            *self.table.lock().unwrap() = table;
        }

        pub fn fail_with(&self, err: AppError) {
            *self.failure.lock().unwrap() = Some(err);
        }
    }

    #[async_trait]
    impl RecordSource for StaticSource {
        async fn fetch(&self) -> Result<SourceTable> {
            if let Some(err) = self.failure.lock().unwrap().clone() {
                return Err(err);
            }
            Ok(self.table.lock().unwrap().clone())
        }

        fn describe(&self) -> String {
            "static table".to_string()
        }
    }

    pub struct FailingSource;

    #[async_trait]
    impl RecordSource for FailingSource {
        async fn fetch(&self) -> Result<SourceTable> {
            Err(AppError::SourceUnavailable("source offline".to_string()))
        }

        fn describe(&self) -> String {
            "failing source".to_string()
        }
    }
}
