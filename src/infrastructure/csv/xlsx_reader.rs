// ============================================================
// XLSX READER
// ============================================================
// First worksheet of an Excel workbook as a SourceTable

use std::path::Path;

use calamine::{open_workbook, DataType, Reader, Xlsx};

use crate::domain::error::AppError;
use crate::domain::health::{RawRow, SourceTable};

/// Read the first worksheet; its first row is the header row.
/// Rows with no content are skipped like blank CSV lines.
pub fn read_first_sheet(path: &Path) -> Result<SourceTable, AppError> {
    let mut workbook: Xlsx<_> = open_workbook(path).map_err(|e| {
        AppError::IoError(format!("Failed to open Excel file {}: {}", path.display(), e))
    })?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| AppError::ParseError("No worksheet found".to_string()))?
        .map_err(|e| AppError::ParseError(format!("Failed to read Excel range: {}", e)))?;

    let mut lines = range.rows().map(|row| {
        row.iter()
            .map(|cell| {
                cell.as_string()
                    .map(|s| s.trim().to_string())
                    .unwrap_or_else(|| format!("{}", cell))
            })
            .collect::<Vec<String>>()
    });

    let headers = match lines.next() {
        Some(headers) => headers,
        None => return Ok(SourceTable::default()),
    };

    let rows = lines
        .filter(|cells| cells.iter().any(|cell| !cell.is_empty()))
        .enumerate()
        .map(|(index, cells)| RawRow::from_cells(index, &headers, &cells))
        .collect();

    Ok(SourceTable { headers, rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> &'static Path {
        Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/testdata/records.xlsx"))
    }

    #[test]
    fn test_reads_first_worksheet() {
        let table = read_first_sheet(fixture()).unwrap();

        assert_eq!(table.headers, vec!["GA", "weight", "latitude", "longitude"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0].get("GA"), Some("38"));
        assert_eq!(table.rows[0].get("weight"), Some(""));
        assert_eq!(table.rows[0].get("latitude"), Some("13.7563"));
        assert_eq!(table.rows[1].index, 1);
        assert_eq!(table.rows[1].get("weight"), Some("2300"));
        assert_eq!(table.rows[1].get("longitude"), Some("102.1"));
    }

    #[test]
    fn test_missing_workbook_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_first_sheet(&dir.path().join("absent.xlsx")).unwrap_err();
        assert!(matches!(err, AppError::IoError(_)));
    }

    #[test]
    fn test_garbage_workbook_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.xlsx");
        std::fs::write(&path, b"not a zip archive").unwrap();
        assert!(read_first_sheet(&path).is_err());
    }
}
