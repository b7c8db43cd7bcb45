// ============================================================
// CSV PARSER
// ============================================================
// Parse sheet exports into a SourceTable with encoding detection

use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use encoding_rs::{Encoding, UTF_8, WINDOWS_874};

use crate::domain::error::AppError;
use crate::domain::health::{RawRow, SourceTable};

/// CSV parser with encoding detection
pub struct CsvParser {
    /// Delimiter character (default: comma)
    delimiter: u8,

    /// Whether to trim whitespace from values
    trim: bool,
}

impl Default for CsvParser {
    fn default() -> Self {
        Self {
            delimiter: b',',
            trim: true,
        }
    }
}

impl CsvParser {
    /// Create a new CSV parser with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a CSV file
    pub fn parse_file(&self, path: &Path) -> Result<SourceTable, AppError> {
        let bytes = std::fs::read(path).map_err(|e| {
            AppError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        self.parse_bytes(&bytes)
    }

    /// Parse raw bytes, decoding them first
    pub fn parse_bytes(&self, bytes: &[u8]) -> Result<SourceTable, AppError> {
        let content = decode(bytes);
        self.parse_content(&content)
    }

    /// Parse CSV content from string. The first record is the header row;
    /// rows of any length are kept and blank lines are skipped.
    pub fn parse_content(&self, content: &str) -> Result<SourceTable, AppError> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .trim(if self.trim { Trim::All } else { Trim::None })
            .flexible(true)
            .from_reader(content.as_bytes());

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| AppError::ParseError(format!("Failed to read CSV headers: {}", e)))?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_string())
            .collect();

        let mut rows = Vec::new();

        for (index, result) in reader.records().enumerate() {
            let record = result.map_err(|e| {
                AppError::ParseError(format!("Failed to parse CSV row {}: {}", index + 1, e))
            })?;

            rows.push(self.parse_row(rows.len(), &headers, &record));
        }

        Ok(SourceTable { headers, rows })
    }

    /// Pair a record's cells with the header row. Short records read as
    /// empty trailing cells, extra cells are dropped.
    fn parse_row(&self, index: usize, headers: &[String], record: &StringRecord) -> RawRow {
        let cells: Vec<&str> = record.iter().collect();
        RawRow::from_cells(index, headers, &cells)
    }
}

/// Decode bytes honouring a BOM; otherwise UTF-8, falling back to Thai
/// Windows-874 for legacy exports
pub fn decode(bytes: &[u8]) -> String {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        let (content, _) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
        return content.into_owned();
    }

    let (content, had_errors) = UTF_8.decode_without_bom_handling(bytes);
    if !had_errors {
        return content.into_owned();
    }

    let (content, _, _) = WINDOWS_874.decode(bytes);
    content.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_simple_csv() {
        let content = "GA,weight,latitude,longitude\n38,,13.7563,100.5018\n,3200,18.79,98.99";
        let table = CsvParser::new().parse_content(content).unwrap();

        assert_eq!(table.headers, vec!["GA", "weight", "latitude", "longitude"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0].get("GA"), Some("38"));
        assert_eq!(table.rows[1].get("weight"), Some("3200"));
    }

    #[test]
    fn test_short_and_long_rows_are_tolerated() {
        let content = "weight,latitude,longitude\n3200,14.0\n3200,14.0,100.0,extra";
        let table = CsvParser::new().parse_content(content).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0].get("longitude"), Some(""));
        assert_eq!(table.rows[1].fields.len(), 3);
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let content = "weight,latitude,longitude\n\n3200,14.0,100.0\n\n";
        let table = CsvParser::new().parse_content(content).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows[0].index, 0);
    }

    #[test]
    fn test_quoted_fields() {
        let content = "ชื่อ,ที่อยู่,ละติจูด,ลองจิจูด\nนางสมศรี,\"12/3 หมู่ 4, ต.บางรัก\",13.72,100.52";
        let table = CsvParser::new().parse_content(content).unwrap();
        assert_eq!(table.rows[0].get("ที่อยู่"), Some("12/3 หมู่ 4, ต.บางรัก"));
    }

    #[test]
    fn test_decode_strips_bom() {
        let bytes = b"\xEF\xBB\xBFweight,latitude\n1,2".to_vec();
        let table = CsvParser::new().parse_bytes(&bytes).unwrap();
        assert_eq!(table.headers[0], "weight");
    }

    #[test]
    fn test_decode_windows_874_fallback() {
        // "ชื่อ" in TIS-620 / Windows-874
        let bytes = [0xAA, 0xD7, 0xE8, 0xCD];
        assert_eq!(decode(&bytes), "ชื่อ");
    }

    #[test]
    fn test_parse_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "weight,latitude,longitude").unwrap();
        writeln!(file, "2300,14.98,102.10").unwrap();

        let table = CsvParser::new().parse_file(file.path()).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows[0].get("latitude"), Some("14.98"));
    }
}
