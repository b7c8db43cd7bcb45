// ============================================================
// RAW ROW TYPES
// ============================================================
// Untyped ingestion boundary: header -> cell text, as supplied

use serde::{Deserialize, Serialize};

/// A single cell together with the header it was found under
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawField {
    /// Header text as supplied by the source (any casing, any language)
    pub header: String,

    /// Cell text, empty when the source omitted the cell
    pub value: String,

    /// Whether the value is blank after trimming
    pub is_empty: bool,
}

impl RawField {
    pub fn new(header: String, value: String) -> Self {
        let is_empty = value.trim().is_empty();
        Self {
            header,
            value,
            is_empty,
        }
    }
}

/// One data row of the source, ordered like the header row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    /// Row index (0-based, header row excluded)
    pub index: usize,

    /// All fields in header order
    pub fields: Vec<RawField>,
}

impl RawRow {
    pub fn new(index: usize, fields: Vec<RawField>) -> Self {
        Self { index, fields }
    }

    /// Zip a header row with a row of cells. Missing trailing cells become
    /// empty values; cells beyond the header row are ignored.
    pub fn from_cells<S: AsRef<str>>(index: usize, headers: &[String], cells: &[S]) -> Self {
        let fields = headers
            .iter()
            .enumerate()
            .map(|(idx, header)| {
                let value = cells
                    .get(idx)
                    .map(|cell| cell.as_ref().to_string())
                    .unwrap_or_default();
                RawField::new(header.clone(), value)
            })
            .collect();

        Self::new(index, fields)
    }

    /// Value under the first header equal to `header`
    pub fn get(&self, header: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|field| field.header == header)
            .map(|field| field.value.as_str())
    }

    /// True when every cell is blank (e.g. a trailing empty line in an export)
    pub fn is_blank(&self) -> bool {
        self.fields.iter().all(|field| field.is_empty)
    }

    pub fn headers(&self) -> Vec<String> {
        self.fields.iter().map(|field| field.header.clone()).collect()
    }
}

/// A whole tabular payload: the header row plus every data row
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl SourceTable {
    /// Build from a header row and raw cell rows
    pub fn from_cells<S: AsRef<str>>(headers: Vec<String>, rows: Vec<Vec<S>>) -> Self {
        let rows = rows
            .iter()
            .enumerate()
            .map(|(idx, cells)| RawRow::from_cells(idx, &headers, cells))
            .collect();

        Self { headers, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
