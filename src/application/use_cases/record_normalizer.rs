//! Record normalization
//!
//! Turns an untyped [`RawRow`] into a canonical [`HealthRecord`]. All type
//! coercion and defaulting lives here:
//! - numeric cells use their leading decimal number (`"38 สัปดาห์"` -> 38)
//! - unparseable weight / gestational age default to 0 (unknown)
//! - missing or out-of-range coordinates make the row invalid
//! - blank text becomes an unspecified [`Text`]

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use super::column_resolver::ColumnMap;
use crate::domain::error::{AppError, Result};
use crate::domain::health::{HealthRecord, RawRow, SemanticField, SourceTable, Text};

static LEADING_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?").unwrap());

/// Longest decimal prefix of `raw` after trimming, with thousands
/// separators removed. `None` when there is no finite leading number.
pub fn parse_leading_number(raw: &str) -> Option<f64> {
    let cleaned = raw.trim().replace(',', "");
    let matched = LEADING_NUMBER.find(&cleaned)?;
    matched
        .as_str()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

/// A row that did not make it into the dataset
#[derive(Debug, Clone, PartialEq)]
pub struct DroppedRow {
    pub index: usize,
    pub reason: AppError,
}

/// Normalization result for a whole table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedBatch {
    pub records: Vec<HealthRecord>,
    pub dropped: Vec<DroppedRow>,
    /// Rows that carried at least one non-blank cell
    pub non_blank_rows: usize,
}

/// Normalizer bound to one dataset's header row
pub struct RecordNormalizer {
    columns: ColumnMap,
}

impl RecordNormalizer {
    pub fn new(headers: &[String]) -> Self {
        Self {
            columns: ColumnMap::build(headers),
        }
    }

    pub fn columns(&self) -> &ColumnMap {
        &self.columns
    }

    fn text(&self, row: &RawRow, field: SemanticField) -> Text {
        self.columns
            .value(row, field)
            .map(Text::new)
            .unwrap_or_default()
    }

    /// Weight / gestational age: unknown, negative or garbage reads as 0
    fn measurement(&self, row: &RawRow, field: SemanticField) -> f64 {
        self.columns
            .value(row, field)
            .and_then(parse_leading_number)
            .filter(|value| *value > 0.0)
            .unwrap_or(0.0)
    }

    fn coordinate(&self, row: &RawRow, field: SemanticField) -> Result<f64> {
        if self.columns.header(field).is_none() {
            return Err(AppError::NoMatchingColumn(field.to_string()));
        }
        self.columns
            .value(row, field)
            .and_then(parse_leading_number)
            .ok_or_else(|| AppError::InvalidRow(format!("row {}: missing {}", row.index, field)))
    }

    /// Canonical record for `row`, or a row-level error
    /// ([`AppError::InvalidRow`] / [`AppError::NoMatchingColumn`])
    pub fn normalize(&self, row: &RawRow) -> Result<HealthRecord> {
        if row.is_blank() {
            return Err(AppError::InvalidRow(format!("row {}: blank", row.index)));
        }

        let latitude = self.coordinate(row, SemanticField::Latitude)?;
        let longitude = self.coordinate(row, SemanticField::Longitude)?;

        if !HealthRecord::coordinates_in_range(latitude, longitude) {
            return Err(AppError::InvalidRow(format!(
                "row {}: coordinates out of range ({}, {})",
                row.index, latitude, longitude
            )));
        }

        let id = self
            .columns
            .value(row, SemanticField::Id)
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string);

        // Pregnancy sheets name the woman in a bare "name" column.
        let mother_name = self
            .text(row, SemanticField::MotherName)
            .or(self.text(row, SemanticField::Name));

        Ok(HealthRecord {
            id,
            mother_name,
            father_name: self.text(row, SemanticField::FatherName),
            baby_name: self.text(row, SemanticField::BabyName),
            address: self.text(row, SemanticField::Address),
            weight_grams: self.measurement(row, SemanticField::Weight),
            gestational_weeks: self.measurement(row, SemanticField::GestationalAge),
            latitude,
            longitude,
            raw_type: self.text(row, SemanticField::Type),
            birth_date: self.text(row, SemanticField::BirthDate),
            expected_date: self.text(row, SemanticField::ExpectedDate),
        })
    }

    /// Normalize every row, dropping invalid ones
    pub fn normalize_rows(&self, rows: &[RawRow]) -> NormalizedBatch {
        let mut batch = NormalizedBatch::default();

        for row in rows {
            if !row.is_blank() {
                batch.non_blank_rows += 1;
            }

            match self.normalize(row) {
                Ok(record) => batch.records.push(record),
                Err(reason) => {
                    debug!(row = row.index, reason = %reason, "Dropped row");
                    batch.dropped.push(DroppedRow {
                        index: row.index,
                        reason,
                    });
                }
            }
        }

        batch
    }
}

/// One-shot normalization of a single row against `headers`
pub fn normalize(row: &RawRow, headers: &[String]) -> Result<HealthRecord> {
    RecordNormalizer::new(headers).normalize(row)
}

/// Normalize a whole table with one shared column map
pub fn normalize_table(table: &SourceTable) -> NormalizedBatch {
    RecordNormalizer::new(&table.headers).normalize_rows(&table.rows)
}
