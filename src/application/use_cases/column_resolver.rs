//! Column resolution for loosely named sheets
//!
//! Maps arbitrary, bilingual header text onto [`SemanticField`]s using the
//! alias table. Two entry points:
//! - [`resolve`]: pure per-field lookup, first alias then first header wins
//! - [`ColumnMap::build`]: resolves every field once per dataset, walking
//!   [`SemanticField::PRECEDENCE`] so a header claimed by a specific field
//!   (e.g. `mother_name`) is not handed to a generic one (`name`)

use std::collections::{HashMap, HashSet};

use crate::domain::health::{RawRow, SemanticField, ALIAS_TABLE_VERSION};

fn normalize_header(header: &str) -> String {
    header.trim().to_lowercase()
}

/// Index of the first header matching `field`'s aliases, skipping indices
/// in `claimed`. Aliases are tried in declaration order; for each alias the
/// headers are scanned left to right.
fn resolve_index(headers: &[String], field: SemanticField, claimed: &HashSet<usize>) -> Option<usize> {
    let normalized: Vec<String> = headers.iter().map(|h| normalize_header(h)).collect();

    for alias in field.aliases() {
        let hit = normalized
            .iter()
            .enumerate()
            .filter(|(idx, _)| !claimed.contains(idx))
            .find(|(_, header)| alias.is_match(header));

        if let Some((idx, _)) = hit {
            return Some(idx);
        }
    }

    None
}

/// Best matching header for `field`, or `None` when no alias matches.
/// Deterministic and side-effect free.
pub fn resolve(headers: &[String], field: SemanticField) -> Option<&str> {
    resolve_index(headers, field, &HashSet::new()).map(|idx| headers[idx].as_str())
}

/// Resolved header positions for one dataset
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMap {
    headers: Vec<String>,
    columns: HashMap<SemanticField, usize>,
}

impl ColumnMap {
    pub fn build(headers: &[String]) -> Self {
        let mut claimed = HashSet::new();
        let mut columns = HashMap::new();

        for field in SemanticField::PRECEDENCE {
            if let Some(idx) = resolve_index(headers, field, &claimed) {
                claimed.insert(idx);
                columns.insert(field, idx);
            }
        }

        tracing::debug!(
            alias_version = ALIAS_TABLE_VERSION,
            resolved = columns.len(),
            headers = headers.len(),
            "Built column map"
        );

        Self {
            headers: headers.to_vec(),
            columns,
        }
    }

    /// Header text assigned to `field`
    pub fn header(&self, field: SemanticField) -> Option<&str> {
        self.columns
            .get(&field)
            .map(|idx| self.headers[*idx].as_str())
    }

    /// Cell of `row` under the column assigned to `field`. Rows shorter than
    /// the header row read as missing.
    pub fn value<'r>(&self, row: &'r RawRow, field: SemanticField) -> Option<&'r str> {
        let idx = *self.columns.get(&field)?;
        row.fields.get(idx).map(|f| f.value.as_str())
    }

    /// Required fields that resolved to no column
    pub fn missing_required(&self) -> Vec<SemanticField> {
        SemanticField::ALL
            .iter()
            .copied()
            .filter(|field| field.is_required() && !self.columns.contains_key(field))
            .collect()
    }
}
