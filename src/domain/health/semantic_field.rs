// ============================================================
// SEMANTIC FIELDS AND ALIAS TABLE
// ============================================================
// Bilingual (English/Thai) header aliases for every field the
// pipeline understands

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Bumped whenever an alias list below changes.
pub const ALIAS_TABLE_VERSION: u32 = 1;

/// A field the pipeline knows how to read from a loosely named sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticField {
    Name,
    BabyName,
    FatherName,
    MotherName,
    Address,
    Weight,
    GestationalAge,
    Latitude,
    Longitude,
    Type,
    Id,
    BirthDate,
    ExpectedDate,
}

static ALIAS_TABLE: Lazy<HashMap<SemanticField, Vec<Regex>>> = Lazy::new(|| {
    SemanticField::ALL
        .iter()
        .map(|field| {
            let patterns = field
                .alias_patterns()
                .iter()
                .map(|pattern| Regex::new(&format!("(?i){}", pattern)).unwrap())
                .collect();
            (*field, patterns)
        })
        .collect()
});

impl SemanticField {
    /// Declaration order.
    pub const ALL: [SemanticField; 13] = [
        SemanticField::Name,
        SemanticField::BabyName,
        SemanticField::FatherName,
        SemanticField::MotherName,
        SemanticField::Address,
        SemanticField::Weight,
        SemanticField::GestationalAge,
        SemanticField::Latitude,
        SemanticField::Longitude,
        SemanticField::Type,
        SemanticField::Id,
        SemanticField::BirthDate,
        SemanticField::ExpectedDate,
    ];

    /// Order in which fields claim headers when a whole column map is built.
    /// Specific fields go first so that e.g. `mother_name` is not taken by
    /// the generic `Name` field.
    pub const PRECEDENCE: [SemanticField; 13] = [
        SemanticField::Id,
        SemanticField::BabyName,
        SemanticField::FatherName,
        SemanticField::MotherName,
        SemanticField::GestationalAge,
        SemanticField::Latitude,
        SemanticField::Longitude,
        SemanticField::Weight,
        SemanticField::BirthDate,
        SemanticField::ExpectedDate,
        SemanticField::Address,
        SemanticField::Type,
        SemanticField::Name,
    ];

    /// Alias patterns in match priority order. Matched against the
    /// lower-cased, trimmed header.
    pub fn alias_patterns(&self) -> &'static [&'static str] {
        match self {
            SemanticField::Name => &["ชื่อ", "name"],
            SemanticField::BabyName => &[
                "baby_?name",
                "child_?name",
                "ชื่อเด็ก",
                "ชื่อทารก",
                "^(baby|child|newborn)$",
            ],
            SemanticField::FatherName => &["father", "ชื่อพ่อ", "พ่อ", "dad", "husband", "สามี"],
            SemanticField::MotherName => &["mother", "ชื่อแม่", "แม่", "mom"],
            SemanticField::Address => &["ที่อยู่", "address", "addr"],
            SemanticField::Weight => &[
                "น้ำหนัก",
                "weight",
                "(^|[^a-z])(wt|bw)([^a-z]|$)",
            ],
            SemanticField::GestationalAge => &[
                "^ga$",
                "อายุครรภ์",
                "gestation",
                "pregnan",
                "(^|[^a-z])ga([^a-z]|$)",
                "weeks",
            ],
            SemanticField::Latitude => &["latitude", "ละติจูด", "(^|[^a-z])lat([^a-z]|$)"],
            SemanticField::Longitude => &[
                "longitude",
                "ลองจิจูด",
                "(^|[^a-z])(lng|lon|long)([^a-z]|$)",
            ],
            SemanticField::Type => &["ประเภท", "type", "สถานะ", "status", "category"],
            SemanticField::Id => &["^id$", "^record_?id$", "^รหัส$"],
            SemanticField::BirthDate => &["birth_?date", "date_?of_?birth", "^dob$", "วันเกิด"],
            SemanticField::ExpectedDate => &[
                "expected_?date",
                "due_?date",
                "^edc$",
                "กำหนดคลอด",
            ],
        }
    }

    /// Compiled alias patterns, case-insensitive.
    pub fn aliases(&self) -> &'static [Regex] {
        ALIAS_TABLE
            .get(self)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Header name the write endpoint and sheet template use for this field.
    pub fn primary_alias(&self) -> &'static str {
        match self {
            SemanticField::Name => "name",
            SemanticField::BabyName => "child_name",
            SemanticField::FatherName => "father_name",
            SemanticField::MotherName => "mother_name",
            SemanticField::Address => "address",
            SemanticField::Weight => "weight",
            SemanticField::GestationalAge => "GA",
            SemanticField::Latitude => "latitude",
            SemanticField::Longitude => "longitude",
            SemanticField::Type => "type",
            SemanticField::Id => "id",
            SemanticField::BirthDate => "birth_date",
            SemanticField::ExpectedDate => "expected_date",
        }
    }

    /// Without these a row cannot be placed on the map.
    pub fn is_required(&self) -> bool {
        matches!(self, SemanticField::Latitude | SemanticField::Longitude)
    }
}

impl std::fmt::Display for SemanticField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.primary_alias())
    }
}
