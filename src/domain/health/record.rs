// ============================================================
// CANONICAL HEALTH RECORD
// ============================================================
// The single representation classification and rendering work on

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use validator::Validate;

/// Placeholder shown for text fields the source left blank ("not specified")
pub const NOT_SPECIFIED: &str = "ไม่ระบุ";

/// Clinical low-birth-weight cutoff. Weights strictly below are low.
pub const LOW_BIRTH_WEIGHT_GRAMS: f64 = 2500.0;

/// Display text that remembers whether the source actually supplied it.
///
/// Blank cells are `None` and render as [`NOT_SPECIFIED`]; only the
/// underlying value is ever used for classification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Text(Option<String>);

impl Text {
    /// Trim `raw`; blank input becomes an unspecified value
    pub fn new(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            Self(None)
        } else {
            Self(Some(trimmed.to_string()))
        }
    }

    pub fn unspecified() -> Self {
        Self(None)
    }

    pub fn value(&self) -> Option<&str> {
        self.0.as_deref()
    }

    pub fn display(&self) -> &str {
        self.0.as_deref().unwrap_or(NOT_SPECIFIED)
    }

    pub fn is_specified(&self) -> bool {
        self.0.is_some()
    }

    /// First specified value of `self` and `other`
    pub fn or(self, other: Text) -> Text {
        if self.is_specified() {
            self
        } else {
            other
        }
    }
}

impl Serialize for Text {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.display())
    }
}

impl<'de> Deserialize<'de> for Text {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        if raw.trim() == NOT_SPECIFIED {
            Ok(Text::unspecified())
        } else {
            Ok(Text::new(&raw))
        }
    }
}

/// Mutually exclusive classification of a valid record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    Pregnant,
    LowWeight,
    NormalWeight,
    Unknown,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Pregnant,
        Category::LowWeight,
        Category::NormalWeight,
        Category::Unknown,
    ];

    /// Marker fill colour; `None` for categories that are never drawn
    pub fn color(&self) -> Option<&'static str> {
        match self {
            Category::Pregnant => Some("#3b82f6"),
            Category::LowWeight => Some("#f97316"),
            Category::NormalWeight => Some("#22c55e"),
            Category::Unknown => None,
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Category::Pregnant => "🤰",
            Category::LowWeight => "🍼",
            Category::NormalWeight => "✅",
            Category::Unknown => "❔",
        }
    }

    /// Thai label used in popups and legends
    pub fn label(&self) -> &'static str {
        match self {
            Category::Pregnant => "หญิงตั้งครรภ์",
            Category::LowWeight => "น้ำหนักต่ำกว่าเกณฑ์",
            Category::NormalWeight => "น้ำหนักปกติ",
            Category::Unknown => "ไม่ทราบประเภท",
        }
    }

    pub fn is_rendered(&self) -> bool {
        self.color().is_some()
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Pregnant => write!(f, "pregnant"),
            Category::LowWeight => write!(f, "lowWeight"),
            Category::NormalWeight => write!(f, "normalWeight"),
            Category::Unknown => write!(f, "unknown"),
        }
    }
}

/// Canonical, validated record. Coordinates are always present and in range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub mother_name: Text,
    pub father_name: Text,
    pub baby_name: Text,
    pub address: Text,
    /// Grams, 0 = unknown
    pub weight_grams: f64,
    /// Weeks, 0 = unknown
    pub gestational_weeks: f64,
    pub latitude: f64,
    pub longitude: f64,
    /// Free-text type/status hint
    pub raw_type: Text,
    #[serde(default)]
    pub birth_date: Text,
    #[serde(default)]
    pub expected_date: Text,
}

impl HealthRecord {
    pub fn coordinates_in_range(latitude: f64, longitude: f64) -> bool {
        latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude)
    }

    /// Canonical-field-named payload for the write endpoint
    pub fn to_draft(&self) -> RecordDraft {
        let known = |value: f64| if value > 0.0 { Some(value) } else { None };

        RecordDraft {
            child_name: self.baby_name.value().map(str::to_string),
            mother_name: self.mother_name.value().map(str::to_string),
            father_name: self.father_name.value().map(str::to_string),
            weight: known(self.weight_grams),
            ga: known(self.gestational_weeks),
            latitude: Some(self.latitude),
            longitude: Some(self.longitude),
            address: self.address.value().map(str::to_string),
            record_type: self.raw_type.value().map(str::to_string),
            birth_date: self.birth_date.value().map(str::to_string),
            expected_date: self.expected_date.value().map(str::to_string),
        }
    }
}

/// Output of one classification pass; never mutated afterwards
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedRecord {
    pub record: HealthRecord,
    pub category: Category,
}

/// Payload accepted by the write endpoint, named like the sheet columns
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct RecordDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mother_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub father_name: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    #[validate(range(min = 0.0, max = 10000.0))]
    pub weight: Option<f64>,

    #[serde(
        rename = "GA",
        default,
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    #[validate(range(min = 0.0, max = 45.0))]
    pub ga: Option<f64>,

    #[serde(default, deserialize_with = "lenient_number")]
    #[validate(required, range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,

    #[serde(default, deserialize_with = "lenient_number")]
    #[validate(required, range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub record_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_date: Option<String>,
}

/// Form posts send numbers as strings; blank means absent
fn lenient_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText {
        Number(f64),
        Text(String),
    }

    match Option::<NumberOrText>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrText::Number(value)) => Ok(Some(value)),
        Some(NumberOrText::Text(text)) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            trimmed
                .parse::<f64>()
                .map(Some)
                .map_err(|_| serde::de::Error::custom(format!("not a number: {}", trimmed)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_placeholder() {
        let blank = Text::new("   ");
        assert!(!blank.is_specified());
        assert_eq!(blank.display(), NOT_SPECIFIED);
        assert_eq!(blank.value(), None);

        let name = Text::new("  นางสมศรี ใจดี ");
        assert_eq!(name.value(), Some("นางสมศรี ใจดี"));
    }

    #[test]
    fn test_text_serializes_as_display() {
        let json = serde_json::to_string(&Text::unspecified()).unwrap();
        assert_eq!(json, format!("\"{}\"", NOT_SPECIFIED));

        let back: Text = serde_json::from_str(&json).unwrap();
        assert!(!back.is_specified());
    }

    #[test]
    fn test_only_unknown_is_not_rendered() {
        let rendered: Vec<_> = Category::ALL.iter().filter(|c| c.is_rendered()).collect();
        assert_eq!(rendered.len(), 3);
        assert!(!Category::Unknown.is_rendered());
    }

    #[test]
    fn test_coordinate_range() {
        assert!(HealthRecord::coordinates_in_range(90.0, -180.0));
        assert!(!HealthRecord::coordinates_in_range(999.0, 98.99));
        assert!(!HealthRecord::coordinates_in_range(f64::NAN, 100.0));
    }

    #[test]
    fn test_draft_accepts_string_numbers() {
        let draft: RecordDraft = serde_json::from_str(
            r#"{"mother_name":"ทดสอบ","GA":"38","weight":"","latitude":"13.7563","longitude":100.5018}"#,
        )
        .unwrap();

        assert_eq!(draft.ga, Some(38.0));
        assert_eq!(draft.weight, None);
        assert_eq!(draft.latitude, Some(13.7563));
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn test_draft_requires_coordinates() {
        let draft = RecordDraft {
            latitude: Some(13.0),
            ..Default::default()
        };
        assert!(draft.validate().is_err());

        let out_of_range = RecordDraft {
            latitude: Some(999.0),
            longitude: Some(98.99),
            ..Default::default()
        };
        assert!(out_of_range.validate().is_err());
    }
}
