use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::health::{Category, ClassifiedRecord, HealthRecord, LOW_BIRTH_WEIGHT_GRAMS};

/// Free-text status hints meaning "low birth weight"
static LOW_WEIGHT_HINT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)ต่ำ|\blow|\blbw\b").unwrap());

/// Classify a valid record. Rules are evaluated in order, first match wins:
/// 1. gestational age known, weight unknown -> Pregnant
/// 2. 0 < weight < 2500 g -> LowWeight
/// 3. weight >= 2500 g -> NormalWeight
/// 4. low-weight hint in the type column -> LowWeight, else Unknown
pub fn classify(record: &HealthRecord) -> Category {
    let weight = record.weight_grams;

    if record.gestational_weeks > 0.0 && weight == 0.0 {
        Category::Pregnant
    } else if weight > 0.0 && weight < LOW_BIRTH_WEIGHT_GRAMS {
        Category::LowWeight
    } else if weight >= LOW_BIRTH_WEIGHT_GRAMS {
        Category::NormalWeight
    } else if record
        .raw_type
        .value()
        .map(|hint| LOW_WEIGHT_HINT.is_match(hint))
        .unwrap_or(false)
    {
        Category::LowWeight
    } else {
        Category::Unknown
    }
}

/// Fresh classification pass over `records`
pub fn classify_all(records: Vec<HealthRecord>) -> Vec<ClassifiedRecord> {
    records
        .into_iter()
        .map(|record| {
            let category = classify(&record);
            ClassifiedRecord { record, category }
        })
        .collect()
}
