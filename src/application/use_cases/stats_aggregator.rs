use crate::domain::health::{Category, ClassifiedRecord, Stats};

/// Count records per category. `total` is the sum of the three displayed
/// categories, so it always equals the number of markers drawn.
pub fn aggregate(classified: &[ClassifiedRecord]) -> Stats {
    let mut stats = Stats::default();

    for item in classified {
        match item.category {
            Category::Pregnant => stats.pregnant += 1,
            Category::LowWeight => stats.low_weight += 1,
            Category::NormalWeight => stats.normal_weight += 1,
            Category::Unknown => stats.unknown += 1,
        }
    }

    stats.total = stats.pregnant + stats.low_weight + stats.normal_weight;
    stats
}
