pub mod use_cases;

pub use use_cases::classifier::{classify, classify_all};
pub use use_cases::column_resolver::{resolve, ColumnMap};
pub use use_cases::health_pipeline::{CycleOutcome, CycleReport, EmptyReason, HealthPipeline};
pub use use_cases::marker_reconciler::{
    reconcile, MarkerReconciler, MarkerSurface, Reconciliation, SnapshotSurface,
};
pub use use_cases::record_normalizer::{normalize, normalize_table, RecordNormalizer};
pub use use_cases::stats_aggregator::aggregate;
