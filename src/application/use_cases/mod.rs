pub mod classifier;
pub mod column_resolver;
pub mod health_pipeline;
pub mod marker_reconciler;
pub mod record_normalizer;
pub mod stats_aggregator;
