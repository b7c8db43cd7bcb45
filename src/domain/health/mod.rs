// ============================================================
// HEALTH RECORD DOMAIN LAYER
// ============================================================
// Canonical records, categories, markers and statistics
// No I/O, no async

mod marker;
mod pipeline_config;
mod raw_row;
mod record;
mod semantic_field;

pub use marker::{LatLng, Marker, MarkerSet, Stats, Viewport};
pub use pipeline_config::PipelineConfig;
pub use raw_row::{RawField, RawRow, SourceTable};
pub use record::{
    Category, ClassifiedRecord, HealthRecord, RecordDraft, Text, LOW_BIRTH_WEIGHT_GRAMS,
    NOT_SPECIFIED,
};
pub use semantic_field::{SemanticField, ALIAS_TABLE_VERSION};
