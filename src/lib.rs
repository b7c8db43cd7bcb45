pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;

mod app;

pub use app::run;
pub use application::{aggregate, classify, normalize, reconcile, resolve, HealthPipeline};
pub use domain::error::{AppError, Result};
pub use domain::health::{
    Category, ClassifiedRecord, HealthRecord, Marker, MarkerSet, RawRow, SemanticField, Stats,
};
