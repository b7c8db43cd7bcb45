//! One reconciliation cycle: fetch, normalize, classify, reconcile, count.
//!
//! Cycles never interleave. The reconciler and its surface sit behind a
//! `tokio::sync::Mutex`. `run_cycle` takes it with `try_lock`, so a request
//! arriving while a cycle is running is skipped and answered with the last
//! completed report. `refresh` waits its turn instead.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, MutexGuard, RwLock};
use tracing::{debug, info, warn};

use super::classifier::classify_all;
use super::marker_reconciler::{MarkerReconciler, SnapshotSurface};
use super::record_normalizer::{normalize_table, DroppedRow};
use super::stats_aggregator::aggregate;
use crate::domain::error::Result;
use crate::domain::health::{
    ClassifiedRecord, Marker, PipelineConfig, Stats, Viewport, ALIAS_TABLE_VERSION,
};
use crate::infrastructure::sources::RecordSource;

/// Why a completed cycle rendered nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EmptyReason {
    /// The source returned no data rows
    #[serde(rename = "no data")]
    NoData,
    /// Rows were present but none had usable coordinates
    #[serde(rename = "no valid coordinates")]
    NoValidCoordinates,
    /// Records were placed but every one classified as unknown
    #[serde(rename = "no renderable records")]
    NothingRenderable,
}

impl std::fmt::Display for EmptyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmptyReason::NoData => write!(f, "no data"),
            EmptyReason::NoValidCoordinates => write!(f, "no valid coordinates"),
            EmptyReason::NothingRenderable => write!(f, "no renderable records"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DroppedRowSummary {
    pub index: usize,
    pub reason: String,
}

impl From<&DroppedRow> for DroppedRowSummary {
    fn from(dropped: &DroppedRow) -> Self {
        Self {
            index: dropped.index,
            reason: dropped.reason.to_string(),
        }
    }
}

/// Everything one completed cycle produced
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleReport {
    pub records: Vec<ClassifiedRecord>,
    pub markers: Vec<Marker>,
    pub viewport: Option<Viewport>,
    pub stats: Stats,
    pub dropped_rows: Vec<DroppedRowSummary>,
    /// Data rows the source returned, blank ones included
    pub source_rows: usize,
    pub alias_version: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_reason: Option<EmptyReason>,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub enum CycleOutcome {
    Completed(Arc<CycleReport>),
    /// Another cycle held the guard; carries the last completed report
    Skipped(Option<Arc<CycleReport>>),
}

impl CycleOutcome {
    pub fn report(&self) -> Option<Arc<CycleReport>> {
        match self {
            CycleOutcome::Completed(report) => Some(report.clone()),
            CycleOutcome::Skipped(report) => report.clone(),
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, CycleOutcome::Skipped(_))
    }
}

struct RenderState {
    reconciler: MarkerReconciler,
    surface: SnapshotSurface,
}

pub struct HealthPipeline {
    source: Arc<dyn RecordSource + Send + Sync>,
    config: PipelineConfig,
    render: Mutex<RenderState>,
    latest: RwLock<Option<Arc<CycleReport>>>,
}

impl HealthPipeline {
    pub fn new(source: Arc<dyn RecordSource + Send + Sync>, config: PipelineConfig) -> Self {
        let reconciler = MarkerReconciler::new(config.viewport_padding);
        Self {
            source,
            config,
            render: Mutex::new(RenderState {
                reconciler,
                surface: SnapshotSurface::new(),
            }),
            latest: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Last completed report, if any cycle has finished yet
    pub async fn latest(&self) -> Option<Arc<CycleReport>> {
        self.latest.read().await.clone()
    }

    /// Run a cycle unless one is already in flight.
    ///
    /// A source failure aborts before any marker is touched, so the surface
    /// keeps showing the previous cycle.
    pub async fn run_cycle(&self) -> Result<CycleOutcome> {
        let Ok(guard) = self.render.try_lock() else {
            debug!("Cycle already running, skipping");
            return Ok(CycleOutcome::Skipped(self.latest().await));
        };

        self.cycle_with(guard).await.map(CycleOutcome::Completed)
    }

    /// Run a cycle after any in-flight one, so data changed before the call
    /// is always picked up
    pub async fn refresh(&self) -> Result<Arc<CycleReport>> {
        let guard = self.render.lock().await;
        self.cycle_with(guard).await
    }

    async fn cycle_with(&self, mut guard: MutexGuard<'_, RenderState>) -> Result<Arc<CycleReport>> {
        let table = match self.source.fetch().await {
            Ok(table) => table,
            Err(e) => {
                warn!(error = %e, "Source fetch failed, keeping previous markers");
                return Err(e);
            }
        };

        let batch = normalize_table(&table);
        let placed = batch.records.len();
        let classified = classify_all(batch.records);

        let state = &mut *guard;
        let reconciliation = state.reconciler.apply(&mut state.surface, &classified);
        let stats = aggregate(&classified);

        let empty_reason = if !reconciliation.markers.is_empty() {
            None
        } else if batch.non_blank_rows == 0 {
            Some(EmptyReason::NoData)
        } else if placed == 0 {
            Some(EmptyReason::NoValidCoordinates)
        } else {
            Some(EmptyReason::NothingRenderable)
        };

        let report = Arc::new(CycleReport {
            markers: state.surface.markers().to_vec(),
            viewport: state.surface.viewport(),
            records: classified,
            stats,
            dropped_rows: batch.dropped.iter().map(DroppedRowSummary::from).collect(),
            source_rows: table.len(),
            alias_version: ALIAS_TABLE_VERSION,
            empty_reason,
            completed_at: Utc::now(),
        });

        info!(
            rows = report.source_rows,
            markers = report.markers.len(),
            removed = reconciliation.removed,
            dropped = report.dropped_rows.len(),
            total = report.stats.total,
            "Reconciliation cycle completed"
        );
        if let Some(reason) = empty_reason {
            info!(reason = %reason, "Nothing to render");
        }

        *self.latest.write().await = Some(report.clone());
        drop(guard);

        Ok(report)
    }

    /// Latest report, running a first cycle when none exists. A skipped
    /// cycle with no report to fall back on waits for the running one.
    pub async fn latest_or_run(&self) -> Result<Arc<CycleReport>> {
        if let Some(report) = self.latest().await {
            return Ok(report);
        }

        if let Some(report) = self.run_cycle().await?.report() {
            return Ok(report);
        }

        self.wait_for_latest().await
    }

    /// Block until the in-flight cycle releases the guard, then return its
    /// report, or run a cycle if it failed
    pub async fn wait_for_latest(&self) -> Result<Arc<CycleReport>> {
        drop(self.render.lock().await);

        match self.latest().await {
            Some(report) => Ok(report),
            None => match self.run_cycle().await? {
                CycleOutcome::Completed(report) => Ok(report),
                CycleOutcome::Skipped(Some(report)) => Ok(report),
                CycleOutcome::Skipped(None) => Err(crate::domain::error::AppError::Internal(
                    "no completed cycle available".to_string(),
                )),
            },
        }
    }
}
