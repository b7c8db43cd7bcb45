// ============================================================
// PIPELINE CONFIGURATION
// ============================================================
// Tunables for the reconciliation cycle

use serde::{Deserialize, Serialize};

/// Configuration for the ingest -> classify -> reconcile cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Fraction of the marker span added on every side of the viewport (default: 0.1)
    pub viewport_padding: f64,

    /// Seconds between background refresh cycles, 0 disables (default: 0)
    pub refresh_interval_secs: u64,

    /// Entries kept in the in-memory log ring (default: 100)
    pub max_log_entries: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            viewport_padding: 0.1,
            refresh_interval_secs: 0,
            max_log_entries: 100,
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.viewport_padding) {
            return Err("viewport_padding must be between 0.0 and 1.0".to_string());
        }
        if self.max_log_entries == 0 {
            return Err("max_log_entries must be > 0".to_string());
        }
        Ok(())
    }
}
