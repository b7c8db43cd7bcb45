use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AppError {
    /// A row failed normalization. Never surfaced to users; the row is dropped.
    InvalidRow(String),
    /// A required semantic field (latitude/longitude) has no matching column.
    NoMatchingColumn(String),
    /// The external tabular source could not be fetched.
    SourceUnavailable(String),
    /// The write endpoint answered with `success: false`.
    WriteRejected(String),
    ParseError(String),
    ValidationError(String),
    ConfigError(String),
    NotFound(String),
    IoError(String),
    Internal(String),
}

impl AppError {
    /// Row-level failures are expected in a loosely curated feed and only
    /// ever reduce the dataset.
    pub fn is_row_level(&self) -> bool {
        matches!(self, AppError::InvalidRow(_) | AppError::NoMatchingColumn(_))
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::InvalidRow(msg) => write!(f, "Invalid row: {}", msg),
            AppError::NoMatchingColumn(msg) => write!(f, "No matching column: {}", msg),
            AppError::SourceUnavailable(msg) => write!(f, "Data source unavailable: {}", msg),
            AppError::WriteRejected(msg) => write!(f, "Write rejected: {}", msg),
            AppError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppError::ConfigError(msg) => write!(f, "Config error: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::IoError(msg) => write!(f, "IO error: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(err.to_string())
    }
}

impl From<figment::Error> for AppError {
    fn from(err: figment::Error) -> Self {
        AppError::ConfigError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_level_errors() {
        assert!(AppError::InvalidRow("blank".into()).is_row_level());
        assert!(AppError::NoMatchingColumn("latitude".into()).is_row_level());
        assert!(!AppError::SourceUnavailable("timeout".into()).is_row_level());
    }

    #[test]
    fn test_display_prefixes() {
        let err = AppError::SourceUnavailable("HTTP 503".into());
        assert_eq!(err.to_string(), "Data source unavailable: HTTP 503");
    }
}
