// ============================================================
// APPLICATION CONFIGURATION
// ============================================================
// Layered: defaults -> mch.toml -> MCH_* environment variables

use std::path::PathBuf;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::domain::error::{AppError, Result};
use crate::domain::health::PipelineConfig;

pub const DEFAULT_CONFIG_FILE: &str = "mch.toml";
pub const CONFIG_PATH_VAR: &str = "MCH_CONFIG";
pub const ENV_PREFIX: &str = "MCH_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    GoogleSheet,
    File,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub kind: SourceKind,
    /// Spreadsheet id of a link-shared Google Sheet
    pub sheet_id: Option<String>,
    /// Worksheet gid, first sheet when absent
    pub gid: Option<String>,
    /// Local .csv or .xlsx file
    pub path: Option<PathBuf>,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::GoogleSheet,
            sheet_id: None,
            gid: None,
            path: None,
            timeout_secs: 30,
            user_agent: format!("mch-tracker/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Apps Script web app accepting addRecord / updateRecord / deleteRecord
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriterConfig {
    pub url: Option<String>,
    pub timeout_secs: u64,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub source: SourceConfig,
    pub writer: WriterConfig,
    pub pipeline: PipelineConfig,
}

impl AppConfig {
    /// Load `.env`, then merge defaults, the TOML file and the environment
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let path = std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        let config = Self::figment(&path).extract::<AppConfig>()?;

        config.validate().map_err(AppError::ConfigError)?;
        Ok(config)
    }

    pub fn figment(path: &str) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Validate configuration values
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.server.port == 0 {
            return Err("server.port must be > 0".to_string());
        }

        match self.source.kind {
            SourceKind::GoogleSheet => {
                let has_id = self
                    .source
                    .sheet_id
                    .as_deref()
                    .map(|id| !id.trim().is_empty())
                    .unwrap_or(false);
                if !has_id {
                    return Err("source.sheet_id is required for a google_sheet source".to_string());
                }
            }
            SourceKind::File => {
                if self.source.path.is_none() {
                    return Err("source.path is required for a file source".to_string());
                }
            }
        }

        if self.source.timeout_secs == 0 {
            return Err("source.timeout_secs must be > 0".to_string());
        }

        if let Some(url) = &self.writer.url {
            url::Url::parse(url).map_err(|e| format!("writer.url is invalid: {}", e))?;
        }

        self.pipeline.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet_config() -> AppConfig {
        AppConfig {
            source: SourceConfig {
                sheet_id: Some("1AbC".to_string()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults_need_a_sheet_id() {
        assert!(AppConfig::default().validate().is_err());
        assert!(sheet_config().validate().is_ok());
    }

    #[test]
    fn test_file_source_needs_path() {
        let mut config = sheet_config();
        config.source.kind = SourceKind::File;
        assert!(config.validate().is_err());

        config.source.path = Some(PathBuf::from("records.csv"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_writer_url() {
        let mut config = sheet_config();
        config.writer.url = Some("not a url".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_layers_merge() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "mch.toml",
                r#"
                [source]
                sheet_id = "from-file"

                [pipeline]
                viewport_padding = 0.2
                "#,
            )?;
            jail.set_env("MCH_SERVER__PORT", "8080");

            let config: AppConfig = AppConfig::figment("mch.toml").extract()?;
            assert_eq!(config.source.sheet_id.as_deref(), Some("from-file"));
            assert_eq!(config.server.port, 8080);
            assert_eq!(config.pipeline.viewport_padding, 0.2);
            assert_eq!(config.source.timeout_secs, 30);
            Ok(())
        });
    }
}
