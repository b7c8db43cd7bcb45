use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use super::RecordSource;
use crate::domain::error::{AppError, Result};
use crate::domain::health::SourceTable;
use crate::infrastructure::csv::CsvParser;

const EXPORT_BASE_URL: &str = "https://docs.google.com/spreadsheets/d/";

/// CSV export of a link-shared Google Sheet
pub struct GoogleSheetSource {
    client: reqwest::Client,
    export_url: Url,
}

impl GoogleSheetSource {
    pub fn new(sheet_id: &str, gid: Option<&str>, timeout_secs: u64, user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(user_agent)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            export_url: Self::export_url(sheet_id, gid)?,
        })
    }

    /// `https://docs.google.com/spreadsheets/d/{id}/export?format=csv[&gid=]`
    pub fn export_url(sheet_id: &str, gid: Option<&str>) -> Result<Url> {
        let sheet_id = sheet_id.trim();
        if sheet_id.is_empty() || sheet_id.contains('/') {
            return Err(AppError::ConfigError(format!("Invalid sheet id: {:?}", sheet_id)));
        }

        let mut url = Url::parse(EXPORT_BASE_URL)
            .and_then(|base| base.join(&format!("{}/export", sheet_id)))
            .map_err(|e| AppError::ConfigError(format!("Invalid sheet id {}: {}", sheet_id, e)))?;

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("format", "csv");
            if let Some(gid) = gid.map(str::trim).filter(|gid| !gid.is_empty()) {
                query.append_pair("gid", gid);
            }
        }

        Ok(url)
    }
}

#[async_trait]
impl RecordSource for GoogleSheetSource {
    async fn fetch(&self) -> Result<SourceTable> {
        let response = self
            .client
            .get(self.export_url.clone())
            .send()
            .await
            .map_err(|e| AppError::SourceUnavailable(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::SourceUnavailable(format!(
                "Sheet export returned {}",
                status
            )));
        }

        // A sheet that is not link-shared redirects to a sign-in page.
        let is_html = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.starts_with("text/html"))
            .unwrap_or(false);
        if is_html {
            return Err(AppError::SourceUnavailable(
                "Sheet export returned HTML; is the sheet shared publicly?".to_string(),
            ));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::SourceUnavailable(format!("Failed to read body: {}", e)))?;

        debug!(bytes = bytes.len(), "Fetched sheet export");
        CsvParser::new().parse_bytes(&bytes)
    }

    fn describe(&self) -> String {
        format!("google sheet {}", self.export_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_url() {
        let url = GoogleSheetSource::export_url("1AbC-xyz", None).unwrap();
        assert_eq!(
            url.as_str(),
            "https://docs.google.com/spreadsheets/d/1AbC-xyz/export?format=csv"
        );

        let url = GoogleSheetSource::export_url("1AbC-xyz", Some("42")).unwrap();
        assert_eq!(
            url.as_str(),
            "https://docs.google.com/spreadsheets/d/1AbC-xyz/export?format=csv&gid=42"
        );
    }

    #[test]
    fn test_rejects_bad_sheet_id() {
        assert!(GoogleSheetSource::export_url("", None).is_err());
        assert!(GoogleSheetSource::export_url("a/b", None).is_err());
    }

    #[tokio::test]
    async fn test_unreachable_host_is_source_unavailable() {
        let source = GoogleSheetSource {
            client: reqwest::Client::builder()
                .timeout(Duration::from_millis(500))
                .build()
                .unwrap(),
            export_url: Url::parse("http://127.0.0.1:9/export?format=csv").unwrap(),
        };

        let err = source.fetch().await.unwrap_err();
        assert!(matches!(err, AppError::SourceUnavailable(_)));
    }
}
