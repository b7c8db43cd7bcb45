// ============================================================
// WRITE ENDPOINT CLIENT
// ============================================================
// Forwards record drafts to the sheet's Apps Script web app

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::error::{AppError, Result};
use crate::domain::health::RecordDraft;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum WriteAction {
    AddRecord,
    UpdateRecord,
    DeleteRecord,
}

#[derive(Serialize)]
struct WriteRequest<'a> {
    action: WriteAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a RecordDraft>,
}

/// `{success, message, data?, timestamp}` answered by the web app
#[derive(Debug, Clone, Deserialize)]
pub struct WriteResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[async_trait]
pub trait RecordWriter {
    async fn add(&self, draft: &RecordDraft) -> Result<WriteResponse>;
    async fn update(&self, id: &str, draft: &RecordDraft) -> Result<WriteResponse>;
    async fn delete(&self, id: &str) -> Result<WriteResponse>;
}

pub struct AppsScriptWriter {
    client: reqwest::Client,
    url: String,
}

impl AppsScriptWriter {
    pub fn new(url: &str, timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: url.to_string(),
        })
    }

    async fn send(
        &self,
        action: WriteAction,
        id: Option<&str>,
        data: Option<&RecordDraft>,
    ) -> Result<WriteResponse> {
        let body = WriteRequest { action, id, data };

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::SourceUnavailable(format!("Write request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::SourceUnavailable(format!(
                "Write endpoint error ({}): {}",
                status, text
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| AppError::SourceUnavailable(format!("Failed to read body: {}", e)))?;

        let decoded = decode_response(&text)?;
        info!(action = ?action, id = id.unwrap_or("-"), "Write accepted");
        Ok(decoded)
    }
}

/// Decode the envelope; `success: false` becomes [`AppError::WriteRejected`]
pub fn decode_response(body: &str) -> Result<WriteResponse> {
    let response: WriteResponse = serde_json::from_str(body)
        .map_err(|e| AppError::ParseError(format!("Failed to parse write response: {}", e)))?;

    if !response.success {
        return Err(AppError::WriteRejected(response.message));
    }

    Ok(response)
}

#[async_trait]
impl RecordWriter for AppsScriptWriter {
    async fn add(&self, draft: &RecordDraft) -> Result<WriteResponse> {
        self.send(WriteAction::AddRecord, None, Some(draft)).await
    }

    async fn update(&self, id: &str, draft: &RecordDraft) -> Result<WriteResponse> {
        self.send(WriteAction::UpdateRecord, Some(id), Some(draft)).await
    }

    async fn delete(&self, id: &str) -> Result<WriteResponse> {
        self.send(WriteAction::DeleteRecord, Some(id), None).await
    }
}
