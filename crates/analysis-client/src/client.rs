use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use scorecard_core::AnalyzeResponse;
use serde::Deserialize;
use std::time::Duration;

use crate::error::{AnalysisError, AnalysisResult};
use crate::PdfUpload;

#[derive(Clone)]
pub struct AnalysisClient {
    client: reqwest::Client,
    base_url: String,
}

impl AnalysisClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> AnalysisResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Upload one PDF and decode the structured analysis.
    pub async fn analyze(&self, upload: PdfUpload) -> AnalysisResult<AnalyzeResponse> {
        let size = upload.bytes.len();
        let part = Part::bytes(upload.bytes)
            .file_name(upload.file_name.clone())
            .mime_str("application/pdf")?;

        let mut form = Form::new().part("file", part);
        if let Some(slug) = upload.slug {
            form = form.text("slug", slug);
        }

        tracing::debug!(file = %upload.file_name, bytes = size, "posting PDF to analysis service");

        let response = self
            .client
            .post(format!("{}/analyze", self.base_url))
            .multipart(form)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(error_for_status(status, &body));
        }

        let bytes = response.bytes().await.map_err(classify)?;
        let result = AnalyzeResponse::from_json(&bytes)?;
        tracing::debug!(blocks = result.components.len(), "analysis response decoded");
        Ok(result)
    }

    /// Check service health
    pub async fn health(&self) -> AnalysisResult<bool> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await
            .map_err(classify)?;

        Ok(response.status().is_success())
    }
}

fn classify(e: reqwest::Error) -> AnalysisError {
    if e.is_timeout() {
        AnalysisError::Timeout
    } else {
        AnalysisError::RequestFailed(e)
    }
}

/// FastAPI error bodies: `{"detail": "..."}` or a list of `{"msg": "..."}`.
#[derive(Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

fn detail_message(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    let message = match parsed.detail {
        serde_json::Value::String(s) => s,
        serde_json::Value::Array(items) => items
            .iter()
            .filter_map(|i| i.get("msg").and_then(|m| m.as_str()))
            .collect::<Vec<_>>()
            .join("; "),
        _ => return None,
    };
    let message = message.trim().to_string();
    if message.is_empty() {
        None
    } else {
        Some(message)
    }
}

fn error_for_status(status: StatusCode, body: &str) -> AnalysisError {
    if status == StatusCode::SERVICE_UNAVAILABLE {
        return AnalysisError::ServiceUnavailable(format!("Status: {}", status));
    }
    AnalysisError::Rejected {
        status: status.as_u16(),
        detail: detail_message(body).unwrap_or_else(|| format!("Analysis failed (status {})", status.as_u16())),
    }
}
