use async_trait::async_trait;
use scorecard_core::AnalyzeResponse;

use crate::error::AnalysisResult;
use crate::{AnalysisClient, AnalysisConfig, PdfUpload};

/// Backend-agnostic interface for the prospectus analysis call.
///
/// The server only ever talks to this trait, so tests can swap in a fake.
#[async_trait]
pub trait AnalysisProvider: Send + Sync {
    /// Run one analysis. Exactly one outbound call per invocation.
    async fn analyze(&self, upload: PdfUpload) -> AnalysisResult<AnalyzeResponse>;

    async fn health(&self) -> AnalysisResult<bool>;

    fn backend_name(&self) -> &'static str;
}

/// HTTP-backed implementation that delegates to [`AnalysisClient`].
pub struct HttpAnalysisProvider {
    client: AnalysisClient,
}

impl HttpAnalysisProvider {
    pub fn new(client: AnalysisClient) -> Self {
        Self { client }
    }

    pub fn from_config(config: &AnalysisConfig) -> AnalysisResult<Self> {
        Ok(Self::new(AnalysisClient::new(config.service_url.clone(), config.timeout)?))
    }

    pub fn base_url(&self) -> &str {
        self.client.base_url()
    }
}

impl From<AnalysisClient> for HttpAnalysisProvider {
    fn from(client: AnalysisClient) -> Self {
        Self::new(client)
    }
}

#[async_trait]
impl AnalysisProvider for HttpAnalysisProvider {
    async fn analyze(&self, upload: PdfUpload) -> AnalysisResult<AnalyzeResponse> {
        self.client.analyze(upload).await
    }

    async fn health(&self) -> AnalysisResult<bool> {
        self.client.health().await
    }

    fn backend_name(&self) -> &'static str {
        "http"
    }
}
