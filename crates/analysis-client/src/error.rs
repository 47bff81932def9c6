use scorecard_core::ScorecardError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Analysis rejected (status {status}): {detail}")]
    Rejected { status: u16, detail: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout")]
    Timeout,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<ScorecardError> for AnalysisError {
    fn from(e: ScorecardError) -> Self {
        AnalysisError::InvalidResponse(e.to_string())
    }
}

impl AnalysisError {
    /// Message suitable for showing next to the upload form.
    pub fn user_message(&self) -> String {
        match self {
            AnalysisError::Rejected { detail, .. } => detail.clone(),
            AnalysisError::Timeout => {
                "The analysis service took too long to respond. Please try again.".to_string()
            }
            AnalysisError::ServiceUnavailable(_) => {
                "The analysis service is unavailable. Please try again later.".to_string()
            }
            AnalysisError::RequestFailed(e) if e.is_connect() => {
                "Could not reach the analysis service.".to_string()
            }
            AnalysisError::RequestFailed(_) => "Upload failed".to_string(),
            AnalysisError::InvalidResponse(_) | AnalysisError::Serialization(_) => {
                "The analysis service returned a result that could not be read.".to_string()
            }
        }
    }
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;
