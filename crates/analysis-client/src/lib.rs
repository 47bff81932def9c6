pub mod client;
pub mod error;
pub mod provider;

pub use client::AnalysisClient;
pub use error::{AnalysisError, AnalysisResult};
pub use provider::{AnalysisProvider, HttpAnalysisProvider};

use std::time::Duration;

/// Configuration for the analysis service
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub service_url: String,
    pub timeout: Duration,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            service_url: std::env::var("ANALYSIS_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:8000".to_string()),
            timeout: Duration::from_secs(
                std::env::var("ANALYSIS_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(300),
            ),
        }
    }
}

/// One prospectus PDF as chosen by the user.
#[derive(Debug, Clone)]
pub struct PdfUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub slug: Option<String>,
}

impl PdfUpload {
    /// Builds an upload whose slug is derived from the file name.
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let slug = slug_for(&file_name);
        Self { file_name, bytes, slug }
    }
}

/// `"Acme Industries DRHP.pdf"` → `"acme-industries-drhp"`.
pub fn slug_for(file_name: &str) -> Option<String> {
    let base = file_name.rsplit(|c| c == '/' || c == '\\').next().unwrap_or(file_name);
    let stem = match base.rfind('.') {
        Some(i) if i > 0 => &base[..i],
        _ => base,
    };
    let slug = stem.trim().replace(' ', "-").to_lowercase();
    if slug.is_empty() {
        None
    } else {
        Some(slug)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_for() {
        assert_eq!(slug_for("Acme Industries DRHP.pdf").as_deref(), Some("acme-industries-drhp"));
        assert_eq!(slug_for("C:\\docs\\Zeta RHP.PDF").as_deref(), Some("zeta-rhp"));
        assert_eq!(slug_for("noext").as_deref(), Some("noext"));
        assert_eq!(slug_for(".pdf").as_deref(), Some(".pdf"));
        assert_eq!(slug_for("  .pdf").as_deref(), None);
    }

    #[test]
    fn test_upload_derives_slug() {
        let upload = PdfUpload::new("My IPO.pdf", vec![1, 2, 3]);
        assert_eq!(upload.slug.as_deref(), Some("my-ipo"));
        assert_eq!(upload.bytes.len(), 3);
    }
}
