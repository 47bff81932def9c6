use analysis_client::AnalysisConfig;
use anyhow::{ensure, Context, Result};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub analysis: AnalysisConfig,
    pub max_upload_bytes: usize,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; unset keys fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let timeout_secs: u64 = var("ANALYSIS_TIMEOUT_SECS", "300")
            .parse()
            .context("ANALYSIS_TIMEOUT_SECS must be a whole number of seconds")?;
        let max_upload_mb: usize = var("MAX_UPLOAD_MB", "50")
            .parse()
            .context("MAX_UPLOAD_MB must be a whole number of megabytes")?;

        let config = Self {
            host: var("SCORECARD_HOST", "0.0.0.0"),
            port: var("SCORECARD_PORT", "3000")
                .parse()
                .context("SCORECARD_PORT must be a valid port")?,
            analysis: AnalysisConfig {
                service_url: var("ANALYSIS_SERVICE_URL", "http://localhost:8000"),
                timeout: Duration::from_secs(timeout_secs),
            },
            max_upload_bytes: max_upload_mb.saturating_mul(1024 * 1024),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.analysis.timeout > Duration::ZERO,
            "ANALYSIS_TIMEOUT_SECS must be greater than zero"
        );
        ensure!(self.max_upload_bytes > 0, "MAX_UPLOAD_MB must be greater than zero");

        let url = self.analysis.service_url.trim();
        ensure!(
            url.starts_with("http://") || url.starts_with("https://"),
            "ANALYSIS_SERVICE_URL must start with http:// or https:// (got {url:?})"
        );
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<ServerConfig> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.bind_addr(), "0.0.0.0:3000");
        assert_eq!(config.analysis.service_url, "http://localhost:8000");
        assert_eq!(config.analysis.timeout, Duration::from_secs(300));
        assert_eq!(config.max_upload_bytes, 50 * 1024 * 1024);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("SCORECARD_HOST", "127.0.0.1"),
            ("SCORECARD_PORT", "8080"),
            ("ANALYSIS_SERVICE_URL", "https://analysis.internal"),
            ("ANALYSIS_TIMEOUT_SECS", "30"),
            ("MAX_UPLOAD_MB", "5"),
        ])
        .unwrap();
        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
        assert_eq!(config.analysis.service_url, "https://analysis.internal");
        assert_eq!(config.analysis.timeout, Duration::from_secs(30));
        assert_eq!(config.max_upload_bytes, 5 * 1024 * 1024);
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let err = config_from(&[("ANALYSIS_TIMEOUT_SECS", "0")]).unwrap_err();
        assert!(err.to_string().contains("ANALYSIS_TIMEOUT_SECS"));
    }

    #[test]
    fn test_rejects_zero_upload_limit() {
        assert!(config_from(&[("MAX_UPLOAD_MB", "0")]).is_err());
    }

    #[test]
    fn test_rejects_non_http_url() {
        let err = config_from(&[("ANALYSIS_SERVICE_URL", "ftp://files")]).unwrap_err();
        assert!(err.to_string().contains("ANALYSIS_SERVICE_URL"));
    }

    #[test]
    fn test_rejects_garbage_port() {
        let err = config_from(&[("SCORECARD_PORT", "eighty")]).unwrap_err();
        assert!(err.to_string().contains("SCORECARD_PORT"));
    }
}
