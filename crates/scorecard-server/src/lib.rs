pub mod config;
pub mod report_routes;
pub mod request_id;
pub mod security_headers;
pub mod upload;

use analysis_client::{AnalysisProvider, HttpAnalysisProvider};
use anyhow::Context;
use axum::{
    extract::{DefaultBodyLimit, Request},
    http::{Method, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::ServerConfig;
pub use upload::{SubmitRejection, UploadSession, UploadState};

const DEFAULT_LOG_FILTER: &str = "scorecard_server=info,analysis_client=info,tower_http=info";

#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn AnalysisProvider>,
    /// One session for the whole server; every visitor sees the same report.
    pub session: Arc<Mutex<UploadSession>>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(provider: Arc<dyn AnalysisProvider>, config: ServerConfig) -> Self {
        Self {
            provider,
            session: Arc::new(Mutex::new(UploadSession::new())),
            config: Arc::new(config),
        }
    }
}

#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Error type for JSON handlers. Defaults to 500.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    error: anyhow::Error,
}

impl AppError {
    pub fn with_status(status: StatusCode, error: anyhow::Error) -> Self {
        Self { status, error }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::with_status(StatusCode::INTERNAL_SERVER_ERROR, err.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, "{:#}", self.error);
        } else {
            tracing::debug!(status = %self.status, "{:#}", self.error);
        }
        let body = ApiResponse::<()>::error(self.error.to_string());
        (self.status, Json(body)).into_response()
    }
}

/// `RUST_LOG_FORMAT=json` switches to structured output; `RUST_LOG` filters.
pub fn init_tracing() {
    let filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER))
    };
    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let result = if json_logging {
        tracing_subscriber::fmt().json().with_env_filter(filter()).try_init()
    } else {
        tracing_subscriber::fmt().with_env_filter(filter()).try_init()
    };
    if let Err(e) = result {
        eprintln!("tracing already initialised: {e}");
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET]);

    let trace = TraceLayer::new_for_http().make_span_with(|request: &Request| {
        tracing::info_span!(
            "http_request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = tracing::field::Empty,
        )
    });

    Router::new()
        .merge(report_routes::report_routes())
        .nest("/api", report_routes::api_routes().layer(cors))
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
        .layer(middleware::from_fn(security_headers::security_headers_middleware))
        .layer(middleware::from_fn(request_id::request_id_middleware))
        .layer(trace)
        .with_state(state)
}

pub async fn run_server() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ServerConfig::from_env()?;
    tracing::info!("Configuration loaded and validated");
    tracing::info!("  Analysis service: {}", config.analysis.service_url);
    tracing::info!("  Analysis timeout: {}s", config.analysis.timeout.as_secs());
    tracing::info!("  Max upload: {} bytes", config.max_upload_bytes);

    let provider = HttpAnalysisProvider::from_config(&config.analysis)
        .context("Failed to build analysis client")?;
    match provider.health().await {
        Ok(true) => tracing::info!("Analysis service is healthy"),
        Ok(false) => tracing::warn!("Analysis service reported unhealthy"),
        Err(e) => tracing::warn!("Analysis service not reachable yet: {e}"),
    }

    let addr = config.bind_addr();
    let state = AppState::new(Arc::new(provider), config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("IPO Scorecard listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
