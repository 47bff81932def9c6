use analysis_client::{AnalysisProvider, PdfUpload};
use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use report_view::{render_page, PageContext, ReportView};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::Instrument;

use crate::request_id::RequestId;
use crate::upload::{StateSummary, Submission, Ticket, UploadSession, UploadState};
use crate::{ApiResponse, AppError, AppState};

/// HTML routes: the page itself, the upload form target and reset.
pub fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(show_page))
        .route("/analyze", post(analyze))
        .route("/reset", post(reset))
        .route("/health", get(health))
}

/// JSON routes, mounted under `/api`.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/report", get(get_report))
        .route("/state", get(get_state))
}

/// Renders the page for the current session state.
///
/// A `notice` replaces any stored error and keeps the upload form visible.
fn render(state: &UploadState, notice: Option<&str>) -> String {
    let report = match (state, notice) {
        (UploadState::Succeeded { response, .. }, None) => Some(ReportView::build(response)),
        _ => None,
    };

    let mut ctx = PageContext {
        report: report.as_ref(),
        ..Default::default()
    };
    match state {
        UploadState::Idle => {}
        UploadState::Pending { file_name, .. } => {
            ctx.upload.pending = true;
            ctx.upload.pending_file = Some(file_name);
        }
        UploadState::Succeeded { file_name, .. } => ctx.file_name = Some(file_name),
        UploadState::Failed { message, .. } => ctx.upload.error = Some(message),
    }
    if notice.is_some() {
        ctx.upload.error = notice;
    }

    render_page(&ctx)
}

async fn show_page(State(state): State<AppState>) -> Html<String> {
    let session = state.session.lock().await;
    Html(render(session.state(), None))
}

async fn read_submission(mut multipart: Multipart) -> Result<Submission, MultipartError> {
    let mut submission = Submission::default();
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("file") {
            submission.file_name = field.file_name().map(str::to_string);
            submission.bytes = field.bytes().await?.to_vec();
        }
    }
    Ok(submission)
}

async fn analyze(
    State(state): State<AppState>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    multipart: Multipart,
) -> (StatusCode, Html<String>) {
    let submission = match read_submission(multipart).await {
        Ok(submission) => Submission {
            request_id: Some(request_id.clone()),
            ..submission
        },
        Err(e) => {
            let status = e.status();
            tracing::warn!(%status, "Unreadable upload: {}", e.body_text());
            let notice = if status == StatusCode::PAYLOAD_TOO_LARGE {
                "The PDF is larger than the upload limit."
            } else {
                "Could not read the uploaded file."
            };
            let session = state.session.lock().await;
            return (status, Html(render(session.state(), Some(notice))));
        }
    };

    let begun = state.session.lock().await.begin(submission);
    let (ticket, upload) = match begun {
        Ok(accepted) => accepted,
        Err(rejection) => {
            tracing::info!(%rejection, "Submission rejected");
            let session = state.session.lock().await;
            let notice = rejection.to_string();
            return (rejection.status(), Html(render(session.state(), Some(&notice))));
        }
    };

    // Settled by a detached task so neither a dropped connection nor a
    // panicking provider can leave the session pending.
    let span = tracing::info_span!("analysis", request_id = %request_id);
    let settle = tokio::spawn(
        settle_analysis(Arc::clone(&state.provider), Arc::clone(&state.session), ticket, upload)
            .instrument(span),
    );
    if let Err(e) = settle.await {
        tracing::error!(request_id = %request_id, "Analysis task aborted: {e}");
    }

    let session = state.session.lock().await;
    let status = match session.state() {
        UploadState::Failed { .. } => StatusCode::BAD_GATEWAY,
        _ => StatusCode::OK,
    };
    (status, Html(render(session.state(), None)))
}

async fn settle_analysis(
    provider: Arc<dyn AnalysisProvider>,
    session: Arc<Mutex<UploadSession>>,
    ticket: Ticket,
    upload: PdfUpload,
) {
    let started = Instant::now();
    let backend = provider.backend_name();
    let call = tokio::spawn(async move { provider.analyze(upload).await }.in_current_span());

    let outcome = match call.await {
        Ok(Ok(response)) => {
            tracing::info!(
                backend,
                blocks = response.components.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Analysis succeeded"
            );
            Ok(response)
        }
        Ok(Err(e)) => {
            tracing::warn!(
                backend,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Analysis failed: {e}"
            );
            Err(e.user_message())
        }
        Err(e) => {
            tracing::error!(backend, "Analysis call aborted: {e}");
            Err("Upload failed".to_string())
        }
    };

    if !session.lock().await.finish(ticket, outcome) {
        tracing::warn!("Discarded outcome of a superseded analysis");
    }
}

async fn reset(State(state): State<AppState>) -> Response {
    let mut session = state.session.lock().await;
    match session.reset() {
        Ok(()) => {
            tracing::info!("Session reset");
            Redirect::to("/").into_response()
        }
        Err(rejection) => {
            let notice = rejection.to_string();
            (rejection.status(), Html(render(session.state(), Some(&notice)))).into_response()
        }
    }
}

async fn health() -> Json<Value> {
    Json(json!({ "ok": true }))
}

async fn get_report(State(state): State<AppState>) -> Result<Json<ApiResponse<ReportView>>, AppError> {
    let session = state.session.lock().await;
    match session.state() {
        UploadState::Succeeded { response, .. } => {
            Ok(Json(ApiResponse::success(ReportView::build(response))))
        }
        _ => Err(AppError::with_status(
            StatusCode::NOT_FOUND,
            anyhow::anyhow!("No report available"),
        )),
    }
}

async fn get_state(State(state): State<AppState>) -> Json<ApiResponse<StateSummary>> {
    let session = state.session.lock().await;
    Json(ApiResponse::success(session.summary()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{build_router, ServerConfig};
    use analysis_client::{AnalysisError, AnalysisResult};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use scorecard_core::AnalyzeResponse;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Notify;
    use tower::ServiceExt;

    const BOUNDARY: &str = "scorecard-test-boundary";

    struct FakeProvider {
        calls: AtomicUsize,
        gate: Option<Arc<Notify>>,
        outcome: fn() -> AnalysisResult<AnalyzeResponse>,
    }

    impl FakeProvider {
        fn new(outcome: fn() -> AnalysisResult<AnalyzeResponse>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                gate: None,
                outcome,
            })
        }

        fn gated(gate: Arc<Notify>, outcome: fn() -> AnalysisResult<AnalyzeResponse>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                gate: Some(gate),
                outcome,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AnalysisProvider for FakeProvider {
        async fn analyze(&self, _upload: PdfUpload) -> AnalysisResult<AnalyzeResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            (self.outcome)()
        }

        async fn health(&self) -> AnalysisResult<bool> {
            Ok(true)
        }

        fn backend_name(&self) -> &'static str {
            "fake"
        }
    }

    fn full_report() -> AnalysisResult<AnalyzeResponse> {
        Ok(serde_json::from_value(json!({
            "slug": "acme",
            "components": [
                {
                    "component": "terms_and_financials",
                    "company": "Acme <Ltd>",
                    "terms": { "price_band": [450, 475], "lot_size": 31 },
                    "financials": [
                        { "fy": "FY23", "revenue_cr": 700.0, "pat_cr": 30.0 },
                        { "fy": "FY24", "revenue_cr": 812.4, "pat_cr": 40.1 }
                    ]
                },
                { "component": "verdict", "verdict": "Apply", "score": 7.5, "confidence": 0.82, "why": ["Strong growth"] }
            ],
            "sources": [{ "title": "DRHP", "url": "https://example.com/drhp.pdf" }]
        }))
        .unwrap())
    }

    fn rejected() -> AnalysisResult<AnalyzeResponse> {
        Err(AnalysisError::Rejected {
            status: 500,
            detail: "Upload failed".to_string(),
        })
    }

    fn crashes() -> AnalysisResult<AnalyzeResponse> {
        panic!("provider crashed")
    }

    fn app(provider: Arc<FakeProvider>) -> Router {
        let config = ServerConfig::from_lookup(|_| None).unwrap();
        build_router(AppState::new(provider, config))
    }

    fn upload_request(file_name: &str, content: &[u8]) -> Request<Body> {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: application/pdf\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/analyze")
            .header("content-type", format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from(body))
            .unwrap()
    }

    fn request(method: &str, uri: &str) -> Request<Body> {
        Request::builder().method(method).uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_string(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn session_state(app: &Router) -> Value {
        let response = app.clone().oneshot(request("GET", "/api/state")).await.unwrap();
        let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
        body["data"].clone()
    }

    #[tokio::test]
    async fn test_empty_page() {
        let app = app(FakeProvider::new(full_report));
        let response = app.oneshot(request("GET", "/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        assert!(response.headers().contains_key("content-security-policy"));

        let html = body_string(response).await;
        assert!(html.contains("Upload a DRHP/RHP PDF to get started."));
        assert!(html.contains(r#"action="/analyze""#));
    }

    #[tokio::test]
    async fn test_missing_file_makes_no_call() {
        let provider = FakeProvider::new(full_report);
        let app = app(provider.clone());

        let response = app.clone().oneshot(upload_request("", b"")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let html = body_string(response).await;
        assert!(html.contains("Please select a PDF file."));
        assert_eq!(provider.calls(), 0);

        let response = app.oneshot(upload_request("notes.txt", b"hello")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_string(response).await.contains("Only PDF files are accepted"));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_successful_upload_renders_report() {
        let provider = FakeProvider::new(full_report);
        let app = app(provider.clone());

        let response = app.clone().oneshot(upload_request("Acme DRHP.pdf", b"%PDF-1.7")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_string(response).await;
        assert_eq!(provider.calls(), 1);

        assert!(html.contains(r#"id="snapshot""#));
        assert!(html.contains(r#"id="financials""#));
        assert!(html.contains(r#"id="trends""#));
        assert!(html.contains(r#"id="verdict""#));
        assert!(!html.contains(r#"id="quality""#));
        assert!(html.contains("Acme &lt;Ltd&gt;"));
        assert!(html.contains("Acme DRHP.pdf"));
        assert!(html.contains("Upload another PDF"));
        assert!(!html.contains(r#"action="/analyze""#));

        let snapshot = html.find(r#"id="snapshot""#).unwrap();
        let verdict = html.find(r#"id="verdict""#).unwrap();
        assert!(snapshot < verdict);

        let page = body_string(app.clone().oneshot(request("GET", "/")).await.unwrap()).await;
        assert!(page.contains(r#"id="verdict""#));

        let api = app.oneshot(request("GET", "/api/report")).await.unwrap();
        assert_eq!(api.status(), StatusCode::OK);
        let body: Value = serde_json::from_str(&body_string(api).await).unwrap();
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["data"]["slug"], json!("acme"));
    }

    #[tokio::test]
    async fn test_failure_keeps_form_usable() {
        let provider = FakeProvider::new(rejected);
        let app = app(provider.clone());

        let response = app.clone().oneshot(upload_request("a.pdf", b"%PDF")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let html = body_string(response).await;
        assert!(html.contains(r#"<p class="error" role="alert">Upload failed</p>"#));
        assert!(html.contains("<button type=\"submit\">Analyze PDF</button>"));
        assert!(!html.contains(r#"id="snapshot""#));

        let state = app.clone().oneshot(request("GET", "/api/state")).await.unwrap();
        let body: Value = serde_json::from_str(&body_string(state).await).unwrap();
        assert_eq!(body["data"]["status"], json!("failed"));
        assert_eq!(body["data"]["error"], json!("Upload failed"));

        // A retry is a fresh attempt
        let response = app.oneshot(upload_request("a.pdf", b"%PDF")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_second_submission_while_pending_is_rejected() {
        let gate = Arc::new(Notify::new());
        let provider = FakeProvider::gated(gate.clone(), full_report);
        let app = app(provider.clone());

        let first = tokio::spawn(app.clone().oneshot(upload_request("a.pdf", b"%PDF")));
        for _ in 0..200 {
            if provider.calls() == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(provider.calls(), 1);

        let page = body_string(app.clone().oneshot(request("GET", "/")).await.unwrap()).await;
        assert!(page.contains("<button type=\"submit\" disabled>Analyzing…</button>"));
        assert!(page.contains(r#"http-equiv="refresh""#));

        let second = app.clone().oneshot(upload_request("b.pdf", b"%PDF")).await.unwrap();
        assert_eq!(second.status(), StatusCode::CONFLICT);
        assert!(body_string(second).await.contains("An analysis is already in progress."));

        let reset = app.clone().oneshot(request("POST", "/reset")).await.unwrap();
        assert_eq!(reset.status(), StatusCode::CONFLICT);

        gate.notify_one();
        let first = first.await.unwrap().unwrap();
        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_reset_returns_to_empty_state() {
        let app = app(FakeProvider::new(full_report));
        app.clone().oneshot(upload_request("a.pdf", b"%PDF")).await.unwrap();

        let reset = app.clone().oneshot(request("POST", "/reset")).await.unwrap();
        assert_eq!(reset.status(), StatusCode::SEE_OTHER);
        assert_eq!(reset.headers()["location"], "/");

        let html = body_string(app.clone().oneshot(request("GET", "/")).await.unwrap()).await;
        assert!(html.contains("Upload a DRHP/RHP PDF to get started."));
        assert!(!html.contains(r#"id="snapshot""#));

        let api = app.oneshot(request("GET", "/api/report")).await.unwrap();
        assert_eq!(api.status(), StatusCode::NOT_FOUND);
        let body: Value = serde_json::from_str(&body_string(api).await).unwrap();
        assert_eq!(body["success"], json!(false));
    }

    #[tokio::test]
    async fn test_health() {
        let app = app(FakeProvider::new(full_report));
        let response = app.oneshot(request("GET", "/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, r#"{"ok":true}"#);
    }

    #[tokio::test]
    async fn test_request_id_is_propagated() {
        let app = app(FakeProvider::new(full_report));
        let request = Request::builder()
            .uri("/health")
            .header("x-request-id", "abc-123")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.headers()["x-request-id"], "abc-123");
    }

    #[tokio::test]
    async fn test_provider_panic_fails_the_upload() {
        let provider = FakeProvider::new(crashes);
        let app = app(provider.clone());

        let response = app.clone().oneshot(upload_request("a.pdf", b"%PDF")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert!(body_string(response).await.contains("Upload failed"));
        assert_eq!(session_state(&app).await["status"], json!("failed"));
    }

    #[tokio::test]
    async fn test_provider_panic_after_disconnect_still_settles_session() {
        let gate = Arc::new(Notify::new());
        let provider = FakeProvider::gated(gate.clone(), crashes);
        let app = app(provider.clone());

        let upload = tokio::spawn(app.clone().oneshot(upload_request("a.pdf", b"%PDF")));
        for _ in 0..200 {
            if provider.calls() == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(provider.calls(), 1);

        // Client goes away, then the provider blows up.
        upload.abort();
        assert!(upload.await.unwrap_err().is_cancelled());
        gate.notify_one();

        let mut state = session_state(&app).await;
        for _ in 0..200 {
            if state["status"] != json!("pending") {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
            state = session_state(&app).await;
        }
        assert_eq!(state["status"], json!("failed"));
        assert_eq!(state["error"], json!("Upload failed"));

        let reset = app.clone().oneshot(request("POST", "/reset")).await.unwrap();
        assert_eq!(reset.status(), StatusCode::SEE_OTHER);
        assert_eq!(session_state(&app).await["status"], json!("idle"));
    }

    #[tokio::test]
    async fn test_upload_records_request_id() {
        let app = app(FakeProvider::new(full_report));
        let mut upload = upload_request("a.pdf", b"%PDF");
        upload
            .headers_mut()
            .insert("x-request-id", "upload-7".parse().unwrap());

        let response = app.clone().oneshot(upload).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-request-id"], "upload-7");

        let state = session_state(&app).await;
        assert_eq!(state["status"], json!("succeeded"));
        assert_eq!(state["request_id"], json!("upload-7"));
    }
}
