use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

const MAX_REQUEST_ID_LEN: usize = 128;

/// Correlates an HTTP request with the analysis it started.
///
/// `POST /analyze` stores it on the upload session, so it shows up in the
/// analysis logs and in `/api/state`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestId(pub String);

impl RequestId {
    /// Reuses a sane incoming id (from a proxy) or mints a UUID v4.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let incoming = headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|s| is_acceptable(s));

        match incoming {
            Some(id) => Self(id.to_string()),
            None => Self(Uuid::new_v4().to_string()),
        }
    }
}

/// Ids end up in logs and response headers: keep them short and printable.
fn is_acceptable(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_REQUEST_ID_LEN
        && id.bytes().all(|b| b.is_ascii_graphic())
}

pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let id = RequestId::from_headers(request.headers());

    tracing::Span::current().record("request_id", id.0.as_str());
    let header = HeaderValue::from_str(&id.0).ok();
    request.extensions_mut().insert(id);

    let mut response = next.run(request).await;
    if let Some(val) = header {
        response.headers_mut().insert(REQUEST_ID_HEADER, val);
    }

    response
}
