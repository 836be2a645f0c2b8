// crates/subscription-http/src/middleware.rs
// ============================================================================
// Module: Request Middleware
// Description: Request id propagation and access logging.
// Purpose: Correlate every response and log line with one request id.
// Dependencies: axum, tracing, uuid
// ============================================================================

//! ## Overview
//! Each request runs inside an `http.request` span carrying `request_id`,
//! `method`, and `path`. The id is taken from the incoming `x-request-id`
//! header when it is a short visible-ASCII token, and generated otherwise.
//! The same id is echoed on the response. One access log line per request
//! records `status` and `latency_ms`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Instant;

use axum::extract::Request;
use axum::http::HeaderMap;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use tracing::Instrument;
use tracing::info;
use uuid::Uuid;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Header carrying the request correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";
/// Maximum accepted length of a client-supplied request id.
const MAX_REQUEST_ID_LENGTH: usize = 128;

// ============================================================================
// SECTION: Middleware
// ============================================================================

/// Assigns a request id, instruments the request, and logs its outcome.
pub async fn request_context(request: Request, next: Next) -> Response {
    let request_id = resolve_request_id(request.headers());
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let span = tracing::info_span!(
        "http.request",
        request_id = %request_id,
        method = %method,
        path = %path,
    );

    let started = Instant::now();
    let mut response = next.run(request).instrument(span.clone()).await;
    let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    span.in_scope(|| {
        info!(status = response.status().as_u16(), latency_ms, "request completed");
    });

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// Returns the client request id when acceptable, else a fresh UUID.
fn resolve_request_id(headers: &HeaderMap) -> String {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| is_acceptable_request_id(value))
        .map_or_else(|| Uuid::new_v4().to_string(), str::to_string)
}

/// Checks a client-supplied request id against length and charset limits.
fn is_acceptable_request_id(value: &str) -> bool {
    !value.is_empty()
        && value.len() <= MAX_REQUEST_ID_LENGTH
        && value.bytes().all(|byte| byte.is_ascii_graphic())
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only assertions."
    )]

    use axum::http::HeaderMap;
    use axum::http::HeaderValue;
    use uuid::Uuid;

    use super::REQUEST_ID_HEADER;
    use super::resolve_request_id;

    #[test]
    fn client_request_id_is_echoed() {
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static("req-42"));
        assert_eq!(resolve_request_id(&headers), "req-42");
    }

    #[test]
    fn missing_request_id_is_generated() {
        let id = resolve_request_id(&HeaderMap::new());
        assert!(id.parse::<Uuid>().is_ok());
    }

    #[test]
    fn oversized_or_blank_request_ids_are_replaced() {
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_str(&"a".repeat(129)).unwrap());
        assert!(resolve_request_id(&headers).parse::<Uuid>().is_ok());

        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static("   "));
        assert!(resolve_request_id(&headers).parse::<Uuid>().is_ok());
    }
}
