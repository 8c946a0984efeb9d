//! API Middleware
//!
//! Correlation ids and per-request logging for the ride API.

use std::time::Instant;

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use tracing::Instrument;
use uuid::Uuid;

use crate::domain::OperationContext;

/// Header carrying the request correlation id
pub const CORRELATION_ID_HEADER: HeaderName = HeaderName::from_static("x-correlation-id");

// =========================================================================
// Correlation Middleware
// =========================================================================

/// Attach an `OperationContext` to every request.
///
/// Reuses a well-formed `X-Correlation-Id` from the client or generates one,
/// and echoes it on the response.
pub async fn correlation_middleware(mut request: Request<Body>, next: Next) -> Response {
    let correlation_id = request
        .headers()
        .get(&CORRELATION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap_or_else(Uuid::new_v4);

    let context = OperationContext::new().with_correlation_id(correlation_id);
    request.extensions_mut().insert(context);

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&correlation_id.to_string()) {
        response.headers_mut().insert(CORRELATION_ID_HEADER, value);
    }

    response
}

// =========================================================================
// Request Logging
// =========================================================================

/// Credentials that never reach the logs
static REDACTED_HEADERS: [HeaderName; 4] = [
    header::AUTHORIZATION,
    header::PROXY_AUTHORIZATION,
    header::COOKIE,
    header::SET_COOKIE,
];

/// Header list for the request log with credential values replaced
pub fn redact_headers(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let value = if REDACTED_HEADERS.contains(name) {
                "[REDACTED]"
            } else {
                value.to_str().unwrap_or("[non-ascii]")
            };
            (name.to_string(), value.to_string())
        })
        .collect()
}

/// Log every ride API request inside a span keyed by its correlation id.
///
/// Must sit inside `correlation_middleware`.
pub async fn logging_middleware(request: Request<Body>, next: Next) -> Response {
    let correlation_id = request
        .extensions()
        .get::<OperationContext>()
        .and_then(|context| context.correlation_id);

    let span = tracing::info_span!(
        "ride_api",
        method = %request.method(),
        path = %request.uri().path(),
        correlation_id = ?correlation_id,
    );

    async move {
        tracing::debug!(headers = ?redact_headers(request.headers()), "Request received");

        let started = Instant::now();
        let response = next.run(request).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;
        let status = response.status().as_u16();

        match response.status() {
            s if s.is_server_error() => tracing::error!(status, elapsed_ms, "Request failed"),
            s if s.is_client_error() => tracing::warn!(status, elapsed_ms, "Request rejected"),
            _ => tracing::info!(status, elapsed_ms, "Request completed"),
        }

        response
    }
    .instrument(span)
    .await
}
