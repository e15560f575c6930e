//! Response construction.
//!
//! # Responsibilities
//! - Fixed JSON error bodies (`{"error": "..."}`)
//! - Relay upstream status, content type and body unchanged
//! - Event-stream headers for live relays
//!
//! # Design Decisions
//! - Streaming responses avoid buffering the body
//! - Upstream status codes pass through untouched, including errors

use axum::body::Body;
use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

/// Content type of relayed answer streams.
pub const EVENT_STREAM: &str = "text/event-stream; charset=utf-8";
/// Stops reverse proxies (nginx) from buffering the stream.
pub const X_ACCEL_BUFFERING: HeaderName = HeaderName::from_static("x-accel-buffering");

/// `{"error": message}` with the given status.
pub fn json_error(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

/// Relay an upstream reply, falling back to `default_type` when it declared none.
pub fn passthrough(
    status: StatusCode,
    content_type: Option<HeaderValue>,
    default_type: &'static str,
    body: impl Into<Body>,
) -> Response {
    let content_type = content_type.unwrap_or_else(|| HeaderValue::from_static(default_type));
    let body: Body = body.into();
    (status, [(header::CONTENT_TYPE, content_type)], body).into_response()
}

/// 200 event-stream response around a live body.
pub fn event_stream(body: Body) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, EVENT_STREAM),
            (header::CACHE_CONTROL, "no-cache, no-transform"),
            (header::CONNECTION, "keep-alive"),
            (X_ACCEL_BUFFERING, "no"),
        ],
        body,
    )
        .into_response()
}
