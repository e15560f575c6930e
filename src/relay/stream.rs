//! Live relay: `POST /ask/stream`.
//!
//! The upstream SSE body becomes the downstream response body unchanged.
//! Each request owns one [`CancellationToken`]; it is cancelled when the
//! downstream body is dropped early (client disconnect), which ends the
//! upstream read and releases its connection.

use std::pin::Pin;
use std::task::{ready, Context, Poll};
use std::time::Instant;

use axum::body::{Body, Bytes};
use axum::extract::rejection::BytesRejection;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use futures_util::{Stream, TryStreamExt};
use pin_project::{pin_project, pinned_drop};
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::http::request::request_id;
use crate::http::response::{event_stream, passthrough};
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::relay::error::UPSTREAM_ERROR;
use crate::relay::{read_body, require_credentials, validate_ask, RelayError};
use crate::upstream::{collect_text_lossy, Endpoint, UpstreamCall, UpstreamResponse};

/// Forward one question and relay the answer as it is produced.
pub async fn ask_stream(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let started = Instant::now();
    let request_id = request_id(&headers);

    let response = match relay(&state, &request_id, body).await {
        Ok(response) => response,
        Err(e) => {
            e.log(&request_id, Endpoint::Stream);
            e.into_response()
        }
    };

    // Time to first byte for successful streams.
    metrics::record_request(Endpoint::Stream, response.status().as_u16(), started);
    response
}

async fn relay(
    state: &AppState,
    request_id: &str,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, RelayError> {
    let credentials = require_credentials(&state.secrets)?;
    let body = read_body(body, &state.limits)?;
    let request = validate_ask(&body, &state.limits, state.limits.stream_max_k)?;

    tracing::debug!(
        request_id = %request_id,
        k = request.k,
        question_chars = request.question.chars().count(),
        "Opening answer stream"
    );

    let cancel = CancellationToken::new();
    // Held across the upstream await: if the caller leaves before headers
    // arrive, this future is dropped and the guard fires.
    let guard = cancel.clone().drop_guard();

    let UpstreamResponse {
        status,
        content_type,
        body,
    } = state
        .upstream
        .send(UpstreamCall {
            endpoint: Endpoint::Stream,
            request,
            credentials,
            cancel,
        })
        .await?;

    let upstream_body = match body {
        Some(body) if status.is_success() => body,
        body => {
            let text = collect_text_lossy(body).await;
            guard.disarm();
            tracing::warn!(
                request_id = %request_id,
                status = %status,
                "Upstream refused stream, relaying its reply"
            );
            let text = if text.is_empty() {
                serde_json::json!({ "error": UPSTREAM_ERROR }).to_string()
            } else {
                text
            };
            return Ok(passthrough(status, content_type, "text/plain", text));
        }
    };

    tracing::info!(request_id = %request_id, "Streaming answer");

    let relayed = CancelOnDrop::new(
        upstream_body.inspect_ok(|chunk| metrics::record_stream_chunk(chunk.len())),
        guard,
    );
    Ok(event_stream(Body::from_stream(relayed)))
}

/// Stream adapter that cancels a token if it is dropped before completion.
///
/// Reaching the end of `inner` disarms the guard, so a fully consumed stream
/// leaves the token untouched.
#[pin_project(PinnedDrop)]
pub struct CancelOnDrop<S> {
    #[pin]
    inner: S,
    guard: Option<DropGuard>,
}

impl<S> CancelOnDrop<S> {
    pub fn new(inner: S, guard: DropGuard) -> Self {
        Self {
            inner,
            guard: Some(guard),
        }
    }
}

impl<S: Stream> Stream for CancelOnDrop<S> {
    type Item = S::Item;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();
        let next = ready!(this.inner.poll_next(cx));
        if next.is_none() {
            if let Some(guard) = this.guard.take() {
                guard.disarm();
            }
        }
        Poll::Ready(next)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

#[pinned_drop]
impl<S> PinnedDrop for CancelOnDrop<S> {
    fn drop(self: Pin<&mut Self>) {
        if self.guard.is_some() {
            tracing::debug!("Downstream closed mid-stream, cancelling upstream");
            metrics::record_stream_cancelled();
        }
    }
}
