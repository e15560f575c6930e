//! Buffered relay: `POST /ask`.

use std::time::Instant;

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use tokio_util::sync::CancellationToken;

use crate::http::request::request_id;
use crate::http::response::passthrough;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::relay::{read_body, require_credentials, validate_ask, RelayError};
use crate::upstream::{Endpoint, UpstreamCall};

/// Forward one question and relay the complete upstream answer.
///
/// Status and body are mirrored verbatim; the content type is mirrored too,
/// defaulting to `application/json`.
pub async fn ask(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let started = Instant::now();
    let request_id = request_id(&headers);

    let response = match relay(&state, &request_id, body).await {
        Ok(response) => response,
        Err(e) => {
            e.log(&request_id, Endpoint::Ask);
            e.into_response()
        }
    };

    metrics::record_request(Endpoint::Ask, response.status().as_u16(), started);
    response
}

async fn relay(
    state: &AppState,
    request_id: &str,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, RelayError> {
    let credentials = require_credentials(&state.secrets)?;
    let body = read_body(body, &state.limits)?;
    let request = validate_ask(&body, &state.limits, state.limits.ask_max_k)?;

    tracing::debug!(
        request_id = %request_id,
        k = request.k,
        question_chars = request.question.chars().count(),
        "Relaying question"
    );

    let upstream = state
        .upstream
        .send(UpstreamCall {
            endpoint: Endpoint::Ask,
            request,
            credentials,
            cancel: CancellationToken::new(),
        })
        .await?;

    let status = upstream.status;
    let content_type = upstream.content_type.clone();
    let body = upstream.bytes().await?;

    tracing::info!(
        request_id = %request_id,
        status = %status,
        bytes = body.len(),
        "Relayed answer"
    );

    Ok(passthrough(status, content_type, "application/json", body))
}
