//! Handler-boundary errors and their fixed client-facing shapes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::http::response::json_error;
use crate::relay::validator::ValidationError;
use crate::upstream::{Endpoint, UpstreamError};

pub const INVALID_QUESTION: &str = "Invalid question";
pub const UPSTREAM_ERROR: &str = "Upstream error";

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Required secret absent; every call fails closed.
    #[error("server misconfigured: missing {key_name}")]
    Misconfigured { key_name: String },
    #[error("invalid question: {0}")]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::Misconfigured { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            RelayError::Validation(_) => StatusCode::BAD_REQUEST,
            RelayError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Message returned to the caller. Internal detail stays in the logs.
    pub fn public_message(&self) -> String {
        match self {
            RelayError::Misconfigured { key_name } => {
                format!("Server misconfigured: missing {}", key_name)
            }
            RelayError::Validation(_) => INVALID_QUESTION.to_string(),
            RelayError::Upstream(_) => UPSTREAM_ERROR.to_string(),
        }
    }

    pub fn log(&self, request_id: &str, endpoint: Endpoint) {
        match self {
            RelayError::Misconfigured { key_name } => tracing::error!(
                request_id = %request_id,
                endpoint = endpoint.as_str(),
                key = %key_name,
                present = false,
                "Refusing request: required secret not configured"
            ),
            RelayError::Validation(e) => tracing::info!(
                request_id = %request_id,
                endpoint = endpoint.as_str(),
                kind = ?e.kind(),
                reason = %e,
                "Rejected question"
            ),
            RelayError::Upstream(e) => tracing::error!(
                request_id = %request_id,
                endpoint = endpoint.as_str(),
                error = %e,
                "Upstream error"
            ),
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        json_error(self.status(), &self.public_message())
    }
}
