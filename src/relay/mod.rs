//! Question relay subsystem.
//!
//! # Data Flow
//! ```text
//! POST /ask, /ask/stream
//!     → credentials check (fail closed on missing API key)
//!     → validator.rs (question + k bounds)
//!     → upstream (RAG service)
//!     → ask.rs: buffer body, mirror status/content type
//!     → stream.rs: forward chunks live, cancel upstream on disconnect
//! ```
//!
//! Every failure is converted to one of the fixed JSON shapes in error.rs.

pub mod ask;
pub mod error;
pub mod stream;
pub mod validator;

pub use ask::ask;
pub use error::RelayError;
pub use stream::{ask_stream, CancelOnDrop};
pub use validator::{validate_ask, AskRequest, ValidationError, ValidationKind};

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::http::StatusCode;

use crate::config::{AskLimits, Secrets};
use crate::upstream::Credentials;

/// The buffered request body, or the validation error for an unreadable one.
///
/// A body over `limits.max_body_bytes` is an over-length question.
pub(crate) fn read_body(
    body: Result<Bytes, BytesRejection>,
    limits: &AskLimits,
) -> Result<Bytes, ValidationError> {
    body.map_err(|rejection| match rejection.status() {
        StatusCode::PAYLOAD_TOO_LARGE => ValidationError::BodyTooLarge {
            max: limits.max_body_bytes,
        },
        _ => ValidationError::MalformedBody,
    })
}

/// Credentials for the upstream call, or the configuration error to return.
pub(crate) fn require_credentials(secrets: &Secrets) -> Result<Credentials, RelayError> {
    match secrets.api_key() {
        Some(api_key) => Ok(Credentials {
            api_key: api_key.clone(),
            origin_secret: secrets.origin_secret().cloned(),
        }),
        None => Err(RelayError::Misconfigured {
            key_name: secrets.api_key_name().to_string(),
        }),
    }
}
