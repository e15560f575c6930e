//! Inbound question validation.
//!
//! Pure function of the raw request body: no I/O, no shared state. Both
//! endpoints use the same rules and differ only in the upper bound for `k`.

use serde::Serialize;
use serde_json::Value;

use crate::config::AskLimits;

/// A validated question, ready to forward upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AskRequest {
    /// Trimmed, non-empty, within the length limit.
    pub question: String,
    /// Result-count hint, already clamped.
    pub k: i64,
}

/// Why a body was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationKind {
    /// Parsed fine, but a field is missing or out of bounds.
    InvalidInput,
    /// Body absent or not JSON.
    MalformedBody,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("request body is not valid JSON")]
    MalformedBody,
    #[error("request body exceeds {max} bytes")]
    BodyTooLarge { max: usize },
    #[error("question is missing or not a string")]
    MissingQuestion,
    #[error("question is empty")]
    EmptyQuestion,
    #[error("question too long ({len} chars, max {max})")]
    QuestionTooLong { len: usize, max: usize },
}

impl ValidationError {
    pub fn kind(&self) -> ValidationKind {
        match self {
            ValidationError::MalformedBody => ValidationKind::MalformedBody,
            _ => ValidationKind::InvalidInput,
        }
    }
}

/// Validate a raw `{ "question": string, "k"?: number }` body.
///
/// A body that fails to parse is treated as `{}`, so it is rejected for the
/// missing question rather than for its syntax; [`ValidationError::kind`]
/// still reports it as malformed.
pub fn validate_ask(body: &[u8], limits: &AskLimits, max_k: i64) -> Result<AskRequest, ValidationError> {
    let parsed = serde_json::from_slice::<Value>(body).ok();
    let fields = parsed.as_ref().and_then(Value::as_object);

    let question = match fields.and_then(|f| f.get("question")) {
        Some(Value::String(q)) => trim_question(q),
        _ if parsed.is_none() => return Err(ValidationError::MalformedBody),
        _ => return Err(ValidationError::MissingQuestion),
    };
    if question.is_empty() {
        return Err(ValidationError::EmptyQuestion);
    }
    let len = question.chars().count();
    if len > limits.max_question_chars {
        return Err(ValidationError::QuestionTooLong {
            len,
            max: limits.max_question_chars,
        });
    }

    let k = fields
        .and_then(|f| f.get("k"))
        .and_then(Value::as_f64)
        .filter(|k| k.is_finite());

    Ok(AskRequest {
        question: question.to_string(),
        k: clamp_k(k, limits.default_k, max_k),
    })
}

/// Whitespace and byte-order marks are both stripped from either end.
fn trim_question(q: &str) -> &str {
    q.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}')
}

/// Floor and clamp `k` into `[1, max_k]`, substituting `default` when absent.
pub fn clamp_k(k: Option<f64>, default: i64, max_k: i64) -> i64 {
    let k = k.unwrap_or(default as f64).floor();
    k.min(max_k as f64).max(1.0) as i64
}
