//! Outbound calls to the RAG service.
//!
//! # Data Flow
//! ```text
//! relay handler
//!     → UpstreamCall (endpoint, validated question, credentials, cancel token)
//!     → Upstream::send (client.rs: reqwest)
//!     → UpstreamResponse (status, content type, lazy body stream)
//! ```
//!
//! The body is never read by the client itself; the caller decides whether
//! to buffer it or forward it chunk by chunk.

pub mod client;

use async_trait::async_trait;
use axum::http::{HeaderValue, StatusCode};
use bytes::{Bytes, BytesMut};
use futures_util::stream::{BoxStream, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::config::SecretString;
use crate::relay::AskRequest;

pub use client::RagClient;

/// Header carrying the upstream API key.
pub const X_API_KEY: &str = "x-api-key";
/// Header carrying the optional origin secret.
pub const X_ORIGIN_SECRET: &str = "x-origin-secret";

/// Lazily produced upstream body.
pub type ByteStream = BoxStream<'static, Result<Bytes, UpstreamError>>;

/// Errors talking to the RAG service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UpstreamError {
    #[error("failed to build upstream client: {0}")]
    Client(String),
    #[error("upstream transport failure: {0}")]
    Transport(String),
    #[error("upstream body read failed: {0}")]
    Body(String),
    #[error("upstream call cancelled")]
    Cancelled,
}

/// Which upstream endpoint a call targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// Buffered answer.
    Ask,
    /// SSE answer stream.
    Stream,
}

impl Endpoint {
    /// Stable label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::Ask => "ask",
            Endpoint::Stream => "ask_stream",
        }
    }
}

/// Authentication material attached to every upstream call.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub api_key: SecretString,
    pub origin_secret: Option<SecretString>,
}

/// One outbound request.
#[derive(Debug)]
pub struct UpstreamCall {
    pub endpoint: Endpoint,
    pub request: AskRequest,
    pub credentials: Credentials,
    /// Cancelled when the inbound caller goes away.
    pub cancel: CancellationToken,
}

/// Upstream reply with its body still unread.
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub content_type: Option<HeaderValue>,
    /// `None` when the upstream reply carries no readable body.
    pub body: Option<ByteStream>,
}

impl std::fmt::Debug for UpstreamResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamResponse")
            .field("status", &self.status)
            .field("content_type", &self.content_type)
            .field("has_body", &self.body.is_some())
            .finish()
    }
}

impl UpstreamResponse {
    /// Read the whole body. A missing body reads as empty.
    pub async fn bytes(self) -> Result<Bytes, UpstreamError> {
        collect(self.body).await
    }
}

/// Concatenate a body stream, failing on the first broken chunk.
pub async fn collect(body: Option<ByteStream>) -> Result<Bytes, UpstreamError> {
    let Some(mut body) = body else {
        return Ok(Bytes::new());
    };
    let mut buf = BytesMut::new();
    while let Some(chunk) = body.next().await {
        buf.extend_from_slice(&chunk?);
    }
    Ok(buf.freeze())
}

/// Best-effort text: whatever arrived before a failure, decoded lossily.
pub async fn collect_text_lossy(body: Option<ByteStream>) -> String {
    let Some(mut body) = body else {
        return String::new();
    };
    let mut buf = BytesMut::new();
    while let Some(Ok(chunk)) = body.next().await {
        buf.extend_from_slice(&chunk);
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// The RAG service as seen by the relay handlers.
#[async_trait]
pub trait Upstream: Send + Sync {
    /// Issue the call and return once response headers are available.
    async fn send(&self, call: UpstreamCall) -> Result<UpstreamResponse, UpstreamError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    fn body(items: Vec<Result<&'static str, UpstreamError>>) -> Option<ByteStream> {
        let chunks = items
            .into_iter()
            .map(|r| r.map(|s| Bytes::from_static(s.as_bytes())));
        Some(stream::iter(chunks).boxed())
    }

    #[tokio::test]
    async fn test_collect_concatenates_in_order() {
        let bytes = collect(body(vec![Ok("{\"ans"), Ok("wer\":1}")])).await.unwrap();
        assert_eq!(&bytes[..], b"{\"answer\":1}");
    }

    #[tokio::test]
    async fn test_collect_fails_on_broken_chunk() {
        let err = collect(body(vec![Ok("a"), Err(UpstreamError::Body("reset".into()))]))
            .await
            .unwrap_err();
        assert_eq!(err, UpstreamError::Body("reset".into()));
    }

    #[tokio::test]
    async fn test_lossy_text_keeps_prefix() {
        let text = collect_text_lossy(body(vec![
            Ok("rate "),
            Ok("limited"),
            Err(UpstreamError::Body("reset".into())),
            Ok("never read"),
        ]))
        .await;
        assert_eq!(text, "rate limited");
        assert_eq!(collect_text_lossy(None).await, "");
    }

    #[test]
    fn test_endpoint_labels() {
        assert_eq!(Endpoint::Ask.as_str(), "ask");
        assert_eq!(Endpoint::Stream.as_str(), "ask_stream");
    }
}
