//! reqwest-backed RAG client.

use std::time::Duration;

use async_trait::async_trait;
use axum::http::{header, StatusCode};
use futures_util::{StreamExt, TryStreamExt};
use url::Url;

use crate::config::UpstreamConfig;
use crate::upstream::{
    Endpoint, Upstream, UpstreamCall, UpstreamError, UpstreamResponse, X_API_KEY, X_ORIGIN_SECRET,
};

/// HTTP client for the RAG service's `/ask` and `/ask/stream` endpoints.
#[derive(Debug, Clone)]
pub struct RagClient {
    http: reqwest::Client,
    ask_url: Url,
    stream_url: Url,
}

impl RagClient {
    /// Build a client from validated upstream settings.
    pub fn new(config: &UpstreamConfig) -> Result<Self, UpstreamError> {
        let base = Url::parse(&config.base_url)
            .map_err(|e| UpstreamError::Client(format!("invalid base_url: {}", e)))?;
        let ask_url = base
            .join(&config.ask_path)
            .map_err(|e| UpstreamError::Client(format!("invalid ask_path: {}", e)))?;
        let stream_url = base
            .join(&config.stream_path)
            .map_err(|e| UpstreamError::Client(format!("invalid stream_path: {}", e)))?;

        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| UpstreamError::Client(e.to_string()))?;

        Ok(Self {
            http,
            ask_url,
            stream_url,
        })
    }

    pub fn url_for(&self, endpoint: Endpoint) -> &Url {
        match endpoint {
            Endpoint::Ask => &self.ask_url,
            Endpoint::Stream => &self.stream_url,
        }
    }
}

#[async_trait]
impl Upstream for RagClient {
    async fn send(&self, call: UpstreamCall) -> Result<UpstreamResponse, UpstreamError> {
        let UpstreamCall {
            endpoint,
            request,
            credentials,
            cancel,
        } = call;

        let mut builder = self
            .http
            .post(self.url_for(endpoint).clone())
            .header(header::CACHE_CONTROL, "no-store")
            .header(X_API_KEY, credentials.api_key.expose())
            .json(&request);
        if let Some(origin) = &credentials.origin_secret {
            builder = builder.header(X_ORIGIN_SECRET, origin.expose());
        }

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(UpstreamError::Cancelled),
            sent = builder.send() => sent.map_err(|e| UpstreamError::Transport(e.to_string()))?,
        };

        let status = response.status();
        let content_type = response.headers().get(header::CONTENT_TYPE).cloned();

        tracing::debug!(
            endpoint = endpoint.as_str(),
            status = %status,
            "Upstream responded"
        );

        let body = if status == StatusCode::NO_CONTENT || status == StatusCode::NOT_MODIFIED {
            None
        } else {
            // Ending the stream on cancellation drops the reqwest body, which
            // releases the upstream connection.
            Some(
                response
                    .bytes_stream()
                    .map_err(|e| UpstreamError::Body(e.to_string()))
                    .take_until(cancel.cancelled_owned())
                    .boxed(),
            )
        };

        Ok(UpstreamResponse {
            status,
            content_type,
            body,
        })
    }
}
