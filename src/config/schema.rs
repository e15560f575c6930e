//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the ask relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Upstream RAG service location and transport settings.
    pub upstream: UpstreamConfig,

    /// Where the upstream secrets are read from.
    pub secrets: SecretsConfig,

    /// Input bounds enforced before any upstream call.
    pub limits: AskLimits,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Upstream RAG service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Scheme and authority of the RAG service.
    pub base_url: String,

    /// Path of the buffered answer endpoint.
    pub ask_path: String,

    /// Path of the SSE answer endpoint.
    pub stream_path: String,

    /// Connection establishment timeout in seconds.
    /// No total request timeout is applied; streams stay open while upstream produces.
    pub connect_timeout_secs: u64,

    /// User-Agent sent upstream.
    pub user_agent: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "https://rag.shauqtechnology.in".to_string(),
            ask_path: "/ask".to_string(),
            stream_path: "/ask/stream".to_string(),
            connect_timeout_secs: 10,
            user_agent: concat!("ask-relay/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Names of the environment variables holding upstream secrets.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecretsConfig {
    /// Required API key variable.
    pub api_key_env: String,

    /// Optional origin secret variable.
    pub origin_secret_env: String,
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self {
            api_key_env: "RAG_API_KEY".to_string(),
            origin_secret_env: "RAG_ORIGIN_SECRET".to_string(),
        }
    }
}

/// Bounds applied to inbound questions.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct AskLimits {
    /// Maximum question length, in characters, after trimming.
    pub max_question_chars: usize,

    /// `k` used when the caller omits it or sends a non-number.
    pub default_k: i64,

    /// Upper clamp for `k` on `/ask`.
    pub ask_max_k: i64,

    /// Upper clamp for `k` on `/ask/stream`.
    pub stream_max_k: i64,

    /// Maximum accepted request body in bytes.
    pub max_body_bytes: usize,
}

impl Default for AskLimits {
    fn default() -> Self {
        Self {
            max_question_chars: 1500,
            default_k: 6,
            ask_max_k: 12,
            stream_max_k: 10,
            max_body_bytes: 64 * 1024,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Human-readable or JSON log lines.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
