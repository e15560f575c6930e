//! Ask relay library.
//!
//! Proxies portfolio chat questions to an external RAG service, either as a
//! single buffered answer (`POST /ask`) or as a live SSE stream
//! (`POST /ask/stream`).

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod relay;
pub mod upstream;

pub use config::RelayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
