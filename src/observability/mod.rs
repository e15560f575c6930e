//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Relay handlers produce:
//!     → logging.rs (structured log events, request_id on every line)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Secrets are logged as presence booleans only
//! - Metrics are off by default

pub mod logging;
pub mod metrics;
