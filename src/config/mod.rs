//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → RelayConfig (validated, immutable)
//!
//! environment
//!     → secrets.rs (API key, origin secret)
//!     → Secrets (immutable, injected into handlers)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Secret values live only in the environment, never in the file

pub mod loader;
pub mod schema;
pub mod secrets;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AskLimits, ListenerConfig, LogFormat, ObservabilityConfig, RelayConfig, SecretsConfig,
    UpstreamConfig,
};
pub use secrets::{SecretString, Secrets};
