//! Upstream credentials.
//!
//! Secrets are read once at startup and handed to the HTTP layer as an
//! immutable value. Their values never appear in `Debug` output or logs.

use std::fmt;

use crate::config::schema::SecretsConfig;

/// A string that is redacted when formatted.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretString(String);

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Access the raw value. Only the upstream client should call this.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretString(<redacted>)")
    }
}

/// Credentials for the RAG service.
#[derive(Debug, Clone)]
pub struct Secrets {
    /// Name of the variable the API key comes from; used in error messages.
    api_key_name: String,
    api_key: Option<SecretString>,
    origin_secret: Option<SecretString>,
}

impl Secrets {
    pub fn new(
        api_key_name: impl Into<String>,
        api_key: Option<&str>,
        origin_secret: Option<&str>,
    ) -> Self {
        Self {
            api_key_name: api_key_name.into(),
            api_key: non_empty(api_key),
            origin_secret: non_empty(origin_secret),
        }
    }

    /// Read both secrets from the environment variables named in `config`.
    pub fn from_env(config: &SecretsConfig) -> Self {
        let api_key = std::env::var(&config.api_key_env).ok();
        let origin_secret = std::env::var(&config.origin_secret_env).ok();
        Self::new(
            config.api_key_env.clone(),
            api_key.as_deref(),
            origin_secret.as_deref(),
        )
    }

    pub fn api_key_name(&self) -> &str {
        &self.api_key_name
    }

    pub fn api_key(&self) -> Option<&SecretString> {
        self.api_key.as_ref()
    }

    pub fn origin_secret(&self) -> Option<&SecretString> {
        self.origin_secret.as_ref()
    }
}

fn non_empty(value: Option<&str>) -> Option<SecretString> {
    value.filter(|v| !v.is_empty()).map(SecretString::new)
}
