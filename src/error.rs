//! Error types for envsecrets.
//!
//! Each failure the resolver can surface has its own variant so callers can
//! match on the cause without parsing messages.

use thiserror::Error;

/// Top-level error.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid construction arguments or configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The requested key is absent from the chosen source.
    #[error("secret {key} not found in {location}")]
    MissingSecret { key: String, location: String },

    /// The remote store or caching client failed to produce the blob.
    #[error(transparent)]
    StoreUnavailable(#[from] StoreError),

    /// The retrieved payload is not a flat string-to-string JSON object.
    #[error("malformed secret {secret_id}: {reason}")]
    MalformedSecret { secret_id: String, reason: String },

    #[error("{failed} of {total} secrets could not be resolved")]
    CheckFailed { failed: usize, total: usize },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration errors, raised eagerly when a resolver is built.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("environment name is required")]
    MissingEnvironment,

    #[error(
        "secret id is required when environment '{environment}' is not the local environment '{local}'"
    )]
    MissingSecretId { environment: String, local: String },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("{0} support not compiled. Rebuild with: cargo install envsecrets --features {0}")]
    BackendNotCompiled(&'static str),

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Failures reported by a secret store or caching client.
///
/// Cloneable so the cache can replay a recorded failure during backoff.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("secret store unavailable for {secret_id}: {reason}")]
    Unavailable { secret_id: String, reason: String },

    #[error("secret {secret_id} has no payload")]
    EmptyPayload { secret_id: String },

    #[error("secret store client setup failed: {0}")]
    Client(String),
}

impl StoreError {
    /// Shorthand for an `Unavailable` error.
    pub fn unavailable(secret_id: &str, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            secret_id: secret_id.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
