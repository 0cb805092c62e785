//! Constants used throughout envsecrets.
//!
//! Centralizes defaults and environment variable names.

use std::time::Duration;

/// Configuration file name (.envsecrets.toml).
pub const CONFIG_FILE: &str = ".envsecrets.toml";

/// Environment that selects local resolution unless overridden.
pub const DEFAULT_LOCAL_ENV: &str = "dev";

/// Version label requested from the remote store.
pub const DEFAULT_VERSION_STAGE: &str = "AWSCURRENT";

/// Maximum number of secret blobs held by the cache.
pub const DEFAULT_MAX_CACHE_SIZE: usize = 1024;

/// How long a fetched blob is served before being refetched.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(3600);

/// First backoff delay after a failed fetch.
pub const DEFAULT_RETRY_DELAY_BASE: Duration = Duration::from_secs(1);

/// Multiplier applied to the backoff delay per consecutive failure.
pub const DEFAULT_RETRY_GROWTH_FACTOR: u32 = 2;

/// Upper bound on the backoff delay.
pub const DEFAULT_RETRY_DELAY_MAX: Duration = Duration::from_secs(3600);

/// Environment variable overrides for [`Settings`](crate::core::config::Settings).
pub mod env {
    pub const ENVIRONMENT: &str = "ENVSECRETS_ENV";
    pub const LOCAL_ENV: &str = "ENVSECRETS_LOCAL_ENV";
    pub const SECRET_ID: &str = "ENVSECRETS_SECRET_ID";
    pub const REFRESH_SECS: &str = "ENVSECRETS_REFRESH_SECS";
    pub const MAX_CACHE_SIZE: &str = "ENVSECRETS_MAX_CACHE_SIZE";
    pub const VERSION_STAGE: &str = "ENVSECRETS_VERSION_STAGE";

    /// Region override for the AWS fetcher.
    pub const AWS_REGION: &str = "ENVSECRETS_AWS_REGION";
    /// Endpoint override for the AWS fetcher (e.g. localstack).
    pub const AWS_ENDPOINT: &str = "ENVSECRETS_AWS_ENDPOINT";

    /// Log filter read by the binary.
    pub const LOG: &str = "ENVSECRETS_LOG";
}
