//! Remote secret store abstractions.
//!
//! Two seams sit between the resolver and the network:
//!
//! - [`SecretSource`]: the caching client the resolver talks to. It hands back
//!   the raw JSON text of a secret blob and owns caching, refresh and backoff.
//! - [`SecretFetcher`]: raw, uncached access to a store. [`SecretCache`]
//!   turns any fetcher into a source.
//!
//! ## Backends
//!
//! - **AWS Secrets Manager**: Feature-gated (`aws`).
//!
//! ## Adding a New Backend
//!
//! 1. Implement the `SecretFetcher` trait
//! 2. Add the implementation in a new file (e.g., `gcp.rs`, `vault.rs`)
//! 3. Feature-gate if appropriate
//! 4. Wire it into `default_fetcher`
//!
//! [`SecretCache`]: crate::core::cache::SecretCache

use std::sync::Arc;

use crate::error::StoreError;

#[cfg(feature = "aws")]
pub mod aws;

/// Caching client capability.
///
/// Implementations synchronize their own mutable state; the resolver calls
/// this from many threads without locking.
pub trait SecretSource: Send + Sync {
    /// Return the raw secret string stored under `secret_id`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the blob cannot be produced. Callers do not retry.
    fn get_secret_string(&self, secret_id: &str) -> Result<String, StoreError>;
}

/// Raw remote store access, without caching.
pub trait SecretFetcher: Send + Sync {
    /// Fetch the current value of `secret_id` at `version_stage`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on any transport, auth or lookup failure.
    fn fetch(&self, secret_id: &str, version_stage: &str) -> Result<String, StoreError>;

    /// Backend name for logs and status output.
    fn name(&self) -> &'static str;
}

impl<T: SecretSource + ?Sized> SecretSource for Arc<T> {
    fn get_secret_string(&self, secret_id: &str) -> Result<String, StoreError> {
        (**self).get_secret_string(secret_id)
    }
}

impl<T: SecretSource + ?Sized> SecretSource for Box<T> {
    fn get_secret_string(&self, secret_id: &str) -> Result<String, StoreError> {
        (**self).get_secret_string(secret_id)
    }
}

impl<T: SecretFetcher + ?Sized> SecretFetcher for Arc<T> {
    fn fetch(&self, secret_id: &str, version_stage: &str) -> Result<String, StoreError> {
        (**self).fetch(secret_id, version_stage)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

impl<T: SecretFetcher + ?Sized> SecretFetcher for Box<T> {
    fn fetch(&self, secret_id: &str, version_stage: &str) -> Result<String, StoreError> {
        (**self).fetch(secret_id, version_stage)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Build the fetcher used when none is injected.
///
/// # Errors
///
/// Returns `StoreError::Client` if the backend cannot be set up, or
/// `ConfigError::BackendNotCompiled` when no backend feature is enabled.
pub fn default_fetcher() -> crate::error::Result<Box<dyn SecretFetcher>> {
    #[cfg(feature = "aws")]
    {
        return Ok(Box::new(aws::AwsSecretsManager::from_env()?));
    }

    #[cfg(not(feature = "aws"))]
    {
        return Err(crate::error::ConfigError::BackendNotCompiled("aws").into());
    }
}
