//! Environment-aware secret resolution.
//!
//! A [`Resolver`] picks its source once, when it is built:
//!
//! - **Local**: the active environment equals the local environment name
//!   (`"dev"` by default). Keys are read straight from process environment
//!   variables.
//! - **Remote**: any other environment. Keys are looked up in a JSON secret
//!   blob fetched through a caching client.
//!
//! The comparison is exact string equality: `"DEV"` is not `"dev"`.
//!
//! ```ignore
//! let resolver = Resolver::new(Settings::new("prod").with_secret_id("my-app/prod"))?;
//! let url = resolver.resolve("DATABASE_URL")?;
//! ```

use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, trace};

use crate::core::cache::SecretCache;
use crate::core::config::Settings;
use crate::core::source::{self, SecretFetcher, SecretSource};
use crate::error::{ConfigError, Error, Result};

/// Resolves configuration keys from the source chosen at construction.
///
/// `Send + Sync`: `resolve` only reads immutable state, and the caching
/// client synchronizes itself.
pub struct Resolver {
    environment: String,
    local_environment: String,
    mode: Mode,
}

/// Source selection, fixed for the resolver's lifetime.
enum Mode {
    Local,
    Remote {
        secret_id: String,
        cache: Box<dyn SecretSource>,
    },
}

impl Resolver {
    /// Build a resolver using the default remote store in remote mode.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the environment is empty, the secret id is
    /// missing in remote mode, or no remote backend is compiled in.
    pub fn new(settings: Settings) -> Result<Self> {
        Self::with_fetcher(settings, source::default_fetcher)
    }

    /// Build a resolver whose remote mode caches blobs from `make_fetcher`.
    ///
    /// `make_fetcher` runs once, and only in remote mode.
    ///
    /// # Errors
    ///
    /// As [`Resolver::new`], plus whatever `make_fetcher` returns.
    pub fn with_fetcher<F, M>(settings: Settings, make_fetcher: M) -> Result<Self>
    where
        F: SecretFetcher + 'static,
        M: FnOnce() -> Result<F>,
    {
        let cache_config = settings.cache.clone().unwrap_or_default();
        Self::with_source(settings, move || {
            cache_config.validate()?;
            Ok(SecretCache::new(make_fetcher()?, cache_config))
        })
    }

    /// Build a resolver that uses the caching client from `make_source` as-is.
    ///
    /// `make_source` runs once, and only in remote mode. The client's own
    /// options are its business; `settings.cache` is ignored.
    ///
    /// # Errors
    ///
    /// As [`Resolver::new`], plus whatever `make_source` returns.
    pub fn with_source<S, M>(settings: Settings, make_source: M) -> Result<Self>
    where
        S: SecretSource + 'static,
        M: FnOnce() -> Result<S>,
    {
        let Settings {
            environment,
            local_environment,
            secret_id,
            ..
        } = settings;

        if environment.is_empty() {
            return Err(ConfigError::MissingEnvironment.into());
        }

        let mode = if environment == local_environment {
            Mode::Local
        } else {
            let secret_id = secret_id
                .filter(|id| !id.is_empty())
                .ok_or_else(|| ConfigError::MissingSecretId {
                    environment: environment.clone(),
                    local: local_environment.clone(),
                })?;
            Mode::Remote {
                secret_id,
                cache: Box::new(make_source()?),
            }
        };

        debug!(
            environment = %environment,
            local_environment = %local_environment,
            mode = mode.name(),
            "resolver ready"
        );

        Ok(Self {
            environment,
            local_environment,
            mode,
        })
    }

    /// Resolve `key` to its value.
    ///
    /// # Errors
    ///
    /// - `Error::MissingSecret` if `key` is not set in the chosen source
    /// - `Error::StoreUnavailable` if the caching client fails (not retried)
    /// - `Error::MalformedSecret` if the blob is not a flat string map, or a
    ///   local variable is not valid unicode
    pub fn resolve(&self, key: &str) -> Result<String> {
        match &self.mode {
            Mode::Local => {
                trace!(key, "resolving from environment");
                std::env::var(key).map_err(|e| match e {
                    std::env::VarError::NotPresent => Error::MissingSecret {
                        key: key.to_string(),
                        location: format!("environment variables ({})", self.environment),
                    },
                    std::env::VarError::NotUnicode(_) => Error::MalformedSecret {
                        secret_id: key.to_string(),
                        reason: "environment variable is not valid unicode".to_string(),
                    },
                })
            }
            Mode::Remote { secret_id, cache } => {
                trace!(key, secret_id = %secret_id, "resolving from secret store");
                let raw = cache.get_secret_string(secret_id)?;
                let mut entries = parse_blob(secret_id, &raw)?;
                entries.remove(key).ok_or_else(|| Error::MissingSecret {
                    key: key.to_string(),
                    location: format!("secret {}", secret_id),
                })
            }
        }
    }

    /// Whether keys are read from process environment variables.
    pub fn is_local(&self) -> bool {
        matches!(self.mode, Mode::Local)
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn local_environment(&self) -> &str {
        &self.local_environment
    }

    /// Remote secret id; `None` in local mode.
    pub fn secret_id(&self) -> Option<&str> {
        match &self.mode {
            Mode::Local => None,
            Mode::Remote { secret_id, .. } => Some(secret_id.as_str()),
        }
    }

    /// Mode name for display ("local" or "remote").
    pub fn mode(&self) -> &'static str {
        self.mode.name()
    }
}

impl Mode {
    fn name(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Remote { .. } => "remote",
        }
    }
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("environment", &self.environment)
            .field("local_environment", &self.local_environment)
            .field("mode", &self.mode.name())
            .field("secret_id", &self.secret_id())
            .finish()
    }
}

/// Parse a secret blob as a flat JSON object of strings.
fn parse_blob(secret_id: &str, raw: &str) -> Result<BTreeMap<String, String>> {
    serde_json::from_str(raw).map_err(|e| Error::MalformedSecret {
        secret_id: secret_id.to_string(),
        reason: e.to_string(),
    })
}
