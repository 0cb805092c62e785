//! Resolver settings.
//!
//! Settings are layered: `.envsecrets.toml` first, then `ENVSECRETS_*`
//! environment variables, then explicit overrides (CLI flags). Values are
//! taken verbatim; environment names are never trimmed or case-folded.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::core::constants::{self, env};
use crate::error::{ConfigError, Result};

/// Options forwarded to the caching client.
///
/// The resolver never interprets these; only [`SecretCache`](crate::core::cache::SecretCache) does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of secret blobs held at once.
    pub max_cache_size: usize,
    /// How long a fetched blob is served before it is refetched.
    pub refresh_interval: Duration,
    /// Version label requested from the store.
    pub version_stage: String,
    /// Backoff after the first failed fetch.
    pub retry_delay_base: Duration,
    /// Backoff multiplier per consecutive failure.
    pub retry_growth_factor: u32,
    /// Backoff ceiling.
    pub retry_delay_max: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_cache_size: constants::DEFAULT_MAX_CACHE_SIZE,
            refresh_interval: constants::DEFAULT_REFRESH_INTERVAL,
            version_stage: constants::DEFAULT_VERSION_STAGE.to_string(),
            retry_delay_base: constants::DEFAULT_RETRY_DELAY_BASE,
            retry_growth_factor: constants::DEFAULT_RETRY_GROWTH_FACTOR,
            retry_delay_max: constants::DEFAULT_RETRY_DELAY_MAX,
        }
    }
}

impl CacheConfig {
    pub fn with_max_cache_size(mut self, size: usize) -> Self {
        self.max_cache_size = size;
        self
    }

    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    pub fn with_version_stage(mut self, stage: impl Into<String>) -> Self {
        self.version_stage = stage.into();
        self
    }

    pub fn with_retry_delay_base(mut self, delay: Duration) -> Self {
        self.retry_delay_base = delay;
        self
    }

    pub fn with_retry_growth_factor(mut self, factor: u32) -> Self {
        self.retry_growth_factor = factor;
        self
    }

    pub fn with_retry_delay_max(mut self, delay: Duration) -> Self {
        self.retry_delay_max = delay;
        self
    }

    /// Check the options are usable by the cache.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for a zero cache size, a zero
    /// growth factor or an empty version stage.
    pub fn validate(&self) -> Result<()> {
        if self.max_cache_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_cache_size",
                reason: "must be at least 1".to_string(),
            }
            .into());
        }
        if self.retry_growth_factor == 0 {
            return Err(ConfigError::InvalidValue {
                field: "retry_growth_factor",
                reason: "must be at least 1".to_string(),
            }
            .into());
        }
        if self.version_stage.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "version_stage",
                reason: "cannot be empty".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

/// Resolver construction inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Active runtime environment (e.g. "dev", "staging", "prod").
    pub environment: String,
    /// Environment that selects local resolution.
    pub local_environment: String,
    /// Identifier of the remote JSON secret blob.
    pub secret_id: Option<String>,
    /// Caching client options; store defaults when `None`.
    pub cache: Option<CacheConfig>,
}

impl Settings {
    /// Settings for `environment` with every other input at its default.
    pub fn new(environment: impl Into<String>) -> Self {
        Self {
            environment: environment.into(),
            local_environment: constants::DEFAULT_LOCAL_ENV.to_string(),
            secret_id: None,
            cache: None,
        }
    }

    pub fn with_local_environment(mut self, local: impl Into<String>) -> Self {
        self.local_environment = local.into();
        self
    }

    pub fn with_secret_id(mut self, secret_id: impl Into<String>) -> Self {
        self.secret_id = Some(secret_id.into());
        self
    }

    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Whether these settings select local resolution.
    ///
    /// Exact string comparison: case-sensitive, no trimming.
    pub fn is_local(&self) -> bool {
        self.environment == self.local_environment
    }

    /// Load settings from the config file, environment and overrides.
    ///
    /// When `path` is `None`, `.envsecrets.toml` in the current directory is
    /// read if it exists. An explicit path must exist.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read or parsed, an override
    /// is not a valid number, or no environment is configured.
    pub fn load(path: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        let file = match path {
            Some(p) => FileConfig::read(p)?,
            None => {
                let default = PathBuf::from(constants::CONFIG_FILE);
                if default.exists() {
                    FileConfig::read(&default)?
                } else {
                    debug!("no config file, using environment only");
                    FileConfig::default()
                }
            }
        };

        Self::layer(file, |name| std::env::var(name).ok(), overrides)
    }

    /// Merge the three layers. `lookup` stands in for the process environment.
    fn layer<F>(file: FileConfig, lookup: F, overrides: &Overrides) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let FileConfig { resolver, cache } = file;

        // An empty value at one layer falls through to the next
        let environment = non_empty(overrides.environment.clone())
            .or_else(|| non_empty(lookup(env::ENVIRONMENT)))
            .or_else(|| non_empty(resolver.environment))
            .ok_or(ConfigError::MissingEnvironment)?;

        let local_environment = non_empty(overrides.local_environment.clone())
            .or_else(|| non_empty(lookup(env::LOCAL_ENV)))
            .or_else(|| non_empty(resolver.local_environment))
            .unwrap_or_else(|| constants::DEFAULT_LOCAL_ENV.to_string());

        let secret_id = non_empty(overrides.secret_id.clone())
            .or_else(|| non_empty(lookup(env::SECRET_ID)))
            .or_else(|| non_empty(resolver.secret_id));

        let cache = cache.layer(&lookup)?;

        debug!(
            environment = %environment,
            local_environment = %local_environment,
            has_secret_id = secret_id.is_some(),
            custom_cache = cache.is_some(),
            "settings loaded"
        );

        Ok(Self {
            environment,
            local_environment,
            secret_id,
            cache,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Explicit values that take precedence over file and environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub environment: Option<String>,
    pub local_environment: Option<String>,
    pub secret_id: Option<String>,
}

/// On-disk layout of `.envsecrets.toml`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    #[serde(default)]
    resolver: ResolverSection,
    #[serde(default)]
    cache: CacheSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ResolverSection {
    environment: Option<String>,
    local_environment: Option<String>,
    secret_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct CacheSection {
    max_cache_size: Option<usize>,
    refresh_interval_secs: Option<u64>,
    version_stage: Option<String>,
    retry_delay_base_secs: Option<u64>,
    retry_growth_factor: Option<u32>,
    retry_delay_max_secs: Option<u64>,
}

impl FileConfig {
    fn read(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "loading config");
        let contents = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse(&contents)
    }

    fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents).map_err(ConfigError::Parse)?)
    }
}

impl CacheSection {
    /// Apply environment overrides. Yields `None` when nothing customizes the cache.
    fn layer<F>(mut self, lookup: &F) -> Result<Option<CacheConfig>>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(env::MAX_CACHE_SIZE) {
            self.max_cache_size = Some(parse_number(env::MAX_CACHE_SIZE, &raw)?);
        }
        if let Some(raw) = lookup(env::REFRESH_SECS) {
            self.refresh_interval_secs = Some(parse_number(env::REFRESH_SECS, &raw)?);
        }
        if let Some(stage) = lookup(env::VERSION_STAGE) {
            self.version_stage = Some(stage);
        }

        let customized = self.max_cache_size.is_some()
            || self.refresh_interval_secs.is_some()
            || self.version_stage.is_some()
            || self.retry_delay_base_secs.is_some()
            || self.retry_growth_factor.is_some()
            || self.retry_delay_max_secs.is_some();
        if !customized {
            return Ok(None);
        }

        let mut config = CacheConfig::default();
        if let Some(size) = self.max_cache_size {
            config.max_cache_size = size;
        }
        if let Some(secs) = self.refresh_interval_secs {
            config.refresh_interval = Duration::from_secs(secs);
        }
        if let Some(stage) = self.version_stage {
            config.version_stage = stage;
        }
        if let Some(secs) = self.retry_delay_base_secs {
            config.retry_delay_base = Duration::from_secs(secs);
        }
        if let Some(factor) = self.retry_growth_factor {
            config.retry_growth_factor = factor;
        }
        if let Some(secs) = self.retry_delay_max_secs {
            config.retry_delay_max = Duration::from_secs(secs);
        }

        config.validate()?;
        Ok(Some(config))
    }
}

fn parse_number<T: std::str::FromStr>(field: &'static str, raw: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    raw.parse::<T>().map_err(|e| {
        ConfigError::InvalidValue {
            field,
            reason: format!("'{}': {}", raw, e),
        }
        .into()
    })
}
