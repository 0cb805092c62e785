//! In-process caching client.
//!
//! Wraps a [`SecretFetcher`] and serves each secret blob from memory for
//! `refresh_interval`, refetching after that. Failed fetches are remembered
//! and replayed until a backoff deadline passes so a struggling store is not
//! hammered. At most `max_cache_size` blobs are held, least recently used
//! first out.
//!
//! Each secret id gets its own slot lock: concurrent misses for one id
//! trigger a single fetch, while different ids fetch independently. The slot
//! map only holds `max_cache_size` ids, so an id evicted while its fetch is
//! still running gets a fresh slot and the next caller fetches it again.

use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};
use zeroize::Zeroizing;

use crate::core::config::CacheConfig;
use crate::core::source::{SecretFetcher, SecretSource};
use crate::error::StoreError;

/// Caching client over a raw fetcher.
pub struct SecretCache<F> {
    fetcher: F,
    config: CacheConfig,
    slots: Mutex<LruCache<String, Arc<Mutex<Slot>>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

/// Lookup statistics, see [`SecretCache::cache_info`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheInfo {
    /// Lookups answered from a fresh cached value.
    pub hits: u64,
    /// Lookups that fetched, or replayed a failure during backoff.
    pub misses: u64,
    /// Secret ids currently held.
    pub currsize: usize,
}

#[derive(Default)]
struct Slot {
    value: Option<Cached>,
    failure: Option<Failure>,
}

struct Cached {
    text: Zeroizing<String>,
    fetched_at: Instant,
}

struct Failure {
    error: StoreError,
    attempts: u32,
    failed_at: Instant,
    delay: Duration,
}

impl<F: SecretFetcher> SecretCache<F> {
    /// Create a cache in front of `fetcher`.
    pub fn new(fetcher: F, config: CacheConfig) -> Self {
        let capacity = NonZeroUsize::new(config.max_cache_size).unwrap_or(NonZeroUsize::MIN);
        debug!(
            backend = fetcher.name(),
            capacity = capacity.get(),
            refresh_secs = config.refresh_interval.as_secs(),
            version_stage = %config.version_stage,
            "created secret cache"
        );
        Self {
            fetcher,
            config,
            slots: Mutex::new(LruCache::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn cache_info(&self) -> CacheInfo {
        CacheInfo {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            currsize: self.len(),
        }
    }

    /// Drop every cached value and recorded failure, and reset the statistics.
    pub fn cache_clear(&self) {
        self.slots.lock().clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        debug!("secret cache cleared");
    }

    /// Number of secret ids currently held.
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop any cached value or recorded failure for `secret_id` and fetch it again.
    ///
    /// # Errors
    ///
    /// Returns the fetcher's `StoreError` if the refetch fails.
    pub fn refresh_now(&self, secret_id: &str) -> Result<String, StoreError> {
        let slot = self.slot(secret_id);
        let mut slot = slot.lock();
        slot.value = None;
        slot.failure = None;
        self.fill(secret_id, &mut slot, Instant::now())
    }

    #[cfg(test)]
    pub(crate) fn get_at(&self, secret_id: &str, now: Instant) -> Result<String, StoreError> {
        self.get_with_now(secret_id, now)
    }

    fn get_with_now(&self, secret_id: &str, now: Instant) -> Result<String, StoreError> {
        let slot = self.slot(secret_id);
        let mut slot = slot.lock();

        if let Some(cached) = &slot.value {
            if now.saturating_duration_since(cached.fetched_at) < self.config.refresh_interval {
                trace!(secret_id, "secret cache hit");
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(cached.text.to_string());
            }
            debug!(secret_id, "cached secret expired");
        }

        if let Some(failure) = &slot.failure {
            if now.saturating_duration_since(failure.failed_at) < failure.delay {
                trace!(
                    secret_id,
                    attempts = failure.attempts,
                    "replaying failure during backoff"
                );
                self.misses.fetch_add(1, Ordering::Relaxed);
                return Err(failure.error.clone());
            }
        }

        self.fill(secret_id, &mut slot, now)
    }

    /// Fetch into `slot`, recording the outcome.
    fn fill(&self, secret_id: &str, slot: &mut Slot, now: Instant) -> Result<String, StoreError> {
        debug!(secret_id, backend = self.fetcher.name(), "fetching secret");
        self.misses.fetch_add(1, Ordering::Relaxed);

        match self.fetcher.fetch(secret_id, &self.config.version_stage) {
            Ok(text) => {
                slot.value = Some(Cached {
                    text: Zeroizing::new(text.clone()),
                    fetched_at: now,
                });
                slot.failure = None;
                Ok(text)
            }
            Err(error) => {
                let attempts = slot.failure.as_ref().map_or(0, |f| f.attempts).saturating_add(1);
                let delay = self.backoff(attempts);
                warn!(
                    secret_id,
                    attempts,
                    retry_in_secs = delay.as_secs(),
                    error = %error,
                    "secret fetch failed"
                );
                slot.value = None;
                slot.failure = Some(Failure {
                    error: error.clone(),
                    attempts,
                    failed_at: now,
                    delay,
                });
                Err(error)
            }
        }
    }

    /// Delay before the next fetch after `attempts` consecutive failures.
    fn backoff(&self, attempts: u32) -> Duration {
        let max = self.config.retry_delay_max;
        self.config
            .retry_growth_factor
            .checked_pow(attempts.saturating_sub(1))
            .and_then(|factor| self.config.retry_delay_base.checked_mul(factor))
            .map_or(max, |delay| delay.min(max))
    }

    /// Get or create the slot for `secret_id`, marking it most recently used.
    fn slot(&self, secret_id: &str) -> Arc<Mutex<Slot>> {
        let mut slots = self.slots.lock();
        if let Some(slot) = slots.get(secret_id) {
            return Arc::clone(slot);
        }

        let slot = Arc::new(Mutex::new(Slot::default()));
        if let Some((evicted, _)) = slots.push(secret_id.to_string(), Arc::clone(&slot)) {
            debug!(secret_id = %evicted, "evicted least recently used secret");
        }
        slot
    }
}

impl<F: SecretFetcher> SecretSource for SecretCache<F> {
    fn get_secret_string(&self, secret_id: &str) -> Result<String, StoreError> {
        self.get_with_now(secret_id, Instant::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fetcher serving fixed blobs and counting calls.
    #[derive(Default)]
    struct Fixed {
        blobs: HashMap<String, String>,
        fail: bool,
        calls: AtomicUsize,
        stages: Mutex<Vec<String>>,
    }

    impl Fixed {
        fn with(blobs: &[(&str, &str)]) -> Self {
            Self {
                blobs: blobs
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                ..Default::default()
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl SecretFetcher for Fixed {
        fn fetch(&self, secret_id: &str, version_stage: &str) -> Result<String, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.stages.lock().push(version_stage.to_string());
            if self.fail {
                return Err(StoreError::unavailable(secret_id, "connection refused"));
            }
            self.blobs
                .get(secret_id)
                .cloned()
                .ok_or_else(|| StoreError::unavailable(secret_id, "not found"))
        }

        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    fn config() -> CacheConfig {
        CacheConfig::default()
            .with_refresh_interval(Duration::from_secs(60))
            .with_retry_delay_base(Duration::from_secs(1))
            .with_retry_growth_factor(2)
            .with_retry_delay_max(Duration::from_secs(10))
    }

    #[test]
    fn test_serves_from_cache_within_refresh_interval() {
        let fetcher = Arc::new(Fixed::with(&[("app", r#"{"A":"1"}"#)]));
        let cache = SecretCache::new(Arc::clone(&fetcher), config());
        let start = Instant::now();

        assert_eq!(cache.get_at("app", start).unwrap(), r#"{"A":"1"}"#);
        assert_eq!(
            cache.get_at("app", start + Duration::from_secs(59)).unwrap(),
            r#"{"A":"1"}"#
        );
        assert_eq!(fetcher.calls(), 1);
    }

    #[test]
    fn test_refetches_after_refresh_interval() {
        let fetcher = Arc::new(Fixed::with(&[("app", "{}")]));
        let cache = SecretCache::new(Arc::clone(&fetcher), config());
        let start = Instant::now();

        cache.get_at("app", start).unwrap();
        cache.get_at("app", start + Duration::from_secs(60)).unwrap();
        assert_eq!(fetcher.calls(), 2);
    }

    #[test]
    fn test_requests_configured_version_stage() {
        let fetcher = Arc::new(Fixed::with(&[("app", "{}")]));
        let cache = SecretCache::new(
            Arc::clone(&fetcher),
            config().with_version_stage("AWSPREVIOUS"),
        );

        cache.get_secret_string("app").unwrap();
        assert_eq!(*fetcher.stages.lock(), vec!["AWSPREVIOUS".to_string()]);
    }

    #[test]
    fn test_failure_replayed_during_backoff() {
        let fetcher = Arc::new(Fixed::failing());
        let cache = SecretCache::new(Arc::clone(&fetcher), config());
        let start = Instant::now();

        let first = cache.get_at("app", start).unwrap_err();
        let second = cache
            .get_at("app", start + Duration::from_millis(500))
            .unwrap_err();
        assert_eq!(first, second);
        assert_eq!(fetcher.calls(), 1);

        // base delay of 1s has passed
        cache.get_at("app", start + Duration::from_secs(1)).unwrap_err();
        assert_eq!(fetcher.calls(), 2);
    }

    #[test]
    fn test_backoff_grows_and_caps() {
        let cache = SecretCache::new(Fixed::default(), config());
        assert_eq!(cache.backoff(1), Duration::from_secs(1));
        assert_eq!(cache.backoff(2), Duration::from_secs(2));
        assert_eq!(cache.backoff(3), Duration::from_secs(4));
        assert_eq!(cache.backoff(5), Duration::from_secs(10));
        assert_eq!(cache.backoff(u32::MAX), Duration::from_secs(10));
    }

    #[test]
    fn test_lru_eviction() {
        let fetcher = Arc::new(Fixed::with(&[("a", "{}"), ("b", "{}"), ("c", "{}")]));
        let cache = SecretCache::new(Arc::clone(&fetcher), config().with_max_cache_size(2));
        let now = Instant::now();

        cache.get_at("a", now).unwrap();
        cache.get_at("b", now).unwrap();
        cache.get_at("a", now).unwrap();
        cache.get_at("c", now).unwrap();
        assert_eq!(cache.len(), 2);
        assert_eq!(fetcher.calls(), 3);

        // "b" was least recently used and is gone
        cache.get_at("b", now).unwrap();
        assert_eq!(fetcher.calls(), 4);
        // "a" was evicted by "b"; "c" is still held
        cache.get_at("c", now).unwrap();
        assert_eq!(fetcher.calls(), 4);
    }

    #[test]
    fn test_evicted_slot_is_not_reused() {
        let fetcher = Arc::new(Fixed::with(&[("a", "{}"), ("b", "{}")]));
        let cache = SecretCache::new(Arc::clone(&fetcher), config().with_max_cache_size(1));
        let now = Instant::now();

        // a caller still holding the slot for "a" does not keep it in the map
        let held = cache.slot("a");
        cache.get_at("b", now).unwrap();
        assert!(!Arc::ptr_eq(&held, &cache.slot("a")));

        cache.get_at("a", now).unwrap();
        cache.get_at("a", now).unwrap();
        assert_eq!(fetcher.calls(), 2);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_info_counts_hits_and_misses() {
        let fetcher = Arc::new(Fixed::with(&[("a", "{}"), ("b", "{}")]));
        let cache = SecretCache::new(Arc::clone(&fetcher), config());
        let start = Instant::now();
        assert_eq!(cache.cache_info(), CacheInfo::default());

        cache.get_at("a", start).unwrap();
        cache.get_at("a", start).unwrap();
        cache.get_at("a", start).unwrap();
        cache.get_at("b", start).unwrap();
        // expired entries count as misses
        cache.get_at("a", start + Duration::from_secs(60)).unwrap();

        assert_eq!(
            cache.cache_info(),
            CacheInfo {
                hits: 2,
                misses: 3,
                currsize: 2,
            }
        );
    }

    #[test]
    fn test_cache_info_counts_replayed_failures() {
        let cache = SecretCache::new(Fixed::failing(), config());
        let start = Instant::now();

        cache.get_at("app", start).unwrap_err();
        cache.get_at("app", start).unwrap_err();

        let info = cache.cache_info();
        assert_eq!(info.hits, 0);
        assert_eq!(info.misses, 2);
        assert_eq!(info.currsize, 1);
    }

    #[test]
    fn test_cache_clear_resets() {
        let fetcher = Arc::new(Fixed::with(&[("app", "{}")]));
        let cache = SecretCache::new(Arc::clone(&fetcher), config());

        cache.get_secret_string("app").unwrap();
        cache.get_secret_string("app").unwrap();
        cache.cache_clear();
        assert_eq!(cache.cache_info(), CacheInfo::default());
        assert!(cache.is_empty());

        cache.get_secret_string("app").unwrap();
        assert_eq!(fetcher.calls(), 2);
    }

    #[test]
    fn test_refresh_now_bypasses_cache() {
        let fetcher = Arc::new(Fixed::with(&[("app", "{}")]));
        let cache = SecretCache::new(Arc::clone(&fetcher), config());

        cache.get_secret_string("app").unwrap();
        cache.refresh_now("app").unwrap();
        assert_eq!(fetcher.calls(), 2);
    }

    #[test]
    fn test_concurrent_misses_fetch_once() {
        let fetcher = Arc::new(Fixed::with(&[("app", "{}")]));
        let cache = Arc::new(SecretCache::new(Arc::clone(&fetcher), config()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || cache.get_secret_string("app").unwrap())
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), "{}");
        }
        assert_eq!(fetcher.calls(), 1);
    }
}
