//! In-memory TTL cache using moka as the backing store
//!
//! Expiry is lazy: an entry older than the TTL is only removed when it is
//! looked up, so `size()` keeps counting stale entries until then.

use std::fmt;
use std::time::Duration;

use moka::sync::Cache as MokaCache;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::domain::DomainError;

/// Configuration for in-memory cache
#[derive(Debug, Clone)]
pub struct InMemoryCacheConfig {
    /// Optional bound on the number of entries. Unbounded when `None`; a
    /// bounded cache may refuse or evict fresh entries under pressure.
    pub max_capacity: Option<u64>,
    /// Maximum age of an entry before it is considered stale
    pub ttl: Duration,
}

impl Default for InMemoryCacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: None,
            ttl: Duration::from_secs(300), // 5 minutes
        }
    }
}

impl InMemoryCacheConfig {
    /// Bounds the number of entries
    pub fn with_max_capacity(mut self, capacity: u64) -> Self {
        self.max_capacity = Some(capacity);
        self
    }

    /// Sets the TTL
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

/// Cache entry stored in moka
#[derive(Clone)]
struct CacheEntry<T> {
    value: T,
    stored_at: Instant,
    /// SHA-256 of the JSON form, kept for diagnostics only
    content_hash: String,
}

/// Memoizing store owned by a single service.
///
/// `get`/`set` never suspend, so concurrent tasks on the same service only
/// interleave between cache operations.
pub struct TtlCache<T> {
    name: &'static str,
    entries: MokaCache<String, CacheEntry<T>>,
    config: InMemoryCacheConfig,
}

impl<T> TtlCache<T>
where
    T: Clone + Serialize + Send + Sync + 'static,
{
    /// Creates an unbounded cache with the given TTL
    pub fn new(name: &'static str, ttl: Duration) -> Self {
        Self::with_config(name, InMemoryCacheConfig::default().with_ttl(ttl))
    }

    /// Creates a cache with the given configuration
    pub fn with_config(name: &'static str, config: InMemoryCacheConfig) -> Self {
        let builder = MokaCache::builder();
        let entries = match config.max_capacity {
            Some(capacity) => builder.max_capacity(capacity).build(),
            None => builder.build(),
        };

        Self {
            name,
            entries,
            config,
        }
    }

    /// Returns the cached value if it is no older than the TTL.
    /// A stale entry is evicted on the way out.
    pub fn get(&self, key: &str) -> Option<T> {
        let entry = self.entries.get(key)?;

        if self.is_stale(&entry) {
            debug!(cache = self.name, key, "Cache entry expired");
            self.entries.invalidate(key);
            return None;
        }

        debug!(cache = self.name, key, "Cache hit");
        Some(entry.value)
    }

    /// Stores a value stamped with the current time.
    ///
    /// If the value cannot be hashed the entry is skipped; later lookups
    /// behave as a miss.
    pub fn set(&self, key: impl Into<String>, value: T) {
        let key = key.into();

        match content_hash(&value) {
            Ok(content_hash) => {
                let entry = CacheEntry {
                    value,
                    stored_at: Instant::now(),
                    content_hash,
                };
                self.entries.insert(key, entry);
            }
            Err(e) => {
                warn!(cache = self.name, key = %key, error = %e, "Failed to cache data");
            }
        }
    }

    /// Diagnostic hash of a live entry
    pub fn hash_of(&self, key: &str) -> Option<String> {
        self.entries
            .get(key)
            .filter(|entry| !self.is_stale(entry))
            .map(|entry| entry.content_hash)
    }

    /// Removes all entries
    pub fn clear(&self) {
        self.entries.invalidate_all();
        self.entries.run_pending_tasks();
    }

    /// Number of stored entries, including stale ones not yet looked up
    pub fn size(&self) -> usize {
        self.entries.run_pending_tasks();
        self.entries.entry_count() as usize
    }

    pub fn ttl(&self) -> Duration {
        self.config.ttl
    }

    fn is_stale(&self, entry: &CacheEntry<T>) -> bool {
        entry.stored_at.elapsed() > self.config.ttl
    }
}

impl<T> fmt::Debug for TtlCache<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtlCache")
            .field("name", &self.name)
            .field("entries", &self.entries.entry_count())
            .field("config", &self.config)
            .finish()
    }
}

fn content_hash<T: Serialize>(value: &T) -> Result<String, DomainError> {
    let bytes = serde_json::to_vec(value)
        .map_err(|e| DomainError::cache(format!("Failed to serialize cache value: {}", e)))?;

    Ok(hex::encode(Sha256::digest(&bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::ser::{Error as _, Serializer};

    const TTL: Duration = Duration::from_secs(300);

    #[derive(Clone)]
    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
            Err(S::Error::custom("cannot serialize"))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_and_get() {
        let cache = TtlCache::new("test", TTL);

        cache.set("key1", "value1".to_string());

        assert_eq!(cache.get("key1"), Some("value1".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_missing() {
        let cache: TtlCache<String> = TtlCache::new("test", TTL);

        assert!(cache.get("missing").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_overwrites() {
        let cache = TtlCache::new("test", TTL);

        cache.set("key1", vec![1, 2]);
        cache.set("key1", vec![3]);

        assert_eq!(cache.get("key1"), Some(vec![3]));
        assert_eq!(cache.size(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_alive_at_exact_ttl() {
        let cache = TtlCache::new("test", TTL);
        cache.set("key1", 42u32);

        tokio::time::advance(TTL).await;

        assert_eq!(cache.get("key1"), Some(42));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttl_expiration_evicts_on_access() {
        let cache = TtlCache::new("test", TTL);
        cache.set("key1", "value1".to_string());
        cache.set("key2", "value2".to_string());

        tokio::time::advance(TTL + Duration::from_millis(1)).await;

        // Stale entries still count until they are looked up
        assert_eq!(cache.size(), 2);

        assert!(cache.get("key1").is_none());
        assert_eq!(cache.size(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear() {
        let cache = TtlCache::new("test", TTL);
        cache.set("key1", 1u8);
        cache.set("key2", 2u8);

        cache.clear();

        assert_eq!(cache.size(), 0);
        assert!(cache.get("key1").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unserializable_value_is_not_cached() {
        let cache = TtlCache::new("test", TTL);

        cache.set("key1", Unserializable);

        assert!(cache.get("key1").is_none());
        assert_eq!(cache.size(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_content_hash_tracks_value() {
        let cache = TtlCache::new("test", TTL);

        cache.set("a", "same".to_string());
        cache.set("b", "same".to_string());
        cache.set("c", "different".to_string());

        let a = cache.hash_of("a").unwrap();
        assert_eq!(a.len(), 64);
        assert_eq!(Some(a.clone()), cache.hash_of("b"));
        assert_ne!(Some(a), cache.hash_of("c"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_recent_entries_survive_maintenance() {
        let cache = TtlCache::new("test", TTL);
        cache.set("a", 1u32);
        cache.set("b", 2u32);

        for _ in 0..10 {
            cache.get("a");
            cache.get("b");
        }

        cache.set("c", 3u32);

        assert_eq!(cache.size(), 3);
        assert_eq!(cache.get("a"), Some(1));
        assert_eq!(cache.get("b"), Some(2));
        assert_eq!(cache.get("c"), Some(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_cache_is_unbounded() {
        let cache = TtlCache::new("test", TTL);

        for i in 0..20_000u32 {
            cache.set(i.to_string(), i);
        }

        assert_eq!(cache.size(), 20_000);
        assert_eq!(cache.get("0"), Some(0));
        assert_eq!(cache.get("19999"), Some(19_999));
    }

    #[tokio::test]
    async fn test_config() {
        let config = InMemoryCacheConfig::default()
            .with_max_capacity(100)
            .with_ttl(Duration::from_secs(60));

        let cache: TtlCache<String> = TtlCache::with_config("test", config);

        assert_eq!(cache.config.max_capacity, Some(100));
        assert_eq!(cache.ttl(), Duration::from_secs(60));
    }
}
