//! In-memory cache backend.
//!
//! Fast, thread-safe storage suitable for development, testing,
//! and single-process deployments.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::{debug, instrument};

use myip_core::error::{MyipError, Result};
use myip_core::traits::CacheBackend;

/// Stored value with optional expiry.
#[derive(Clone, Debug)]
struct Slot {
    value: Vec<u8>,
    expires_at: Option<Instant>,
}

impl Slot {
    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }
}

/// Configuration for [`MemoryBackend`].
#[derive(Clone, Debug)]
pub struct MemoryConfig {
    /// Maximum number of keys kept
    pub max_entries: usize,
    /// Drop expired entries when a write finds the map full
    pub auto_cleanup: bool,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_entries: 100_000,
            auto_cleanup: true,
        }
    }
}

/// In-memory key-value backend.
///
/// Follows the semantics of the Redis commands it stands in for: values are
/// opaque bytes, `set` restarts the TTL, and `incr` treats the stored value
/// as a decimal integer with no expiry.
///
/// # Thread Safety
///
/// All operations are thread-safe. `incr` holds the key's shard lock for the
/// read-modify-write, so concurrent increments of one key are never lost.
///
/// # Bounds
///
/// A write of a new key into a full map first purges expired entries, then
/// evicts the entry closest to expiry. Counters only go when nothing with a
/// TTL is left. Concurrent writers may overshoot `max_entries` briefly.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    slots: DashMap<String, Slot>,
    config: MemoryConfig,
}

impl MemoryBackend {
    /// Creates an empty backend with the default configuration.
    pub fn new() -> Self {
        Self::with_config(MemoryConfig::default())
    }

    /// Creates an empty backend with the given configuration.
    pub fn with_config(config: MemoryConfig) -> Self {
        Self {
            slots: DashMap::new(),
            config,
        }
    }

    /// Creates a backend with preallocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: DashMap::with_capacity(capacity),
            config: MemoryConfig::default(),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    /// Frees a slot for `key` if it is new and the map is full.
    ///
    /// Must not be called while holding a reference into `slots`.
    fn make_room(&self, key: &str) {
        if self.slots.len() < self.config.max_entries || self.slots.contains_key(key) {
            return;
        }

        if self.config.auto_cleanup {
            self.purge_expired();
            if self.slots.len() < self.config.max_entries {
                return;
            }
        }

        let victim = self
            .slots
            .iter()
            .filter_map(|entry| entry.expires_at.map(|at| (at, entry.key().clone())))
            .min()
            .map(|(_, key)| key)
            .or_else(|| self.slots.iter().next().map(|entry| entry.key().clone()));

        if let Some(victim) = victim {
            self.slots.remove(&victim);
            debug!(key = %victim, "Evicted cache entry");
        }
    }

    /// Removes all expired entries.
    pub fn purge_expired(&self) -> usize {
        let before = self.slots.len();
        self.slots.retain(|_, slot| !slot.is_expired());
        let purged = before.saturating_sub(self.slots.len());
        if purged > 0 {
            debug!(purged, "Purged expired cache entries");
        }
        purged
    }

    /// Clears all entries, counters included.
    pub fn clear(&self) {
        self.slots.clear();
    }

    /// Returns the number of stored keys (including not-yet-purged expired ones).
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let Some(slot) = self.slots.get(key) else {
            return Ok(None);
        };
        if slot.is_expired() {
            drop(slot);
            self.slots.remove_if(key, |_, slot| slot.is_expired());
            return Ok(None);
        }
        Ok(Some(slot.value.clone()))
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()> {
        let expires_at = if ttl.is_zero() {
            None
        } else {
            Some(Instant::now() + ttl)
        };
        self.make_room(key);
        self.slots.insert(key.to_string(), Slot { value, expires_at });
        Ok(())
    }

    #[instrument(skip(self))]
    async fn incr(&self, key: &str) -> Result<i64> {
        self.make_room(key);
        let mut slot = self.slots.entry(key.to_string()).or_insert_with(|| Slot {
            value: b"0".to_vec(),
            expires_at: None,
        });

        let current = if slot.is_expired() {
            0
        } else {
            std::str::from_utf8(&slot.value)
                .ok()
                .and_then(|s| s.parse::<i64>().ok())
                .ok_or_else(|| MyipError::Backend {
                    operation: "incr",
                    reason: "value is not an integer".into(),
                })?
        };
        let next = current.checked_add(1).ok_or_else(|| MyipError::Backend {
            operation: "incr",
            reason: "increment would overflow".into(),
        })?;

        slot.value = next.to_string().into_bytes();
        slot.expires_at = None;
        Ok(next)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let backend = MemoryBackend::new();
        assert!(backend.get("rdap:192.0.2.1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_get() {
        let backend = MemoryBackend::new();
        backend
            .set("rdap:192.0.2.1", b"payload".to_vec(), Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(
            backend.get("rdap:192.0.2.1").await.unwrap(),
            Some(b"payload".to_vec())
        );
    }

    #[tokio::test]
    async fn test_set_overwrites() {
        let backend = MemoryBackend::new();
        backend.set("k", b"one".to_vec(), Duration::from_secs(60)).await.unwrap();
        backend.set("k", b"two".to_vec(), Duration::from_secs(60)).await.unwrap();
        assert_eq!(backend.get("k").await.unwrap(), Some(b"two".to_vec()));
    }

    #[tokio::test]
    async fn test_ttl_expiration() {
        let backend = MemoryBackend::new();
        backend.set("k", b"v".to_vec(), Duration::from_millis(1)).await.unwrap();

        std::thread::sleep(Duration::from_millis(10));

        assert!(backend.get("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let backend = MemoryBackend::new();
        backend.set("short", b"v".to_vec(), Duration::from_millis(1)).await.unwrap();
        backend.set("long", b"v".to_vec(), Duration::from_secs(3600)).await.unwrap();
        backend.incr("count:192.0.2.1").await.unwrap();

        std::thread::sleep(Duration::from_millis(10));

        assert_eq!(backend.purge_expired(), 1);
        assert_eq!(backend.len(), 2);
    }

    #[tokio::test]
    async fn test_incr_starts_at_one() {
        let backend = MemoryBackend::new();
        assert_eq!(backend.incr("count:192.0.2.1").await.unwrap(), 1);
        assert_eq!(backend.incr("count:192.0.2.1").await.unwrap(), 2);
        assert_eq!(backend.incr("count:198.51.100.7").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_counter_readable_as_decimal() {
        let backend = MemoryBackend::new();
        backend.incr("count:k").await.unwrap();
        backend.incr("count:k").await.unwrap();
        assert_eq!(backend.get("count:k").await.unwrap(), Some(b"2".to_vec()));
    }

    #[tokio::test]
    async fn test_incr_non_integer_fails() {
        let backend = MemoryBackend::new();
        backend.set("k", b"{}".to_vec(), Duration::from_secs(60)).await.unwrap();
        let err = backend.incr("k").await.unwrap_err();
        assert!(matches!(err, MyipError::Backend { operation: "incr", .. }));
    }

    #[tokio::test]
    async fn test_concurrent_incr() {
        let backend = Arc::new(MemoryBackend::new());
        let mut handles = Vec::new();

        for _ in 0..10 {
            let backend = backend.clone();
            handles.push(tokio::spawn(async move {
                for _ in 0..50 {
                    backend.incr("count:192.0.2.1").await.unwrap();
                }
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(backend.incr("count:192.0.2.1").await.unwrap(), 501);
    }

    fn bounded(max_entries: usize) -> MemoryBackend {
        MemoryBackend::with_config(MemoryConfig {
            max_entries,
            auto_cleanup: true,
        })
    }

    #[tokio::test]
    async fn test_set_stays_within_max_entries() {
        let backend = bounded(3);
        for i in 0..10 {
            backend
                .set(&format!("rdap:192.0.2.{i}"), b"v".to_vec(), Duration::from_secs(60))
                .await
                .unwrap();
            assert!(backend.len() <= 3);
        }

        // the latest write always lands
        assert!(backend.get("rdap:192.0.2.9").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_incr_stays_within_max_entries() {
        let backend = bounded(3);
        for i in 0..10 {
            assert_eq!(backend.incr(&format!("count:192.0.2.{i}")).await.unwrap(), 1);
        }
        assert_eq!(backend.len(), 3);
    }

    #[tokio::test]
    async fn test_full_write_purges_expired_first() {
        let backend = bounded(2);
        backend.set("short", b"v".to_vec(), Duration::from_millis(1)).await.unwrap();
        backend.set("long", b"v".to_vec(), Duration::from_secs(3600)).await.unwrap();

        std::thread::sleep(Duration::from_millis(10));
        backend.set("new", b"v".to_vec(), Duration::from_secs(60)).await.unwrap();

        assert_eq!(backend.len(), 2);
        assert!(backend.get("long").await.unwrap().is_some());
        assert!(backend.get("new").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_full_write_evicts_soonest_expiry_before_counters() {
        let backend = bounded(3);
        backend.incr("count:192.0.2.1").await.unwrap();
        backend.set("soon", b"v".to_vec(), Duration::from_secs(60)).await.unwrap();
        backend.set("later", b"v".to_vec(), Duration::from_secs(3600)).await.unwrap();

        backend.set("new", b"v".to_vec(), Duration::from_secs(600)).await.unwrap();

        assert!(backend.get("soon").await.unwrap().is_none());
        assert!(backend.get("later").await.unwrap().is_some());
        assert_eq!(backend.get("count:192.0.2.1").await.unwrap(), Some(b"1".to_vec()));
    }

    #[tokio::test]
    async fn test_overwrite_when_full_evicts_nothing() {
        let backend = bounded(2);
        backend.set("a", b"1".to_vec(), Duration::from_secs(60)).await.unwrap();
        backend.set("b", b"1".to_vec(), Duration::from_secs(60)).await.unwrap();

        backend.set("a", b"2".to_vec(), Duration::from_secs(60)).await.unwrap();

        assert_eq!(backend.get("a").await.unwrap(), Some(b"2".to_vec()));
        assert!(backend.get("b").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_clear() {
        let backend = MemoryBackend::with_capacity(4);
        backend.set("a", b"1".to_vec(), Duration::from_secs(60)).await.unwrap();
        backend.incr("b").await.unwrap();
        backend.clear();
        assert!(backend.is_empty());
    }
}
