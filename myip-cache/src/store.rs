//! Typed cache store keyed by address.
//!
//! Holds two namespaces per address: the serialized registry record with its
//! fetch time (expires after the retention window) and the call counter
//! (never expires).

use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

use myip_core::constants::{cache_key, count_key, CACHE_TTL_SECS};
use myip_core::error::Result;
use myip_core::traits::CacheBackend;
use myip_core::types::{CachedRdap, RdapInfo};

/// Registry record cache and call counter over a key-value backend.
#[derive(Debug)]
pub struct RdapStore<B> {
    backend: B,
    retention: Duration,
}

impl<B: CacheBackend> RdapStore<B> {
    /// Creates a store with the default 7 day retention.
    pub fn new(backend: B) -> Self {
        Self::with_retention(backend, Duration::from_secs(CACHE_TTL_SECS))
    }

    /// Creates a store with a custom retention window.
    pub fn with_retention(backend: B, retention: Duration) -> Self {
        Self { backend, retention }
    }

    /// Returns the underlying backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Returns the cache-entry retention window.
    pub fn retention(&self) -> Duration {
        self.retention
    }

    /// Reads the cached record for `address`.
    ///
    /// A missing entry is `Ok(None)`. A corrupted entry is an error, never a
    /// silent miss.
    #[instrument(skip(self))]
    pub async fn get_cached(&self, address: &str) -> Result<Option<CachedRdap>> {
        let Some(bytes) = self.backend.get(&cache_key(address)).await? else {
            debug!(address, "Cache miss");
            return Ok(None);
        };
        let entry = CachedRdap::from_bytes(address, &bytes)?;
        debug!(address, fetched_at = %entry.fetched_at, "Cache hit");
        Ok(Some(entry))
    }

    /// Stores `info` for `address`, replacing any existing entry and
    /// restarting its retention window.
    #[instrument(skip(self, info))]
    pub async fn set_cached(
        &self,
        address: &str,
        info: &RdapInfo,
        fetched_at: DateTime<Utc>,
    ) -> Result<()> {
        let payload = CachedRdap::new(info.clone(), fetched_at).to_bytes(address)?;
        self.backend
            .set(&cache_key(address), payload, self.retention)
            .await
    }

    /// Increments the call counter for `address` and returns the new value.
    #[instrument(skip(self))]
    pub async fn increment_count(&self, address: &str) -> Result<i64> {
        self.backend.incr(&count_key(address)).await
    }

    /// Verifies backend connectivity.
    pub async fn ping(&self) -> Result<()> {
        self.backend.ping().await
    }
}
