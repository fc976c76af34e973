//! Capability traits for myip.
//!
//! The fetch orchestration is written against these traits only, so the
//! registry transport, the key-value backend and the error reporting can be
//! swapped (or faked in tests) without touching it.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{MyipError, Result};
use crate::types::RdapInfo;

// ═══════════════════════════════════════════════════════════════════════════════
// REGISTRY LOOKUP
// ═══════════════════════════════════════════════════════════════════════════════

/// Interface for fetching registry metadata about an address.
///
/// Implementations are expected to enforce their own transport timeout.
#[async_trait]
pub trait RdapLookup: Send + Sync {
    /// Looks up the registry record for `address`.
    async fn lookup(&self, address: &str) -> Result<RdapInfo>;
}

#[async_trait]
impl<T: RdapLookup + ?Sized> RdapLookup for Arc<T> {
    async fn lookup(&self, address: &str) -> Result<RdapInfo> {
        (**self).lookup(address).await
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CACHE BACKEND
// ═══════════════════════════════════════════════════════════════════════════════

/// Interface for the shared key-value store.
///
/// Implementations might use:
/// - In-process maps (for testing/development)
/// - Redis (for production)
///
/// `incr` must be atomic: concurrent increments of the same key must all be
/// counted. Unreachable backends fail with [`MyipError::BackendUnavailable`].
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Reads a value. A missing key is `Ok(None)`, not an error.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Writes a value, replacing any existing one and restarting its TTL.
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()>;

    /// Atomically increments an integer key (missing keys start at 0) and
    /// returns the new value. Counters never expire.
    async fn incr(&self, key: &str) -> Result<i64>;

    /// Verifies connectivity.
    async fn ping(&self) -> Result<()>;
}

#[async_trait]
impl<T: CacheBackend + ?Sized> CacheBackend for Arc<T> {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()> {
        (**self).set(key, value, ttl).await
    }

    async fn incr(&self, key: &str) -> Result<i64> {
        (**self).incr(key).await
    }

    async fn ping(&self) -> Result<()> {
        (**self).ping().await
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ERROR SINK
// ═══════════════════════════════════════════════════════════════════════════════

/// Side channel for non-fatal errors.
///
/// Reporting is fire-and-forget: it returns nothing and must not block.
pub trait ErrorSink: Send + Sync {
    /// Records a non-fatal error.
    fn report(&self, error: &MyipError);
}

impl<F> ErrorSink for F
where
    F: Fn(&MyipError) + Send + Sync,
{
    fn report(&self, error: &MyipError) {
        self(error)
    }
}

/// Sink that discards every report.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl ErrorSink for NoopSink {
    fn report(&self, _error: &MyipError) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_closure_sink() {
        let seen = AtomicUsize::new(0);
        let sink = |_: &MyipError| {
            seen.fetch_add(1, Ordering::SeqCst);
        };
        sink.report(&MyipError::ConfigError("x".into()));
        sink.report(&MyipError::ConfigError("y".into()));
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_noop_sink() {
        let sink: Box<dyn ErrorSink> = Box::new(NoopSink);
        sink.report(&MyipError::BackendUnavailable("down".into()));
    }
}
