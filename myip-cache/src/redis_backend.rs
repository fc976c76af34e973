//! Redis cache backend.
//!
//! Shared storage for multi-process deployments. Counters use `INCR`, so
//! concurrent requests for one address are counted atomically by Redis.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, IntoConnectionInfo, RedisError};
use tracing::{debug, info, instrument};

use myip_core::error::{MyipError, Result};
use myip_core::traits::CacheBackend;

/// Redis connection settings.
#[derive(Clone, Debug, Default)]
pub struct RedisConfig {
    /// `host:port` of the Redis server
    pub addr: String,
    /// ACL user name
    pub username: Option<String>,
    /// Password
    pub password: Option<String>,
}

impl RedisConfig {
    /// Creates settings for the given `host:port`.
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            ..Default::default()
        }
    }

    /// Adds credentials. Empty strings are treated as unset.
    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        let username = username.into();
        let password = password.into();
        self.username = (!username.is_empty()).then_some(username);
        self.password = (!password.is_empty()).then_some(password);
        self
    }
}

/// Redis-backed key-value backend.
#[derive(Clone)]
pub struct RedisBackend {
    conn: ConnectionManager,
}

impl RedisBackend {
    /// Connects to Redis.
    #[instrument(skip(config), fields(addr = %config.addr))]
    pub async fn connect(config: RedisConfig) -> Result<Self> {
        let mut conn_info = format!("redis://{}/", config.addr)
            .into_connection_info()
            .map_err(|e| MyipError::ConfigError(format!("invalid Redis address '{}': {}", config.addr, e)))?;
        conn_info.redis.username = config.username;
        conn_info.redis.password = config.password;

        let client = redis::Client::open(conn_info).map_err(|e| map_redis_error("connect", e))?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| map_redis_error("connect", e))?;

        info!("Connected to Redis");
        Ok(Self { conn })
    }
}

impl std::fmt::Debug for RedisBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisBackend").finish_non_exhaustive()
    }
}

#[async_trait]
impl CacheBackend for RedisBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.conn.clone();
        conn.get(key).await.map_err(|e| map_redis_error("get", e))
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()> {
        let mut conn = self.conn.clone();
        let result = if ttl.is_zero() {
            conn.set::<_, _, ()>(key, value).await
        } else {
            conn.set_ex::<_, _, ()>(key, value, ttl.as_secs().max(1)).await
        };
        result.map_err(|e| map_redis_error("set", e))
    }

    async fn incr(&self, key: &str) -> Result<i64> {
        let mut conn = self.conn.clone();
        conn.incr(key, 1i64).await.map_err(|e| map_redis_error("incr", e))
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let reply: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| map_redis_error("ping", e))?;
        debug!(reply, "Redis ping");
        Ok(())
    }
}

/// Connection-level failures become `BackendUnavailable`; everything else is
/// a command failure.
fn map_redis_error(operation: &'static str, err: RedisError) -> MyipError {
    if err.is_connection_refusal() || err.is_connection_dropped() || err.is_io_error() || err.is_timeout() {
        MyipError::BackendUnavailable(format!("{operation}: {err}"))
    } else {
        MyipError::Backend {
            operation,
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = RedisConfig::new("127.0.0.1:6379").with_credentials("svc", "secret");
        assert_eq!(config.addr, "127.0.0.1:6379");
        assert_eq!(config.username.as_deref(), Some("svc"));
        assert_eq!(config.password.as_deref(), Some("secret"));
    }

    #[test]
    fn test_empty_credentials_are_unset() {
        let config = RedisConfig::new("127.0.0.1:6379").with_credentials("", "");
        assert!(config.username.is_none());
        assert!(config.password.is_none());
    }

    #[test]
    fn test_io_failures_map_to_unavailable() {
        let err = RedisError::from(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "refused",
        ));
        assert!(matches!(map_redis_error("incr", err), MyipError::BackendUnavailable(_)));
    }

    #[test]
    fn test_command_failures_map_to_backend() {
        let err = RedisError::from((redis::ErrorKind::TypeError, "value is not an integer"));
        assert!(matches!(
            map_redis_error("incr", err),
            MyipError::Backend { operation: "incr", .. }
        ));
    }
}
