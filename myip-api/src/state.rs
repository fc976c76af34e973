//! App state: configuration, cache backend, fetch service.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, warn};

use myip_cache::{MemoryBackend, RdapStore, RedisBackend, RedisConfig};
use myip_core::constants::REMOTE_IP_PLACEHOLDER;
use myip_core::error::{MyipError, Result};
use myip_core::traits::{CacheBackend, RdapLookup};
use myip_rdap::RdapClient;
use myip_service::{FetchService, SharedFetchService, TracingSink};

/// Log output format selected by `LOG_TYPE`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines
    Console,
    /// One JSON object per line
    Json,
    /// Local syslog daemon
    Syslog,
    /// systemd journal
    System,
    /// GELF over UDP to `LOG_ADDR`
    Gelf,
}

impl LogFormat {
    /// Parses a `LOG_TYPE` value; `None` for unsupported formats.
    pub fn from_log_type(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "console" => Some(Self::Console),
            "json" => Some(Self::Json),
            "syslog" => Some(Self::Syslog),
            "system" => Some(Self::System),
            "gelf" => Some(Self::Gelf),
            _ => None,
        }
    }
}

/// Server configuration, read from the environment.
#[derive(Clone, Debug, Default)]
pub struct ApiConfig {
    /// Listen address (`WEB`)
    pub web: Option<String>,
    /// Redis `host:port` (`REDIS`); in-process backend when unset
    pub redis: Option<String>,
    /// Redis ACL user (`REDIS_USER`)
    pub redis_user: Option<String>,
    /// Redis password (`REDIS_PASS`)
    pub redis_pass: Option<String>,
    /// RDAP URL template (`RDAP_API`); lookups disabled when unset
    pub rdap_api: Option<String>,
    /// Log format name (`LOG_TYPE`)
    pub log_type: String,
    /// Remote log address (`LOG_ADDR`)
    pub log_addr: Option<String>,
}

impl ApiConfig {
    /// Loads `.env` if present, then reads the process environment.
    ///
    /// A missing `.env` is fine; one that exists but cannot be read or
    /// parsed is a [`MyipError::ConfigError`].
    pub fn from_env() -> Result<Self> {
        load_env_file(dotenvy::dotenv())?;
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `var`. Values are trimmed; empty means unset.
    pub fn from_vars<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            var(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let config = Self {
            web: get("WEB"),
            redis: get("REDIS"),
            redis_user: get("REDIS_USER"),
            redis_pass: get("REDIS_PASS"),
            rdap_api: get("RDAP_API"),
            log_type: get("LOG_TYPE").unwrap_or_else(|| "console".into()),
            log_addr: get("LOG_ADDR"),
        };
        config.validate()?;
        Ok(config)
    }

    /// Overrides the listen address when `web` is given.
    pub fn with_web(mut self, web: Option<String>) -> Self {
        if web.is_some() {
            self.web = web;
        }
        self
    }

    /// Overrides the Redis address when `redis` is given.
    pub fn with_redis(mut self, redis: Option<String>) -> Self {
        if redis.is_some() {
            self.redis = redis;
        }
        self
    }

    /// Overrides the RDAP template when `rdap_api` is given.
    pub fn with_rdap_api(mut self, rdap_api: Option<String>) -> Self {
        if rdap_api.is_some() {
            self.rdap_api = rdap_api;
        }
        self
    }

    /// Checks values that can be checked without touching the network.
    pub fn validate(&self) -> Result<()> {
        if let Some(template) = &self.rdap_api {
            if !template.contains(REMOTE_IP_PLACEHOLDER) {
                return Err(MyipError::ConfigError(format!(
                    "RDAP_API must contain {REMOTE_IP_PLACEHOLDER}: {template}"
                )));
            }
        }
        Ok(())
    }

    /// Returns the parsed listen address.
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        let web = self
            .web
            .as_deref()
            .ok_or_else(|| MyipError::ConfigError("WEB is not set".into()))?;
        web.parse()
            .map_err(|e| MyipError::ConfigError(format!("invalid WEB address '{web}': {e}")))
    }

    /// Returns the log format; `None` if `LOG_TYPE` names an unsupported one.
    pub fn log_format(&self) -> Option<LogFormat> {
        LogFormat::from_log_type(&self.log_type)
    }

    /// Connects the configured cache backend.
    pub async fn connect_backend(&self) -> Result<Arc<dyn CacheBackend>> {
        match &self.redis {
            Some(addr) => {
                let mut redis = RedisConfig::new(addr.as_str());
                redis.username = self.redis_user.clone();
                redis.password = self.redis_pass.clone();
                let backend: Arc<dyn CacheBackend> = Arc::new(RedisBackend::connect(redis).await?);
                Ok(backend)
            }
            None => {
                warn!("REDIS not set, using in-process cache; counts are lost on restart");
                let backend: Arc<dyn CacheBackend> = Arc::new(MemoryBackend::new());
                Ok(backend)
            }
        }
    }

    /// Builds the registry lookup, if one is configured.
    pub fn build_lookup(&self) -> Result<Option<Arc<dyn RdapLookup>>> {
        match &self.rdap_api {
            Some(template) => {
                let client: Arc<dyn RdapLookup> = Arc::new(RdapClient::new(template.as_str())?);
                Ok(Some(client))
            }
            None => {
                info!("RDAP_API not set, registry lookups disabled");
                Ok(None)
            }
        }
    }
}

fn load_env_file<T>(loaded: dotenvy::Result<T>) -> Result<()> {
    match loaded {
        Ok(_) => Ok(()),
        Err(err) if err.not_found() => Ok(()),
        Err(err) => Err(MyipError::ConfigError(format!("failed to load .env: {err}"))),
    }
}

/// Shared state handed to every handler.
pub struct AppState {
    /// Configuration the state was built from
    pub config: ApiConfig,
    /// Fetch orchestration
    pub service: SharedFetchService,
}

impl AppState {
    /// Wraps an already-assembled service.
    pub fn new(config: ApiConfig, service: SharedFetchService) -> Self {
        Self { config, service }
    }

    /// Connects the backend, builds the lookup and assembles the service.
    pub async fn from_config(config: ApiConfig) -> Result<Self> {
        let backend = config.connect_backend().await?;
        let lookup = config.build_lookup()?;

        let service = FetchService::new(RdapStore::new(backend))
            .with_optional_lookup(lookup)
            .with_error_sink(Arc::new(TracingSink));

        Ok(Self::new(config, service))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use test_case::test_case;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_from_vars_reads_and_trims() {
        let config = ApiConfig::from_vars(vars(&[
            ("WEB", " 0.0.0.0:8080 "),
            ("REDIS", "127.0.0.1:6379"),
            ("REDIS_USER", ""),
            ("RDAP_API", "https://rdap.db.ripe.net/ip/{REMOTE_IP}"),
        ]))
        .unwrap();

        assert_eq!(config.web.as_deref(), Some("0.0.0.0:8080"));
        assert_eq!(config.redis.as_deref(), Some("127.0.0.1:6379"));
        assert!(config.redis_user.is_none());
        assert_eq!(config.log_type, "console");
        assert_eq!(config.listen_addr().unwrap().port(), 8080);
    }

    #[test]
    fn test_template_without_placeholder_rejected() {
        let err = ApiConfig::from_vars(vars(&[("RDAP_API", "https://rdap.example/ip/")])).unwrap_err();
        assert!(matches!(err, MyipError::ConfigError(_)));
    }

    #[test]
    fn test_missing_web_is_config_error() {
        let config = ApiConfig::from_vars(vars(&[])).unwrap();
        assert!(matches!(config.listen_addr(), Err(MyipError::ConfigError(_))));
        assert!(config.build_lookup().unwrap().is_none());
    }

    #[test]
    fn test_overrides_only_when_given() {
        let config = ApiConfig::from_vars(vars(&[("WEB", "127.0.0.1:1")]))
            .unwrap()
            .with_web(None)
            .with_redis(Some("redis:6379".into()))
            .with_rdap_api(None);

        assert_eq!(config.web.as_deref(), Some("127.0.0.1:1"));
        assert_eq!(config.redis.as_deref(), Some("redis:6379"));
        assert!(config.rdap_api.is_none());
    }

    #[test_case("console" => Some(LogFormat::Console))]
    #[test_case("JSON" => Some(LogFormat::Json))]
    #[test_case("" => Some(LogFormat::Console))]
    #[test_case("syslog" => Some(LogFormat::Syslog))]
    #[test_case(" System " => Some(LogFormat::System))]
    #[test_case("gelf" => Some(LogFormat::Gelf))]
    #[test_case("logstash" => None)]
    fn test_log_format(value: &str) -> Option<LogFormat> {
        LogFormat::from_log_type(value)
    }

    #[test]
    fn test_missing_env_file_is_ignored() {
        let missing = dotenvy::Error::Io(std::io::Error::from(std::io::ErrorKind::NotFound));
        assert!(load_env_file::<()>(Err(missing)).is_ok());
        assert!(load_env_file(Ok(std::path::PathBuf::from(".env"))).is_ok());
    }

    #[test]
    fn test_malformed_env_file_is_config_error() {
        let malformed = dotenvy::Error::LineParse("REDIS 127.0.0.1:6379".into(), 6);
        let err = load_env_file::<()>(Err(malformed)).unwrap_err();

        assert!(matches!(err, MyipError::ConfigError(ref msg) if msg.contains(".env")));
    }

    #[test]
    fn test_unreadable_env_file_is_config_error() {
        let denied = dotenvy::Error::Io(std::io::Error::from(std::io::ErrorKind::PermissionDenied));
        assert!(matches!(load_env_file::<()>(Err(denied)), Err(MyipError::ConfigError(_))));
    }

    #[tokio::test]
    async fn test_from_config_without_redis_uses_memory() {
        let config = ApiConfig::from_vars(vars(&[])).unwrap();
        let state = AppState::from_config(config).await.unwrap();

        assert!(!state.service.lookup_enabled());
        assert_eq!(state.service.fetch("192.0.2.1").await.count_call, 1);
    }
}
