//! RDAP client implementation.
//!
//! The server is addressed through a URL template in which every
//! `{REMOTE_IP}` is replaced by the address being looked up, e.g.
//! `https://rdap.db.ripe.net/ip/{REMOTE_IP}`.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

use myip_core::constants::{RDAP_REQUEST_TIMEOUT_SECS, REMOTE_IP_PLACEHOLDER};
use myip_core::error::{MyipError, Result};
use myip_core::traits::RdapLookup;
use myip_core::types::{RdapEvent, RdapInfo};

/// RDAP client configuration.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct RdapConfig {
    /// URL template containing `{REMOTE_IP}`
    pub url_template: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl RdapConfig {
    /// Creates config for the given URL template.
    pub fn new(url_template: impl Into<String>) -> Self {
        Self {
            url_template: url_template.into(),
            timeout_seconds: RDAP_REQUEST_TIMEOUT_SECS,
        }
    }

    /// Overrides the request timeout.
    pub fn with_timeout(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }
}

/// Subset of the RDAP IP network object that myip keeps.
///
/// Registries send `null` as readily as they omit a member, so every field
/// is optional and collapses to empty.
#[derive(Debug, Default, Deserialize)]
struct RdapResponse {
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    handle: Option<String>,
    #[serde(default, rename = "ipVersion")]
    ip_version: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    events: Option<Vec<RdapResponseEvent>>,
}

#[derive(Debug, Default, Deserialize)]
struct RdapResponseEvent {
    #[serde(default, rename = "eventAction")]
    action: Option<String>,
    #[serde(default, rename = "eventDate")]
    date: Option<String>,
}

impl From<RdapResponse> for RdapInfo {
    fn from(payload: RdapResponse) -> Self {
        Self {
            country: payload.country.unwrap_or_default(),
            handle: payload.handle.unwrap_or_default(),
            ip_version: payload.ip_version.unwrap_or_default(),
            name: payload.name.unwrap_or_default(),
            kind: payload.kind.unwrap_or_default(),
            events: payload
                .events
                .unwrap_or_default()
                .into_iter()
                .map(|e| RdapEvent::new(e.action.unwrap_or_default(), e.date.unwrap_or_default()))
                .collect(),
        }
    }
}

/// HTTP client for RDAP lookups.
#[derive(Debug)]
pub struct RdapClient {
    config: RdapConfig,
    http_client: reqwest::Client,
}

impl RdapClient {
    /// Creates a client for the given URL template with the default timeout.
    pub fn new(url_template: impl Into<String>) -> Result<Self> {
        Self::with_config(RdapConfig::new(url_template))
    }

    /// Creates a client with custom configuration.
    ///
    /// Fails if the template has no `{REMOTE_IP}` placeholder.
    pub fn with_config(config: RdapConfig) -> Result<Self> {
        if !config.url_template.contains(REMOTE_IP_PLACEHOLDER) {
            return Err(MyipError::TemplateMissingPlaceholder(config.url_template));
        }

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| MyipError::ConfigError(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Returns the configured URL template.
    pub fn url_template(&self) -> &str {
        &self.config.url_template
    }

    /// Builds the request URL for `address`.
    fn lookup_url(&self, address: &str) -> String {
        self.config.url_template.replace(REMOTE_IP_PLACEHOLDER, address)
    }

    /// Fetches the registry record for `address`.
    #[instrument(skip(self))]
    pub async fn fetch(&self, address: &str) -> Result<RdapInfo> {
        let url = self.lookup_url(address);

        let response = self
            .http_client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/rdap+json, application/json")
            .send()
            .await
            .map_err(|e| MyipError::Lookup {
                address: address.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(MyipError::LookupStatus {
                address: address.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| MyipError::Lookup {
            address: address.to_string(),
            reason: e.to_string(),
        })?;

        let payload: RdapResponse =
            serde_json::from_slice(&body).map_err(|e| MyipError::LookupDecode {
                address: address.to_string(),
                reason: e.to_string(),
            })?;

        let info = RdapInfo::from(payload);
        debug!(address, country = %info.country, events = info.events.len(), "RDAP lookup complete");
        Ok(info)
    }
}

#[async_trait]
impl RdapLookup for RdapClient {
    async fn lookup(&self, address: &str) -> Result<RdapInfo> {
        self.fetch(address).await
    }
}
