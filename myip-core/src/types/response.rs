//! The value one fetch orchestration hands back.

use serde::Serialize;

use super::record::{RdapEvent, RdapInfo};
use crate::error::MyipError;

/// Where the registry record in a response came from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordSource {
    /// No lookup capability is configured; the record is empty.
    #[default]
    Disabled,
    /// A cached record that did not need a refresh.
    Cache,
    /// A record fetched by this request.
    Lookup,
    /// The lookup failed; a refresh-eligible cached record was served.
    StaleCache,
    /// The lookup failed and nothing was cached; the record is empty.
    Unavailable,
}

/// Result of one fetch for an address.
///
/// `error` is informational: it carries a counting failure that has already
/// been reported, and never voids the rest of the response.
#[derive(Debug, Serialize)]
pub struct FetchResponse {
    /// The address the response is about
    pub ip: String,
    /// Call counter after this request (0 if counting failed)
    pub count_call: i64,
    /// Best available registry record
    pub rdap: RdapInfo,
    /// Events of `rdap`
    pub events: Vec<RdapEvent>,
    /// Where `rdap` came from
    #[serde(skip)]
    pub source: RecordSource,
    /// Non-fatal error, already reported through the error sink
    #[serde(skip)]
    pub error: Option<MyipError>,
}

impl FetchResponse {
    /// Assembles a response; `events` is taken from the record.
    pub fn new(ip: impl Into<String>, count_call: i64, rdap: RdapInfo) -> Self {
        let events = rdap.events.clone();
        Self {
            ip: ip.into(),
            count_call,
            rdap,
            events,
            source: RecordSource::default(),
            error: None,
        }
    }

    /// Records where the registry record came from.
    pub fn with_source(mut self, source: RecordSource) -> Self {
        self.source = source;
        self
    }

    /// Attaches a non-fatal error.
    pub fn with_error(mut self, error: Option<MyipError>) -> Self {
        self.error = error;
        self
    }

    /// Returns true if the record carries registry data.
    pub fn has_rdap(&self) -> bool {
        !self.rdap.is_empty()
    }
}
