//! Registry records and their cache envelope.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{MyipError, Result};

/// A single registry event, as returned by the registry.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RdapEvent {
    /// Event action (e.g. "registration", "last changed")
    #[serde(default)]
    pub action: String,
    /// Event date, kept verbatim
    #[serde(default)]
    pub date: String,
}

impl RdapEvent {
    /// Creates an event.
    pub fn new(action: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            date: date.into(),
        }
    }
}

/// Registry metadata about an address.
///
/// The default value is the empty record, meaning "no data available".
/// Records are replaced wholesale, never merged field by field.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RdapInfo {
    /// Country code of the allocation
    #[serde(default)]
    pub country: String,
    /// Registry handle of the network
    #[serde(default)]
    pub handle: String,
    /// "v4" or "v6"
    #[serde(default, rename = "ipVersion")]
    pub ip_version: String,
    /// Network name
    #[serde(default)]
    pub name: String,
    /// Allocation type
    #[serde(default, rename = "type")]
    pub kind: String,
    /// Registry events in registry order
    #[serde(default)]
    pub events: Vec<RdapEvent>,
}

impl RdapInfo {
    /// Returns true if no field carries data.
    pub fn is_empty(&self) -> bool {
        self.country.is_empty()
            && self.handle.is_empty()
            && self.ip_version.is_empty()
            && self.name.is_empty()
            && self.kind.is_empty()
            && self.events.is_empty()
    }
}

/// A registry record together with the moment it was fetched.
///
/// `fetched_at` is only ever set from the clock at the moment a lookup
/// succeeded.
///
/// # Stored Format (JSON)
/// ```text
/// {"fetched_at": "<RFC 3339>", "info": { ...RdapInfo... }}
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedRdap {
    /// When the record was fetched (UTC)
    pub fetched_at: DateTime<Utc>,
    /// The fetched record
    pub info: RdapInfo,
}

impl CachedRdap {
    /// Pairs a record with its fetch time.
    pub fn new(info: RdapInfo, fetched_at: DateTime<Utc>) -> Self {
        Self { fetched_at, info }
    }

    /// Serializes the entry for storage under `address`.
    pub fn to_bytes(&self, address: &str) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| MyipError::CacheEncode {
            address: address.to_string(),
            reason: e.to_string(),
        })
    }

    /// Deserializes a stored entry for `address`.
    ///
    /// A payload that does not decode is an error, not a miss.
    pub fn from_bytes(address: &str, bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| MyipError::CacheDecode {
            address: address.to_string(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn make_test_info() -> RdapInfo {
        RdapInfo {
            country: "US".into(),
            handle: "NET-192-0-2-0-1".into(),
            ip_version: "v4".into(),
            name: "TEST-NET".into(),
            kind: "ASSIGNED".into(),
            events: vec![
                RdapEvent::new("registration", "1993-05-01T00:00:00Z"),
                RdapEvent::new("last changed", "2020-01-01T00:00:00Z"),
            ],
        }
    }

    #[test]
    fn test_default_is_empty() {
        assert!(RdapInfo::default().is_empty());
    }

    #[test]
    fn test_any_field_makes_non_empty() {
        let info = RdapInfo {
            kind: "ASSIGNED".into(),
            ..Default::default()
        };
        assert!(!info.is_empty());

        let info = RdapInfo {
            events: vec![RdapEvent::default()],
            ..Default::default()
        };
        assert!(!info.is_empty());
    }

    #[test]
    fn test_json_field_names() {
        let json = serde_json::to_value(make_test_info()).unwrap();
        assert_eq!(json["ipVersion"], "v4");
        assert_eq!(json["type"], "ASSIGNED");
        assert_eq!(json["events"][0]["action"], "registration");
        assert_eq!(json["events"][1]["date"], "2020-01-01T00:00:00Z");
    }

    #[test]
    fn test_cached_entry_preserves_event_order() {
        let fetched_at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let entry = CachedRdap::new(make_test_info(), fetched_at);

        let bytes = entry.to_bytes("192.0.2.1").unwrap();
        let decoded = CachedRdap::from_bytes("192.0.2.1", &bytes).unwrap();

        assert_eq!(decoded.fetched_at, fetched_at);
        assert_eq!(decoded.info.events[0].action, "registration");
        assert_eq!(decoded.info.events[1].action, "last changed");
    }

    #[test]
    fn test_corrupted_entry_is_decode_error() {
        let err = CachedRdap::from_bytes("192.0.2.1", b"{not json").unwrap_err();
        assert!(matches!(err, MyipError::CacheDecode { ref address, .. } if address == "192.0.2.1"));
    }

    #[test]
    fn test_entry_missing_fetched_at_is_decode_error() {
        let err = CachedRdap::from_bytes("192.0.2.1", br#"{"info":{}}"#).unwrap_err();
        assert!(matches!(err, MyipError::CacheDecode { .. }));
    }
}
