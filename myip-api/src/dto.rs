//! DTOs for API responses.

use serde::Serialize;

use myip_core::types::{FetchResponse, RdapEvent};

/// JSON body of a lookup response.
#[derive(Debug, Serialize)]
pub struct ApiResponse {
    /// Client address
    pub ip: String,
    /// Requests seen from this address
    pub count_call: i64,
    /// Registry country code
    pub country: String,
    /// Registry handle
    pub handle: String,
    /// "v4" or "v6"
    #[serde(rename = "ipVersion")]
    pub ip_version: String,
    /// Network name
    pub name: String,
    /// Allocation type
    #[serde(rename = "type")]
    pub kind: String,
    /// Registry events
    pub events: Vec<RdapEvent>,
}

impl From<FetchResponse> for ApiResponse {
    fn from(response: FetchResponse) -> Self {
        let rdap = response.rdap;
        Self {
            ip: response.ip,
            count_call: response.count_call,
            country: rdap.country,
            handle: rdap.handle,
            ip_version: rdap.ip_version,
            name: rdap.name,
            kind: rdap.kind,
            events: response.events,
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "ok"
    pub status: String,
    /// Server version
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use myip_core::types::RdapInfo;

    #[test]
    fn test_api_response_shape() {
        let info = RdapInfo {
            country: "US".into(),
            handle: "NET-192-0-2-0-1".into(),
            ip_version: "v4".into(),
            name: "TEST-NET".into(),
            kind: "ASSIGNED".into(),
            events: vec![RdapEvent::new("registration", "1993-05-01T00:00:00Z")],
        };
        let body = ApiResponse::from(FetchResponse::new("192.0.2.1", 4, info));

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "ip": "192.0.2.1",
                "count_call": 4,
                "country": "US",
                "handle": "NET-192-0-2-0-1",
                "ipVersion": "v4",
                "name": "TEST-NET",
                "type": "ASSIGNED",
                "events": [{"action": "registration", "date": "1993-05-01T00:00:00Z"}]
            })
        );
    }

    #[test]
    fn test_empty_record_keeps_every_field() {
        let body = ApiResponse::from(FetchResponse::new("unknown", 0, RdapInfo::default()));
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["country"], "");
        assert_eq!(json["events"], serde_json::json!([]));
    }
}
