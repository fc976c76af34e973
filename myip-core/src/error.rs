//! Error types for myip.
//!
//! This module provides the error hierarchy using `thiserror`.
//! Inside the fetch orchestration every one of these is non-fatal: it is
//! reported through the error sink and the response degrades instead.

use thiserror::Error;

/// Result type alias using `MyipError`.
pub type Result<T> = std::result::Result<T, MyipError>;

/// Main error type for all myip operations.
#[derive(Debug, Error)]
pub enum MyipError {
    // ═══════════════════════════════════════════════════════════════════════════
    // CACHE BACKEND ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// The key-value backend could not be reached.
    #[error("Cache backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The backend was reachable but the command failed.
    #[error("Cache backend error during {operation}: {reason}")]
    Backend {
        /// The backend command that failed (get, set, incr, ping).
        operation: &'static str,
        /// Backend-provided reason.
        reason: String,
    },

    /// A cache entry could not be serialized.
    #[error("Failed to encode cache entry for '{address}': {reason}")]
    CacheEncode {
        /// Address whose entry was being written.
        address: String,
        /// Serializer reason.
        reason: String,
    },

    /// A stored cache entry is corrupted.
    #[error("Failed to decode cache entry for '{address}': {reason}")]
    CacheDecode {
        /// Address whose entry was being read.
        address: String,
        /// Deserializer reason.
        reason: String,
    },

    // ═══════════════════════════════════════════════════════════════════════════
    // REGISTRY LOOKUP ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// RDAP URL template does not contain the address placeholder.
    #[error("RDAP API template missing {{REMOTE_IP}}: {0}")]
    TemplateMissingPlaceholder(String),

    /// RDAP request could not be sent or the connection failed.
    #[error("RDAP lookup failed for '{address}': {reason}")]
    Lookup {
        /// Address being looked up.
        address: String,
        /// Transport reason.
        reason: String,
    },

    /// RDAP server answered with a non-success status.
    #[error("RDAP lookup for '{address}' returned unexpected status {status}")]
    LookupStatus {
        /// Address being looked up.
        address: String,
        /// HTTP status code.
        status: u16,
    },

    /// RDAP response body could not be decoded.
    #[error("Failed to decode RDAP response for '{address}': {reason}")]
    LookupDecode {
        /// Address being looked up.
        address: String,
        /// Decoder reason.
        reason: String,
    },

    // ═══════════════════════════════════════════════════════════════════════════
    // DEADLINES
    // ═══════════════════════════════════════════════════════════════════════════

    /// The caller's deadline elapsed before the operation completed.
    #[error("Deadline exceeded during {operation}")]
    DeadlineExceeded {
        /// The downstream call that was cut off.
        operation: &'static str,
    },

    // ═══════════════════════════════════════════════════════════════════════════
    // SERIALIZATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    // ═══════════════════════════════════════════════════════════════════════════
    // CONFIGURATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl MyipError {
    /// Returns true if a later request may succeed where this one failed.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            MyipError::BackendUnavailable(_)
                | MyipError::Lookup { .. }
                | MyipError::LookupStatus { .. }
                | MyipError::DeadlineExceeded { .. }
        )
    }

    /// Returns true if this error originated in the cache backend or codec.
    pub fn is_cache_error(&self) -> bool {
        matches!(
            self,
            MyipError::BackendUnavailable(_)
                | MyipError::Backend { .. }
                | MyipError::CacheEncode { .. }
                | MyipError::CacheDecode { .. }
        )
    }

    /// Returns true if this error originated in the registry lookup.
    pub fn is_lookup_error(&self) -> bool {
        matches!(
            self,
            MyipError::TemplateMissingPlaceholder(_)
                | MyipError::Lookup { .. }
                | MyipError::LookupStatus { .. }
                | MyipError::LookupDecode { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MyipError::LookupStatus {
            address: "1.2.3.4".into(),
            status: 503,
        };
        assert!(err.to_string().contains("1.2.3.4"));
        assert!(err.to_string().contains("503"));

        let err = MyipError::TemplateMissingPlaceholder("https://rdap.test/ip/".into());
        assert!(err.to_string().contains("{REMOTE_IP}"));
    }

    #[test]
    fn test_error_classification() {
        assert!(MyipError::BackendUnavailable("down".into()).is_recoverable());
        assert!(MyipError::DeadlineExceeded { operation: "lookup" }.is_recoverable());
        assert!(!MyipError::ConfigError("bad".into()).is_recoverable());

        assert!(MyipError::CacheDecode {
            address: "::1".into(),
            reason: "eof".into(),
        }
        .is_cache_error());
        assert!(!MyipError::Lookup {
            address: "::1".into(),
            reason: "refused".into(),
        }
        .is_cache_error());

        assert!(MyipError::LookupDecode {
            address: "::1".into(),
            reason: "eof".into(),
        }
        .is_lookup_error());
        assert!(!MyipError::BackendUnavailable("down".into()).is_lookup_error());
    }

    #[test]
    fn test_json_error_conversion() {
        let json_result: std::result::Result<serde_json::Value, _> = serde_json::from_str("invalid");
        let myip_result: Result<serde_json::Value> = json_result.map_err(MyipError::from);
        assert!(matches!(myip_result, Err(MyipError::JsonError(_))));
    }
}
