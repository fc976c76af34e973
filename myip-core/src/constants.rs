//! Service constants for myip.
//!
//! The refresh threshold and the cache retention window are independent.
//! Retention must outlive the refresh threshold so that a record which has
//! become refresh-eligible can still be served when the refresh fails.

// ═══════════════════════════════════════════════════════════════════════════════
// CACHE WINDOWS
// ═══════════════════════════════════════════════════════════════════════════════

/// Age in seconds after which a cached registry record should be refreshed (24 hours).
pub const REFRESH_AFTER_SECS: u64 = 24 * 60 * 60;

/// How long a cache entry is retained by the backend, in seconds (7 days).
pub const CACHE_TTL_SECS: u64 = 7 * 24 * 60 * 60;

const _: () = assert!(CACHE_TTL_SECS > REFRESH_AFTER_SECS);

// ═══════════════════════════════════════════════════════════════════════════════
// KEY NAMESPACES
// ═══════════════════════════════════════════════════════════════════════════════

/// Prefix of the key holding the serialized cache entry for an address.
pub const CACHE_KEY_PREFIX: &str = "rdap:";

/// Prefix of the key holding the call counter for an address.
pub const COUNT_KEY_PREFIX: &str = "count:";

/// Builds the cache-entry key for an address.
pub fn cache_key(address: &str) -> String {
    format!("{CACHE_KEY_PREFIX}{address}")
}

/// Builds the call-counter key for an address.
pub fn count_key(address: &str) -> String {
    format!("{COUNT_KEY_PREFIX}{address}")
}

// ═══════════════════════════════════════════════════════════════════════════════
// REGISTRY LOOKUP
// ═══════════════════════════════════════════════════════════════════════════════

/// Placeholder replaced by the address in the RDAP URL template.
pub const REMOTE_IP_PLACEHOLDER: &str = "{REMOTE_IP}";

/// Transport timeout of a single RDAP request, in seconds.
pub const RDAP_REQUEST_TIMEOUT_SECS: u64 = 5;

// ═══════════════════════════════════════════════════════════════════════════════
// REQUEST HANDLING
// ═══════════════════════════════════════════════════════════════════════════════

/// Deadline applied to one inbound request's orchestration, in milliseconds.
pub const REQUEST_DEADLINE_MS: u64 = 3_000;
