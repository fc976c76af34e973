//! Freshness policy for cached registry records.
//!
//! Pure: maps a record's fetch time to a refresh decision.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::constants::{CACHE_TTL_SECS, REFRESH_AFTER_SECS};
use crate::error::{MyipError, Result};

/// Refresh threshold and retention window for cached records.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FreshnessPolicy {
    refresh_after: Duration,
    retention: Duration,
}

impl Default for FreshnessPolicy {
    fn default() -> Self {
        Self {
            refresh_after: Duration::from_secs(REFRESH_AFTER_SECS),
            retention: Duration::from_secs(CACHE_TTL_SECS),
        }
    }
}

impl FreshnessPolicy {
    /// Creates a policy.
    ///
    /// Retention must be strictly longer than the refresh threshold, otherwise
    /// a refresh-eligible record could never serve as a fallback.
    pub fn new(refresh_after: Duration, retention: Duration) -> Result<Self> {
        if retention <= refresh_after {
            return Err(MyipError::ConfigError(format!(
                "cache retention ({}s) must exceed refresh threshold ({}s)",
                retention.as_secs(),
                refresh_after.as_secs()
            )));
        }
        Ok(Self {
            refresh_after,
            retention,
        })
    }

    /// Age at which a record becomes refresh-eligible.
    pub fn refresh_after(&self) -> Duration {
        self.refresh_after
    }

    /// How long the backend keeps a cache entry.
    pub fn retention(&self) -> Duration {
        self.retention
    }

    /// Decides against the current clock.
    pub fn needs_refresh(&self, fetched_at: Option<DateTime<Utc>>) -> bool {
        self.needs_refresh_at(fetched_at, Utc::now())
    }

    /// Decides against an explicit `now`.
    ///
    /// Absent or zero (at or before the Unix epoch) timestamps always need a
    /// refresh. A timestamp in the future counts as fresh.
    pub fn needs_refresh_at(&self, fetched_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        let Some(fetched_at) = fetched_at else {
            return true;
        };
        if fetched_at.timestamp() <= 0 {
            return true;
        }
        match (now - fetched_at).to_std() {
            Ok(age) => age >= self.refresh_after,
            Err(_) => false,
        }
    }
}

/// Decides with the default 24 hour threshold against the current clock.
pub fn needs_refresh(fetched_at: Option<DateTime<Utc>>) -> bool {
    FreshnessPolicy::default().needs_refresh(fetched_at)
}
