//! Fetch orchestrator: counting, caching and registry lookup for one address.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use myip_cache::RdapStore;
use myip_core::constants::REQUEST_DEADLINE_MS;
use myip_core::error::MyipError;
use myip_core::freshness::FreshnessPolicy;
use myip_core::traits::{CacheBackend, ErrorSink, NoopSink, RdapLookup};
use myip_core::types::{CachedRdap, FetchResponse, RdapInfo, RecordSource};

use crate::deadline::within;

/// Fetch service over a backend chosen at runtime.
pub type SharedFetchService = FetchService<Arc<dyn CacheBackend>>;

/// Composes the cache store, the freshness policy and an optional registry
/// lookup into one `fetch` operation.
///
/// Holds no per-request state; one instance serves concurrent requests.
pub struct FetchService<B> {
    store: RdapStore<B>,
    lookup: Option<Arc<dyn RdapLookup>>,
    sink: Arc<dyn ErrorSink>,
    policy: FreshnessPolicy,
    deadline: Duration,
}

impl<B: CacheBackend> FetchService<B> {
    /// Creates a service with no lookup configured and a no-op error sink.
    pub fn new(store: RdapStore<B>) -> Self {
        Self {
            store,
            lookup: None,
            sink: Arc::new(NoopSink),
            policy: FreshnessPolicy::default(),
            deadline: Duration::from_millis(REQUEST_DEADLINE_MS),
        }
    }

    /// Enables registry lookups.
    pub fn with_lookup(mut self, lookup: Arc<dyn RdapLookup>) -> Self {
        self.lookup = Some(lookup);
        self
    }

    /// Enables registry lookups if one is given; `None` disables them.
    pub fn with_optional_lookup(mut self, lookup: Option<Arc<dyn RdapLookup>>) -> Self {
        self.lookup = lookup;
        self
    }

    /// Sets the side channel for non-fatal errors.
    pub fn with_error_sink(mut self, sink: Arc<dyn ErrorSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Sets the freshness policy.
    pub fn with_policy(mut self, policy: FreshnessPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the deadline `fetch` applies when the caller supplies none.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Returns the cache store.
    pub fn store(&self) -> &RdapStore<B> {
        &self.store
    }

    /// Returns true if registry lookups are enabled.
    pub fn lookup_enabled(&self) -> bool {
        self.lookup.is_some()
    }

    /// Fetches the response for `address` under the default deadline.
    pub async fn fetch(&self, address: &str) -> FetchResponse {
        self.fetch_until(address, Instant::now() + self.deadline).await
    }

    /// Fetches the response for `address`; every downstream call is bounded
    /// by `deadline`.
    ///
    /// Never fails. Counting, cache and lookup failures are reported through
    /// the error sink and degrade the response instead.
    #[instrument(skip(self, deadline))]
    pub async fn fetch_until(&self, address: &str, deadline: Instant) -> FetchResponse {
        let (count, count_error) =
            match within(deadline, "increment count", self.store.increment_count(address)).await {
                Ok(count) => (count, None),
                Err(err) => {
                    self.report(&err);
                    (0, Some(err))
                }
            };

        let Some(lookup) = &self.lookup else {
            debug!(address, count, "Registry lookup disabled");
            return FetchResponse::new(address, count, RdapInfo::default()).with_error(count_error);
        };

        let cached = match within(deadline, "cache read", self.store.get_cached(address)).await {
            Ok(cached) => cached,
            Err(err) => {
                self.report(&err);
                None
            }
        };

        let (info, source) = match cached {
            Some(entry) if !self.policy.needs_refresh(Some(entry.fetched_at)) => {
                debug!(address, fetched_at = %entry.fetched_at, "Serving cached record");
                (entry.info, RecordSource::Cache)
            }
            cached => self.refresh(lookup.as_ref(), address, cached, deadline).await,
        };

        FetchResponse::new(address, count, info)
            .with_source(source)
            .with_error(count_error)
    }

    /// Calls the lookup; persists on success, falls back to `cached` on failure.
    async fn refresh(
        &self,
        lookup: &dyn RdapLookup,
        address: &str,
        cached: Option<CachedRdap>,
        deadline: Instant,
    ) -> (RdapInfo, RecordSource) {
        match within(deadline, "registry lookup", lookup.lookup(address)).await {
            Ok(fetched) => {
                let fetched_at = Utc::now();
                if let Err(err) = within(
                    deadline,
                    "cache write",
                    self.store.set_cached(address, &fetched, fetched_at),
                )
                .await
                {
                    self.report(&err);
                }
                info!(address, "Refreshed registry record");
                (fetched, RecordSource::Lookup)
            }
            Err(err) => {
                self.report(&err);
                match cached {
                    Some(entry) => {
                        warn!(address, fetched_at = %entry.fetched_at, "Lookup failed, serving stale record");
                        (entry.info, RecordSource::StaleCache)
                    }
                    None => (RdapInfo::default(), RecordSource::Unavailable),
                }
            }
        }
    }

    /// Hands `err` to the sink; a panicking sink is contained.
    fn report(&self, err: &MyipError) {
        if catch_unwind(AssertUnwindSafe(|| self.sink.report(err))).is_err() {
            warn!(error = %err, "Error sink panicked");
        }
    }
}
