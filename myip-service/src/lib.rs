//! # myip Service
//!
//! The fetch orchestration: for one address, count the request, then serve
//! the best registry record available from the cache, a fresh lookup, or a
//! stale fallback.
//!
//! ## Flow
//!
//! ```text
//! increment count ─▶ lookup configured? ─no─▶ respond (empty record)
//!                          │ yes
//!                          ▼
//!                    read cache ─ fresh hit ─▶ respond (cached)
//!                          │ miss / stale / read error
//!                          ▼
//!                     lookup ─ ok ─▶ write cache ─▶ respond (fetched)
//!                          │ error
//!                          ▼
//!                    respond (stale cached record, or empty)
//! ```
//!
//! Nothing in this flow fails the request. Every degradation is reported
//! through the [`ErrorSink`](myip_core::ErrorSink) and absorbed.
//!
//! Concurrent fetches of the same address may both refresh and both write
//! the cache; the last write wins. Lookups are not deduplicated.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod deadline;
mod service;
mod sink;

pub use deadline::within;
pub use service::{FetchService, SharedFetchService};
pub use sink::TracingSink;
