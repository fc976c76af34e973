//! # myip Cache
//!
//! Registry record cache and call counters for the myip service.
//!
//! This crate provides the typed cache store and its backends:
//!
//! - **RdapStore**: `get_cached` / `set_cached` / `increment_count` keyed by address
//! - **Memory**: In-process backend for development, tests and single-node use
//! - **Redis**: Shared backend for production (feature `redis`)
//!
//! ## Example
//!
//! ```rust,ignore
//! use myip_cache::{MemoryBackend, RdapStore};
//!
//! let store = RdapStore::new(MemoryBackend::new());
//! let count = store.increment_count("192.0.2.1").await?;
//! let cached = store.get_cached("192.0.2.1").await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod memory;
#[cfg(feature = "redis")]
mod redis_backend;
mod store;

pub use memory::{MemoryBackend, MemoryConfig};
#[cfg(feature = "redis")]
pub use redis_backend::{RedisBackend, RedisConfig};
pub use store::RdapStore;

// Re-export the trait from core
pub use myip_core::traits::CacheBackend as Backend;
