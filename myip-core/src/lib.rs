//! # myip Core
//!
//! Core types, errors, and capability traits for the myip address-info service.
//!
//! This crate provides the foundational building blocks used by all other myip crates:
//!
//! - **Types**: Registry records, cache entries, and the fetch response
//! - **Errors**: One error hierarchy covering every degradation the service absorbs
//! - **Constants**: Key namespaces, cache windows and timeouts
//! - **Traits**: The registry lookup, cache backend and error sink capabilities
//! - **Freshness**: The rule deciding when a cached record must be refreshed
//!
//! ## Example
//!
//! ```rust
//! use myip_core::{needs_refresh, RdapInfo};
//!
//! let info = RdapInfo::default();
//! assert!(info.is_empty());
//! assert!(needs_refresh(None));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod constants;
pub mod error;
pub mod freshness;
pub mod traits;
pub mod types;

// Re-export commonly used items at crate root
pub use constants::*;
pub use error::{MyipError, Result};
pub use freshness::{needs_refresh, FreshnessPolicy};
pub use traits::*;
pub use types::*;
