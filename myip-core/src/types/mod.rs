//! Domain types for myip.
//!
//! - [`RdapInfo`]: Registry record for an address
//! - [`RdapEvent`]: One registry event, order-preserving
//! - [`CachedRdap`]: A registry record paired with the moment it was fetched
//! - [`FetchResponse`]: What one orchestration hands back to the caller

mod record;
mod response;

pub use record::*;
pub use response::*;
