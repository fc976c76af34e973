//! RDAP registry lookup for myip.
//!
//! Fetches the registration record of an IP address from an RDAP server
//! and reduces it to the fields myip serves.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod client;

pub use client::{RdapClient, RdapConfig};
