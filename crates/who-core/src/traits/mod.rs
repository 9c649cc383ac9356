//! Core traits for the propagation subsystem
//!
//! - [`DnsProvider`]: Point a DNS record at an address via a provider API
//! - [`DnsProviderFactory`]: Build a provider from one configured entry

pub mod dns_provider;

pub use dns_provider::{DnsProvider, DnsProviderFactory, RecordType};
