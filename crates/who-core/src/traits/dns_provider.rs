// # DNS Provider Trait
//
// Defines the capability every DNS provider exposes to the dispatcher:
// point one record at one address with one TTL.
//
// ## Implementations
//
// - Route53: `who-provider-route53` crate
//
// ## Usage
//
// ```rust,ignore
// use who_core::DnsProvider;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let provider = /* DnsProvider implementation */;
//
//     provider.update(
//         "home.example.com",
//         std::net::IpAddr::from([203, 0, 113, 5]),
//         300,
//     ).await?;
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::net::IpAddr;
use std::sync::Arc;

use crate::config::DnsEntryConfig;

/// DNS record type for an address record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    /// A record (IPv4)
    A,
    /// AAAA record (IPv6)
    Aaaa,
}

impl RecordType {
    /// Select the record type from the textual form of an address
    ///
    /// Anything containing a colon is treated as IPv6.
    pub fn for_address(ip: &str) -> Self {
        if ip.contains(':') {
            RecordType::Aaaa
        } else {
            RecordType::A
        }
    }

    /// Wire name of the record type
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
        }
    }
}

impl From<IpAddr> for RecordType {
    fn from(ip: IpAddr) -> Self {
        match ip {
            IpAddr::V4(_) => RecordType::A,
            IpAddr::V6(_) => RecordType::Aaaa,
        }
    }
}

impl std::fmt::Display for RecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trait for DNS provider implementations
///
/// # Thread Safety
///
/// Implementations are shared between concurrently running update tasks and
/// must be `Send + Sync`.
///
/// # Contract
///
/// - One call performs one upsert; no retries, no backoff
/// - Failures are returned, never panicked; the dispatcher logs them
/// - Secrets never appear in returned errors
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Point `domain` at `ip` with the given TTL
    ///
    /// # Parameters
    ///
    /// - `domain`: Record name, with or without the trailing dot
    /// - `ip`: The address the record should resolve to
    /// - `ttl`: Record TTL in seconds
    ///
    /// # Returns
    ///
    /// - `Ok(())`: The provider accepted the change
    /// - `Err(Error)`: Transport failure, rejected request, or signing failure
    async fn update(&self, domain: &str, ip: IpAddr, ttl: u32) -> Result<(), crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

/// Helper trait for constructing DNS providers from configuration
pub trait DnsProviderFactory: Send + Sync {
    /// Create a DnsProvider for one configured entry
    ///
    /// # Returns
    ///
    /// A shared provider, or a configuration error when the entry is
    /// unusable (e.g. missing credentials)
    fn create(&self, config: &DnsEntryConfig) -> Result<Arc<dyn DnsProvider>, crate::Error>;
}
