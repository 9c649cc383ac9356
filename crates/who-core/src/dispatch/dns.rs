//! DNS fan-out
//!
//! Holds, per identifier, the DNS updates to perform when that identifier's
//! address changes. The index is built once and never mutated afterwards, so
//! triggers read it without locking.
//!
//! ## Flow
//!
//! ```text
//! trigger("alice", ip)
//!     │
//!     ├── entry home.example.com ──► spawn provider.update(...)
//!     └── entry vpn.example.org  ──► spawn provider.update(...)
//! ```
//!
//! Each update runs in its own task; a failing entry never affects the
//! others, and nothing is retried.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::spawner::TaskSpawner;
use crate::config::DnsEntryConfig;
use crate::registry::ProviderRegistry;
use crate::traits::DnsProvider;

/// A configured DNS update bound to its provider
pub struct DnsUpdateEntry {
    /// Identifier whose changes drive this update
    pub identifier: String,

    /// Record name
    pub domain: String,

    /// IP version hint from configuration (informational)
    pub ip_version: String,

    /// Record TTL in seconds
    pub ttl: u32,

    /// Provider performing the update
    pub provider: Arc<dyn DnsProvider>,
}

impl std::fmt::Debug for DnsUpdateEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DnsUpdateEntry")
            .field("identifier", &self.identifier)
            .field("domain", &self.domain)
            .field("ip_version", &self.ip_version)
            .field("ttl", &self.ttl)
            .field("provider", &self.provider.provider_name())
            .finish()
    }
}

/// Fans one identifier change out to every DNS entry configured for it
#[derive(Debug)]
pub struct DnsDispatcher {
    /// Entries keyed by identifier; several entries may share one identifier
    entries: HashMap<String, Vec<Arc<DnsUpdateEntry>>>,

    /// Submits the update tasks
    spawner: TaskSpawner,
}

impl DnsDispatcher {
    /// Build a dispatcher from configuration with unbounded fan-out
    ///
    /// Construction never fails: entries with an empty identifier, an
    /// unregistered provider, or credentials the provider rejects are
    /// dropped with a warning.
    pub fn new(configs: &[DnsEntryConfig], providers: &ProviderRegistry) -> Self {
        Self::with_spawner(configs, providers, TaskSpawner::unbounded("dns"))
    }

    /// Build a dispatcher from configuration using the given spawner
    pub fn with_spawner(
        configs: &[DnsEntryConfig],
        providers: &ProviderRegistry,
        spawner: TaskSpawner,
    ) -> Self {
        let mut entries = Vec::with_capacity(configs.len());

        for config in configs {
            if config.iam.is_empty() {
                warn!("Skipping DNS entry for {:?}: empty identifier", config.domain);
                continue;
            }

            let provider = match providers.create_provider(config) {
                Ok(provider) => provider,
                Err(e) => {
                    warn!(
                        "Skipping DNS entry {:?} for identifier {:?}: {}",
                        config.domain, config.iam, e
                    );
                    continue;
                }
            };

            entries.push(DnsUpdateEntry {
                identifier: config.iam.clone(),
                domain: config.domain.clone(),
                ip_version: config.ip_version.clone(),
                ttl: config.effective_ttl(),
                provider,
            });
        }

        Self::from_entries(entries, spawner)
    }

    /// Build a dispatcher from already-resolved entries
    pub fn from_entries(entries: Vec<DnsUpdateEntry>, spawner: TaskSpawner) -> Self {
        let mut index: HashMap<String, Vec<Arc<DnsUpdateEntry>>> = HashMap::new();
        for entry in entries {
            if entry.identifier.is_empty() {
                warn!("Skipping DNS entry for {:?}: empty identifier", entry.domain);
                continue;
            }
            index
                .entry(entry.identifier.clone())
                .or_default()
                .push(Arc::new(entry));
        }

        Self {
            entries: index,
            spawner,
        }
    }

    /// Entries configured for `identifier`
    pub fn entries_for(&self, identifier: &str) -> &[Arc<DnsUpdateEntry>] {
        self.entries
            .get(identifier)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Total number of entries across all identifiers
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Check if no entries survived construction
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Start one update per entry configured for `identifier`
    ///
    /// Returns as soon as the tasks are spawned, with the number of tasks
    /// started. Unknown identifiers are a no-op.
    pub fn trigger(&self, identifier: &str, ip: IpAddr) -> usize {
        let entries = self.entries_for(identifier);
        if entries.is_empty() {
            debug!("No DNS entries for identifier {}", identifier);
            return 0;
        }

        let mut spawned = 0;
        for entry in entries {
            let entry = Arc::clone(entry);
            let started = self.spawner.spawn(async move {
                info!(
                    "Updating {} -> {} for identifier {} via {}",
                    entry.domain,
                    ip,
                    entry.identifier,
                    entry.provider.provider_name()
                );
                match entry.provider.update(&entry.domain, ip, entry.ttl).await {
                    Ok(()) => info!("Updated {} -> {}", entry.domain, ip),
                    Err(e) => error!("Failed to update {}: {}", entry.domain, e),
                }
            });
            if started {
                spawned += 1;
            }
        }
        spawned
    }
}
