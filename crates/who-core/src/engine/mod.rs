//! Propagation coordinator
//!
//! The [`Propagator`] is the single entry point for callers outside the core.
//! It is responsible for:
//! - Recording identifier → IP mappings in the [`IpRegistry`]
//! - Triggering DNS and webhook fan-out when a mapping actually changes
//! - Serving lookups
//!
//! ## Architecture
//!
//! ```text
//!  record(id, ip)
//!        │
//!        ▼
//! ┌──────────────┐   changed && !id.is_empty()
//! │  IpRegistry  │─────────────────────────────┐
//! └──────────────┘                             │
//!                               ┌──────────────┴──────────────┐
//!                               ▼                             ▼
//!                      ┌───────────────┐            ┌───────────────────┐
//!                      │ DnsDispatcher │            │ WebhookDispatcher │
//!                      └───────────────┘            └───────────────────┘
//!                               │ spawn                       │ spawn
//!                               ▼                             ▼
//!                         provider.update()             HTTP delivery
//! ```
//!
//! `record` returns as soon as the tasks are spawned. Two quick changes to
//! the same identifier may produce overlapping tasks whose completion order
//! is not guaranteed to match call order.

use std::net::IpAddr;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::WhoConfig;
use crate::dispatch::{DnsDispatcher, TaskSpawner, WebhookDispatcher};
use crate::registry::ProviderRegistry;
use crate::state::IpRegistry;

/// Records mappings and propagates changes
///
/// ## Threading
///
/// All methods take `&self`; share the propagator behind an `Arc`. Calls
/// that trigger fan-out must run inside a tokio runtime.
#[derive(Debug)]
pub struct Propagator {
    /// Live identifier → IP directory
    registry: Arc<IpRegistry>,

    /// DNS fan-out, absent when nothing is configured
    dns: Option<DnsDispatcher>,

    /// Webhook fan-out, absent when nothing is configured
    webhooks: Option<WebhookDispatcher>,
}

impl Propagator {
    /// Create a propagator with no dispatchers attached
    pub fn new(registry: Arc<IpRegistry>) -> Self {
        Self {
            registry,
            dns: None,
            webhooks: None,
        }
    }

    /// Attach a DNS dispatcher
    pub fn with_dns(mut self, dispatcher: DnsDispatcher) -> Self {
        self.dns = Some(dispatcher);
        self
    }

    /// Attach a webhook dispatcher
    pub fn with_webhooks(mut self, dispatcher: WebhookDispatcher) -> Self {
        self.webhooks = Some(dispatcher);
        self
    }

    /// Build a propagator and both dispatchers from configuration
    ///
    /// A dispatcher is only attached when its section lists at least one
    /// entry.
    pub fn from_config(
        registry: Arc<IpRegistry>,
        config: &WhoConfig,
        providers: &ProviderRegistry,
    ) -> Self {
        let mut propagator = Self::new(registry);

        if !config.ddns.is_empty() {
            let spawner = TaskSpawner::from_config("dns", &config.dispatch);
            let dispatcher = DnsDispatcher::with_spawner(&config.ddns, providers, spawner);
            info!("DDNS: loaded {} of {} entries", dispatcher.len(), config.ddns.len());
            propagator = propagator.with_dns(dispatcher);
        }

        if !config.webhooks.is_empty() {
            let spawner = TaskSpawner::from_config("webhook", &config.dispatch);
            let dispatcher = WebhookDispatcher::with_spawner(&config.webhooks, spawner);
            info!(
                "Webhooks: loaded {} of {} entries",
                dispatcher.len(),
                config.webhooks.len()
            );
            propagator = propagator.with_webhooks(dispatcher);
        }

        propagator
    }

    /// Record that `identifier` now maps to `ip`
    ///
    /// Returns whether the mapping changed. Only a change on a non-empty
    /// identifier triggers fan-out; the call never waits for it.
    pub fn record(&self, identifier: &str, ip: IpAddr) -> bool {
        let changed = self.registry.set(identifier, ip);
        if !changed {
            debug!("{} already maps to {}, nothing to propagate", identifier, ip);
            return false;
        }
        if identifier.is_empty() {
            return true;
        }

        let ip = ip.to_canonical();
        info!("{} now maps to {}", identifier, ip);

        if let Some(dns) = &self.dns {
            dns.trigger(identifier, ip);
        }
        if let Some(webhooks) = &self.webhooks {
            webhooks.trigger(identifier, ip);
        }

        true
    }

    /// Address currently mapped to `identifier`
    pub fn lookup(&self, identifier: &str) -> Option<IpAddr> {
        self.registry.get(identifier)
    }

    /// The underlying directory
    pub fn registry(&self) -> &Arc<IpRegistry> {
        &self.registry
    }

    /// Attached DNS dispatcher, if any
    pub fn dns(&self) -> Option<&DnsDispatcher> {
        self.dns.as_ref()
    }

    /// Attached webhook dispatcher, if any
    pub fn webhooks(&self) -> Option<&WebhookDispatcher> {
        self.webhooks.as_ref()
    }
}
