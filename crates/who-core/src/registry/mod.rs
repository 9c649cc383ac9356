//! Plugin-based provider registry
//!
//! The registry maps provider names found in configuration to factories, so
//! the DNS dispatcher can pick an implementation once at construction time
//! without a hard-coded match on provider names.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use who_core::registry::ProviderRegistry;
//!
//! let registry = ProviderRegistry::new();
//! who_provider_route53::register(&registry);
//!
//! let provider = registry.create_provider(&entry_config)?;
//! ```

use crate::config::DnsEntryConfig;
use crate::error::{Error, Result};
use crate::traits::{DnsProvider, DnsProviderFactory};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Provider registry for plugin-based DNS provider creation
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes.
#[derive(Default)]
pub struct ProviderRegistry {
    /// Registered DNS provider factories
    providers: RwLock<HashMap<String, Box<dyn DnsProviderFactory>>>,
}

impl ProviderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a DNS provider factory
    ///
    /// # Parameters
    ///
    /// - `name`: Provider name as written in configuration (e.g., "route53")
    /// - `factory`: Factory object for creating provider instances
    pub fn register_provider(&self, name: impl Into<String>, factory: Box<dyn DnsProviderFactory>) {
        let mut providers = self
            .providers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        providers.insert(name.into(), factory);
    }

    /// Create a DNS provider for one configured entry
    ///
    /// # Returns
    ///
    /// - `Ok(Arc<dyn DnsProvider>)`: Created provider instance
    /// - `Err(Error)`: If the provider name is not registered or the factory
    ///   rejects the entry
    pub fn create_provider(&self, config: &DnsEntryConfig) -> Result<Arc<dyn DnsProvider>> {
        let providers = self
            .providers
            .read()
            .unwrap_or_else(PoisonError::into_inner);

        let factory = providers
            .get(config.provider.as_str())
            .ok_or_else(|| Error::config(format!("Unknown provider type: {:?}", config.provider)))?;

        factory.create(config)
    }

    /// List all registered provider names
    pub fn list_providers(&self) -> Vec<String> {
        let providers = self
            .providers
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        providers.keys().cloned().collect()
    }

    /// Check if a provider name is registered
    pub fn has_provider(&self, name: &str) -> bool {
        let providers = self
            .providers
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        providers.contains_key(name)
    }
}
