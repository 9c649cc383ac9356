// # whod
//
// Thin integration layer around `who_core`: it reads configuration,
// registers the DNS providers compiled in, and serves the directory over
// HTTP. No propagation logic lives here.

pub mod config;
pub mod routes;

use std::sync::Arc;
use who_core::{IpRegistry, Propagator, ProviderRegistry, WhoConfig};

/// Provider registry with every provider enabled at build time
pub fn provider_registry() -> ProviderRegistry {
    let registry = ProviderRegistry::new();

    #[cfg(feature = "route53")]
    {
        tracing::debug!("Registering Route53 provider");
        who_provider_route53::register(&registry);
    }

    registry
}

/// Build the propagation coordinator for a loaded configuration
pub fn build_propagator(config: &WhoConfig) -> Propagator {
    let providers = provider_registry();
    Propagator::from_config(Arc::new(IpRegistry::new()), config, &providers)
}
