// # who-core
//
// Change-propagation core for the who IP directory.
//
// ## Architecture Overview
//
// The directory maps short identifiers to IP addresses. Every change is
// pushed to the external systems that must stay in sync:
// - **IpRegistry**: Thread-safe identifier → IP map with change detection
// - **DnsProvider**: Trait for pointing a DNS record at an address
// - **ProviderRegistry**: Plugin-based registry for DNS providers
// - **DnsDispatcher**: Per-identifier DNS updates, one task per entry
// - **WebhookDispatcher**: Per-identifier HTTP callbacks with per-URL debounce
// - **Propagator**: Records a mapping and fans out when it changed
//
// ## Design Principles
//
// 1. **Fire-and-forget**: Callers never wait on network I/O
// 2. **Best-effort**: One attempt per change, no retries
// 3. **Isolation**: A failing provider or webhook never affects other entries
// 4. **Plugin-Based**: Providers are registered by name, no hard-coded match
// 5. **No I/O of its own**: Configuration arrives already parsed

pub mod config;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod registry;
pub mod state;
pub mod traits;

// Re-export core types for convenience
pub use config::{DispatchConfig, DnsEntryConfig, WebhookConfig, WhoConfig};
pub use dispatch::{DnsDispatcher, TaskSpawner, WebhookDispatcher};
pub use engine::Propagator;
pub use error::{Error, Result};
pub use registry::ProviderRegistry;
pub use state::IpRegistry;
pub use traits::{DnsProvider, DnsProviderFactory, RecordType};
