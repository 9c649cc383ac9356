//! Change fan-out to external systems
//!
//! - [`DnsDispatcher`]: per-identifier DNS updates via a [`crate::DnsProvider`]
//! - [`WebhookDispatcher`]: per-identifier HTTP callbacks with per-URL debounce
//! - [`TaskSpawner`]: fire-and-forget submission, optionally capped

pub mod debounce;
pub mod dns;
pub mod spawner;
pub mod webhook;

pub use debounce::DebounceTracker;
pub use dns::{DnsDispatcher, DnsUpdateEntry};
pub use spawner::TaskSpawner;
pub use webhook::{WebhookDispatcher, WebhookEntry, WebhookPayload};
