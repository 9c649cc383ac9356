//! Configuration types for the propagation core
//!
//! The core never touches the filesystem. A loader outside the core reads the
//! JSON document and hands the parsed [`WhoConfig`] to the dispatchers.
//!
//! ## File Format
//!
//! ```json
//! {
//!   "ddns": [
//!     {
//!       "provider": "route53",
//!       "domain": "home.example.com",
//!       "iam": "alice",
//!       "access_key": "AKIA...",
//!       "secret_key": "...",
//!       "zone_id": "Z123",
//!       "ttl": 60
//!     }
//!   ],
//!   "webhooks": [
//!     {
//!       "iam": "alice",
//!       "url": "https://hooks.example.com/ip",
//!       "headers": { "X-Token": "abc" },
//!       "timeout": 10,
//!       "debounce": 5
//!     }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Default record TTL in seconds
pub const DEFAULT_TTL: u32 = 300;

/// Default webhook HTTP method
pub const DEFAULT_WEBHOOK_METHOD: &str = "POST";

/// Default webhook request timeout
pub const DEFAULT_WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

/// Upper bound for any configured webhook timeout
pub const MAX_WEBHOOK_TIMEOUT: Duration = Duration::from_secs(30);

/// Default minimum interval between successful deliveries to one URL
pub const DEFAULT_WEBHOOK_DEBOUNCE: Duration = Duration::from_secs(5);

/// Top-level configuration consumed by the propagation core
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WhoConfig {
    /// DNS updates to perform when an identifier changes
    #[serde(default)]
    pub ddns: Vec<DnsEntryConfig>,

    /// Webhooks to call when an identifier changes
    #[serde(default)]
    pub webhooks: Vec<WebhookConfig>,

    /// Fan-out settings shared by both dispatchers
    #[serde(default)]
    pub dispatch: DispatchConfig,
}

impl WhoConfig {
    /// Parse a configuration document
    pub fn from_json(input: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(input)?)
    }

    /// Whether no DNS entries and no webhooks are configured
    pub fn is_empty(&self) -> bool {
        self.ddns.is_empty() && self.webhooks.is_empty()
    }
}

/// One configured DNS update
///
/// The credentials are opaque to the core and only read by the provider
/// factory named in `provider`.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct DnsEntryConfig {
    /// Provider name (e.g. "route53")
    #[serde(default)]
    pub provider: String,

    /// Record name to keep pointed at the identifier's IP
    #[serde(default)]
    pub domain: String,

    /// IP version hint; record type is detected from the address instead
    #[serde(default)]
    pub ip_version: String,

    /// Identifier whose changes drive this update
    #[serde(default)]
    pub iam: String,

    /// Provider access key id
    #[serde(default)]
    pub access_key: String,

    /// Provider secret key
    /// ⚠️ NEVER log this value
    #[serde(default)]
    pub secret_key: String,

    /// Hosted zone id
    #[serde(default)]
    pub zone_id: String,

    /// Record TTL in seconds; non-positive means [`DEFAULT_TTL`]
    #[serde(default)]
    pub ttl: i64,
}

impl DnsEntryConfig {
    /// TTL to send to the provider
    pub fn effective_ttl(&self) -> u32 {
        if self.ttl <= 0 {
            DEFAULT_TTL
        } else {
            u32::try_from(self.ttl).unwrap_or(u32::MAX)
        }
    }
}

// Custom Debug implementation that hides the credentials
impl std::fmt::Debug for DnsEntryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DnsEntryConfig")
            .field("provider", &self.provider)
            .field("domain", &self.domain)
            .field("ip_version", &self.ip_version)
            .field("iam", &self.iam)
            .field("access_key", &"<REDACTED>")
            .field("secret_key", &"<REDACTED>")
            .field("zone_id", &self.zone_id)
            .field("ttl", &self.ttl)
            .finish()
    }
}

/// One configured webhook
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Identifier whose changes drive this webhook
    #[serde(default)]
    pub iam: String,

    /// Destination URL
    #[serde(default)]
    pub url: String,

    /// HTTP method; empty means POST
    #[serde(default)]
    pub method: String,

    /// Extra headers, applied after the default Content-Type
    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// Request timeout in seconds
    #[serde(default)]
    pub timeout: i64,

    /// Debounce interval in seconds
    #[serde(default)]
    pub debounce: i64,
}

impl WebhookConfig {
    /// HTTP method to use, upper-cased
    pub fn effective_method(&self) -> String {
        let method = self.method.trim();
        if method.is_empty() {
            DEFAULT_WEBHOOK_METHOD.to_string()
        } else {
            method.to_ascii_uppercase()
        }
    }

    /// Request timeout, defaulted and clamped to [`MAX_WEBHOOK_TIMEOUT`]
    pub fn effective_timeout(&self) -> Duration {
        if self.timeout <= 0 {
            return DEFAULT_WEBHOOK_TIMEOUT;
        }
        Duration::from_secs(self.timeout as u64).min(MAX_WEBHOOK_TIMEOUT)
    }

    /// Debounce interval, defaulted when non-positive
    pub fn effective_debounce(&self) -> Duration {
        if self.debounce <= 0 {
            DEFAULT_WEBHOOK_DEBOUNCE
        } else {
            Duration::from_secs(self.debounce as u64)
        }
    }
}

/// Fan-out settings
///
/// Spawning is unbounded by default: a burst of identifier changes can put
/// any number of outbound calls in flight. Setting `max_in_flight` caps each
/// dispatcher and drops work past the cap.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Maximum concurrently running tasks per dispatcher
    #[serde(default)]
    pub max_in_flight: Option<usize>,
}
