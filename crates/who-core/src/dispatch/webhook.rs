//! Webhook fan-out
//!
//! Holds, per identifier, the webhooks to call when that identifier's
//! address changes, and gates each call on a per-URL debounce window.
//!
//! ## Delivery
//!
//! ```http
//! POST <url>
//! Content-Type: application/json
//! <custom headers>
//!
//! {"iam": "bob", "ip": "192.0.2.9", "timestamp": "2026-01-01T00:00:00Z"}
//! ```
//!
//! A 2xx response records the delivery time against the URL. Anything else
//! is logged and leaves the debounce state untouched, so the next change is
//! not held back by a failed attempt. Nothing is retried.

use chrono::{SecondsFormat, Utc};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::debounce::DebounceTracker;
use super::spawner::TaskSpawner;
use crate::config::WebhookConfig;
use crate::error::{Error, Result};

/// Body sent to every webhook destination
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookPayload {
    /// Identifier that changed
    #[serde(rename = "iam")]
    pub identifier: String,

    /// New address, textual form
    pub ip: String,

    /// Send time, RFC3339 UTC
    pub timestamp: String,
}

impl WebhookPayload {
    /// Payload stamped with the current time
    pub fn new(identifier: impl Into<String>, ip: IpAddr) -> Self {
        Self {
            identifier: identifier.into(),
            ip: ip.to_string(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

/// A configured webhook, validated and defaulted
#[derive(Debug, Clone)]
pub struct WebhookEntry {
    /// Identifier whose changes drive this webhook
    pub identifier: String,

    /// Destination URL, also the debounce key
    pub url: String,

    /// HTTP method
    pub method: Method,

    /// Headers sent with every delivery, Content-Type included
    pub headers: HeaderMap,

    /// Per-request timeout
    pub timeout: Duration,

    /// Minimum time between successful deliveries to `url`
    pub debounce: Duration,
}

impl WebhookEntry {
    /// Validate one configured webhook
    ///
    /// Custom headers are applied over the default
    /// `Content-Type: application/json`; header names compare
    /// case-insensitively, so a custom `content-type` replaces it.
    pub fn from_config(config: &WebhookConfig) -> Result<Self> {
        if config.iam.is_empty() || config.url.is_empty() {
            return Err(Error::config("webhook entry needs both iam and url"));
        }

        reqwest::Url::parse(&config.url)
            .map_err(|e| Error::config(format!("invalid webhook url {:?}: {}", config.url, e)))?;

        let method_name = config.effective_method();
        let method = Method::from_bytes(method_name.as_bytes())
            .map_err(|_| Error::config(format!("invalid webhook method {:?}", method_name)))?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        for (name, value) in &config.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| Error::config(format!("invalid webhook header name {:?}", name)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| Error::config(format!("invalid value for webhook header {}", name)))?;
            headers.insert(name, value);
        }

        Ok(Self {
            identifier: config.iam.clone(),
            url: config.url.clone(),
            method,
            headers,
            timeout: config.effective_timeout(),
            debounce: config.effective_debounce(),
        })
    }
}

/// Fans one identifier change out to every webhook configured for it
#[derive(Debug)]
pub struct WebhookDispatcher {
    /// Entries keyed by identifier
    entries: HashMap<String, Vec<Arc<WebhookEntry>>>,

    /// Shared across every entry, keyed by URL
    debounce: Arc<DebounceTracker>,

    /// HTTP client shared by all deliveries
    client: reqwest::Client,

    /// Submits the delivery tasks
    spawner: TaskSpawner,
}

impl WebhookDispatcher {
    /// Build a dispatcher from configuration with unbounded fan-out
    ///
    /// Construction never fails: entries missing an identifier or URL, or
    /// carrying an unusable method, URL, or header, are dropped with a
    /// warning.
    pub fn new(configs: &[WebhookConfig]) -> Self {
        Self::with_spawner(configs, TaskSpawner::unbounded("webhook"))
    }

    /// Build a dispatcher from configuration using the given spawner
    pub fn with_spawner(configs: &[WebhookConfig], spawner: TaskSpawner) -> Self {
        let mut entries: HashMap<String, Vec<Arc<WebhookEntry>>> = HashMap::new();

        for config in configs {
            match WebhookEntry::from_config(config) {
                Ok(entry) => entries
                    .entry(entry.identifier.clone())
                    .or_default()
                    .push(Arc::new(entry)),
                Err(e) => warn!(
                    "Skipping webhook {:?} for identifier {:?}: {}",
                    config.url, config.iam, e
                ),
            }
        }

        Self {
            entries,
            debounce: Arc::new(DebounceTracker::new()),
            client: reqwest::Client::new(),
            spawner,
        }
    }

    /// Entries configured for `identifier`
    pub fn entries_for(&self, identifier: &str) -> &[Arc<WebhookEntry>] {
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

    /// Shared debounce state
    pub fn debounce(&self) -> &DebounceTracker {
        &self.debounce
    }

    /// Start one delivery per webhook configured for `identifier`
    ///
    /// Entries whose URL had a successful delivery within their debounce
    /// interval are skipped. Returns the number of deliveries started.
    pub fn trigger(&self, identifier: &str, ip: IpAddr) -> usize {
        let entries = self.entries_for(identifier);
        if entries.is_empty() {
            debug!("No webhooks for identifier {}", identifier);
            return 0;
        }

        let mut spawned = 0;
        for entry in entries {
            if self.debounce.should_skip(&entry.url, entry.debounce) {
                info!("Skipped webhook {} (debounced)", entry.url);
                continue;
            }

            let entry = Arc::clone(entry);
            let client = self.client.clone();
            let debounce = Arc::clone(&self.debounce);
            let identifier = identifier.to_string();

            let started = self.spawner.spawn(async move {
                info!(
                    "Sending {} to {} for identifier {}",
                    entry.method, entry.url, identifier
                );
                match deliver(&client, &entry, &identifier, ip).await {
                    Ok(status) => {
                        debounce.record_success(&entry.url);
                        info!("Webhook delivered to {} (status {})", entry.url, status);
                    }
                    Err(e) => error!("Webhook to {} failed: {}", entry.url, e),
                }
            });
            if started {
                spawned += 1;
            }
        }
        spawned
    }
}

/// Perform a single delivery
///
/// # Returns
///
/// - `Ok(StatusCode)`: The destination answered 2xx
/// - `Err(Error)`: Serialization failure, transport failure, or non-2xx
async fn deliver(
    client: &reqwest::Client,
    entry: &WebhookEntry,
    identifier: &str,
    ip: IpAddr,
) -> Result<StatusCode> {
    let body = serde_json::to_vec(&WebhookPayload::new(identifier, ip))?;

    let response = client
        .request(entry.method.clone(), &entry.url)
        .headers(entry.headers.clone())
        .timeout(entry.timeout)
        .body(body)
        .send()
        .await
        .map_err(|e| Error::http(format!("request failed: {}", e)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::http(format!("non-2xx response: {}", status)));
    }

    Ok(status)
}
