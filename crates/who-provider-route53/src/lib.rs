// # Route53 DNS Provider
//
// This crate provides the Route53 DNS provider for the who propagation core.
//
// ## Behavior
//
// - One signed HTTPS POST per update (UPSERT of a single A/AAAA record)
// - HTTP timeout of 30 seconds
// - Any status >= 300 is returned as an error carrying the response body
// - No retries and no backoff: the dispatcher logs the error and moves on
// - Dry-run mode (`WHO_MODE=dry-run`) signs and logs the request without sending it
//
// ## Security Requirements
//
// - Access key and secret key NEVER appear in logs or `Debug` output
// - The factory rejects entries with an empty access key, secret key, or zone id
//
// ## API Reference
//
// - ChangeResourceRecordSets: POST `/2013-04-01/hostedzone/:zone_id/rrset`
// - Signature Version 4, region `us-east-1`, service `route53`

pub mod payload;
pub mod signing;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use who_core::config::DnsEntryConfig;
use who_core::traits::{DnsProvider, DnsProviderFactory};
use who_core::{Error, ProviderRegistry, Result};

pub use payload::{ChangeBatch, fqdn};
pub use signing::{SignedHeaders, SigningCredentials};

/// Name under which the provider is registered
pub const PROVIDER_NAME: &str = "route53";

/// Route53 API endpoint
pub const ROUTE53_ENDPOINT: &str = "https://route53.amazonaws.com";

/// API version prefix of every request path
const API_VERSION: &str = "2013-04-01";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Route53 DNS provider
///
/// Stateless apart from its HTTP client: every call builds, signs and sends
/// one change request for the configured hosted zone.
///
/// # Dry-Run Mode
///
/// When `dry_run` is true the request is built and signed, then logged
/// instead of sent.
pub struct Route53Provider {
    /// Access key id and secret key
    /// ⚠️ NEVER log the secret key
    credentials: SigningCredentials,

    /// Hosted zone id
    zone_id: String,

    /// Scheme and authority requests are sent to, without trailing slash
    endpoint: String,

    /// Host header value covered by the signature
    host: String,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Dry-run mode: if true, sign and log but never send
    dry_run: bool,
}

// Custom Debug implementation that hides the credentials
impl std::fmt::Debug for Route53Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route53Provider")
            .field("credentials", &self.credentials)
            .field("zone_id", &self.zone_id)
            .field("endpoint", &self.endpoint)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl Route53Provider {
    /// Create a provider for one hosted zone, talking to [`ROUTE53_ENDPOINT`]
    pub fn new(credentials: SigningCredentials, zone_id: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        let mut provider = Self {
            credentials,
            zone_id: zone_id.into(),
            endpoint: String::new(),
            host: String::new(),
            client,
            dry_run: false,
        };
        provider.set_endpoint(ROUTE53_ENDPOINT)?;
        Ok(provider)
    }

    /// Send requests to another Route53-compatible endpoint
    ///
    /// Only a scheme and authority are accepted; the signed `host` follows
    /// the endpoint's authority.
    pub fn with_endpoint(mut self, endpoint: &str) -> Result<Self> {
        self.set_endpoint(endpoint)?;
        Ok(self)
    }

    /// Sign and log requests instead of sending them
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    fn set_endpoint(&mut self, endpoint: &str) -> Result<()> {
        let url = reqwest::Url::parse(endpoint)
            .map_err(|e| Error::config(format!("Invalid Route53 endpoint {:?}: {}", endpoint, e)))?;

        let host = url
            .host_str()
            .ok_or_else(|| Error::config(format!("Route53 endpoint {:?} has no host", endpoint)))?;

        if url.path() != "/" || url.query().is_some() {
            return Err(Error::config(format!(
                "Route53 endpoint {:?} must not carry a path or query",
                endpoint
            )));
        }

        // `port()` is None when the port is the scheme default
        self.host = match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };
        self.endpoint = format!("{}://{}", url.scheme(), self.host);
        Ok(())
    }

    /// Hosted zone this provider writes to
    pub fn zone_id(&self) -> &str {
        &self.zone_id
    }

    /// Host header value covered by the signature
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Request path of the zone's record-set endpoint
    pub fn rrset_path(&self) -> String {
        format!("/{}/hostedzone/{}/rrset", API_VERSION, self.zone_id)
    }
}

#[async_trait]
impl DnsProvider for Route53Provider {
    /// UPSERT `domain` to `ip` with `ttl`
    ///
    /// The record type follows the address text: anything with a colon is
    /// AAAA, everything else is A.
    async fn update(&self, domain: &str, ip: IpAddr, ttl: u32) -> Result<()> {
        if domain.is_empty() {
            return Err(Error::invalid_input("Route53 record name cannot be empty"));
        }

        let batch = ChangeBatch::upsert(domain, &ip.to_string(), ttl);
        let body = batch.to_xml();
        let path = self.rrset_path();
        let url = format!("{}{}", self.endpoint, path);

        let signed = signing::sign(
            "POST",
            &path,
            &self.host,
            body.as_bytes(),
            &self.credentials,
            Utc::now(),
        );

        tracing::info!(
            "{} Route53 record: {} -> {} ({}, ttl {}) [mode: {}]",
            if self.dry_run { "Would update" } else { "Updating" },
            batch.name,
            batch.value,
            batch.record_type,
            ttl,
            if self.dry_run { "DRY-RUN" } else { "LIVE" }
        );

        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would send POST request to {} with payload: {}",
                url,
                body
            );
            return Ok(());
        }

        // Host is filled in by the client from the URL authority, which is `self.host`
        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, signed.content_type)
            .header("X-Amz-Date", signed.amz_date)
            .header(AUTHORIZATION, signed.authorization)
            .body(body)
            .send()
            .await
            .map_err(|e| Error::provider(PROVIDER_NAME, format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if status.as_u16() >= 300 {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());

            return Err(Error::provider(
                PROVIDER_NAME,
                format!("route53 returned {}: {}", status.as_u16(), error_text),
            ));
        }

        tracing::debug!("Route53 accepted change for {} (status {})", batch.name, status);
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}

/// Factory for creating Route53 providers
#[derive(Debug, Clone, Default)]
pub struct Route53Factory {
    dry_run: bool,
}

impl Route53Factory {
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }

    /// Factory whose dry-run flag follows `WHO_MODE=dry-run`
    pub fn from_env() -> Self {
        let dry_run = std::env::var("WHO_MODE")
            .unwrap_or_default()
            .eq_ignore_ascii_case("dry-run");

        if dry_run {
            tracing::warn!("Route53 provider running in DRY-RUN mode - no changes will be made");
        }

        Self { dry_run }
    }
}

impl DnsProviderFactory for Route53Factory {
    fn create(&self, config: &DnsEntryConfig) -> Result<Arc<dyn DnsProvider>> {
        if config.access_key.is_empty() {
            return Err(Error::config("Route53 access key is required"));
        }
        if config.secret_key.is_empty() {
            return Err(Error::config("Route53 secret key is required"));
        }
        if config.zone_id.is_empty() {
            return Err(Error::config("Route53 zone id is required"));
        }

        let credentials = SigningCredentials::new(&config.access_key, &config.secret_key);
        let provider = Route53Provider::new(credentials, &config.zone_id)?.with_dry_run(self.dry_run);
        Ok(Arc::new(provider))
    }
}

/// Register the Route53 provider with a registry
///
/// # Example
///
/// ```rust
/// use who_core::ProviderRegistry;
///
/// let registry = ProviderRegistry::new();
/// who_provider_route53::register(&registry);
/// assert!(registry.has_provider("route53"));
/// ```
pub fn register(registry: &ProviderRegistry) {
    registry.register_provider(PROVIDER_NAME, Box::new(Route53Factory::from_env()));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> DnsEntryConfig {
        DnsEntryConfig {
            provider: "route53".to_string(),
            domain: "home.example.com".to_string(),
            iam: "alice".to_string(),
            access_key: "AKIDEXAMPLE".to_string(),
            secret_key: "secret_key_12345".to_string(),
            zone_id: "Z123".to_string(),
            ..Default::default()
        }
    }

    fn provider() -> Route53Provider {
        Route53Provider::new(SigningCredentials::new("AKIDEXAMPLE", "secret_key_12345"), "Z123").unwrap()
    }

    #[test]
    fn test_factory_creation() {
        let provider = Route53Factory::default().create(&entry()).unwrap();
        assert_eq!(provider.provider_name(), "route53");
    }

    #[test]
    fn test_factory_missing_access_key() {
        let mut config = entry();
        config.access_key.clear();
        assert!(matches!(Route53Factory::default().create(&config), Err(Error::Config(_))));
    }

    #[test]
    fn test_factory_missing_secret_key() {
        let mut config = entry();
        config.secret_key.clear();
        assert!(matches!(Route53Factory::default().create(&config), Err(Error::Config(_))));
    }

    #[test]
    fn test_factory_missing_zone_id() {
        let mut config = entry();
        config.zone_id.clear();
        assert!(matches!(Route53Factory::default().create(&config), Err(Error::Config(_))));
    }

    #[test]
    fn test_dry_run_mode() {
        assert!(provider().with_dry_run(true).is_dry_run());
        assert!(!provider().is_dry_run());
    }

    #[test]
    fn test_default_endpoint() {
        let provider = provider();
        assert_eq!(provider.host(), "route53.amazonaws.com");
        assert_eq!(provider.endpoint, "https://route53.amazonaws.com");
        assert_eq!(provider.rrset_path(), "/2013-04-01/hostedzone/Z123/rrset");
        assert_eq!(provider.zone_id(), "Z123");
    }

    #[test]
    fn test_custom_endpoint_host_includes_port() {
        let provider = provider().with_endpoint("http://127.0.0.1:8053/").unwrap();
        assert_eq!(provider.host(), "127.0.0.1:8053");
        assert_eq!(provider.endpoint, "http://127.0.0.1:8053");

        let provider = provider.with_endpoint("https://dns.example.com:443").unwrap();
        assert_eq!(provider.host(), "dns.example.com");
    }

    #[test]
    fn test_invalid_endpoints_rejected() {
        assert!(provider().with_endpoint("not a url").is_err());
        assert!(provider().with_endpoint("http://127.0.0.1:8053/prefix").is_err());
    }

    #[test]
    fn test_credentials_not_exposed_in_debug() {
        let debug_str = format!("{:?}", provider());
        assert!(!debug_str.contains("secret_key_12345"));
        assert!(!debug_str.contains("AKIDEXAMPLE"));
        assert!(debug_str.contains("Route53Provider"));
        assert!(debug_str.contains("Z123"));
    }

    #[test]
    fn test_register() {
        let registry = ProviderRegistry::new();
        register(&registry);

        assert!(registry.has_provider("route53"));
        assert!(registry.create_provider(&entry()).is_ok());
    }

    #[tokio::test]
    async fn test_empty_domain_rejected_without_sending() {
        // Unroutable endpoint: reaching the network would fail differently
        let provider = provider().with_endpoint("http://127.0.0.1:9").unwrap();
        let result = provider.update("", "10.0.0.1".parse().unwrap(), 300).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }
}
