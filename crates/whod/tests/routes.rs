//! HTTP routes, exercised in process
//!
//! - `/whoami` echoes the caller's address
//! - `/iam/...` records and triggers propagation only on change
//! - `/whois/{name}` serves what was recorded

use axum::Router;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tower::ServiceExt;
use who_core::dispatch::{DnsDispatcher, DnsUpdateEntry};
use who_core::traits::DnsProvider;
use who_core::{IpRegistry, Propagator, TaskSpawner};
use whod::routes::{AppState, router};

/// Provider reporting each update on a channel
struct ChannelProvider {
    calls: mpsc::UnboundedSender<(String, IpAddr)>,
}

#[async_trait::async_trait]
impl DnsProvider for ChannelProvider {
    async fn update(&self, domain: &str, ip: IpAddr, _ttl: u32) -> who_core::Result<()> {
        let _ = self.calls.send((domain.to_string(), ip));
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "channel"
    }
}

fn app() -> (Router, Arc<Propagator>, mpsc::UnboundedReceiver<(String, IpAddr)>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let dispatcher = DnsDispatcher::from_entries(
        vec![DnsUpdateEntry {
            identifier: "alice".to_string(),
            domain: "alice.example.com".to_string(),
            ip_version: String::new(),
            ttl: 300,
            provider: Arc::new(ChannelProvider { calls: tx }),
        }],
        TaskSpawner::unbounded("dns"),
    );
    let propagator = Arc::new(Propagator::new(Arc::new(IpRegistry::new())).with_dns(dispatcher));
    let app = router(AppState::new(Arc::clone(&propagator)), true);
    (app, propagator, rx)
}

fn get(uri: &str) -> axum::http::request::Builder {
    Request::builder().uri(uri)
}

fn from_peer(builder: axum::http::request::Builder, peer: &str) -> Request<Body> {
    let mut request = builder.body(Body::empty()).unwrap();
    let addr: SocketAddr = peer.parse().unwrap();
    request.extensions_mut().insert(ConnectInfo(addr));
    request
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn whoami_prefers_forwarded_header() {
    let (app, _, _) = app();
    let request = from_peer(
        get("/whoami").header("X-Forwarded-For", "203.0.113.7, 198.51.100.2"),
        "192.0.2.1:50000",
    );
    assert_eq!(send(&app, request).await, (StatusCode::OK, "198.51.100.2\n".to_string()));
}

#[tokio::test]
async fn whoami_falls_back_to_peer() {
    let (app, _, _) = app();
    let request = from_peer(get("/whoami"), "192.0.2.1:50000");
    assert_eq!(send(&app, request).await, (StatusCode::OK, "192.0.2.1\n".to_string()));
}

#[tokio::test]
async fn whoami_without_any_address_is_empty() {
    let (app, _, _) = app();
    let request = get("/whoami").body(Body::empty()).unwrap();
    assert_eq!(send(&app, request).await, (StatusCode::OK, String::new()));
}

#[tokio::test]
async fn iam_records_caller_and_propagates_once() {
    let (app, propagator, mut calls) = app();

    let request = from_peer(get("/iam/alice").header("X-Real-Ip", "10.0.0.1"), "192.0.2.1:50000");
    assert_eq!(send(&app, request).await, (StatusCode::OK, "10.0.0.1\n".to_string()));
    assert_eq!(propagator.lookup("alice"), Some("10.0.0.1".parse().unwrap()));

    let call = tokio::time::timeout(Duration::from_secs(5), calls.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(call, ("alice.example.com".to_string(), "10.0.0.1".parse().unwrap()));

    // Same address again: recorded, nothing propagated
    let request = from_peer(get("/iam/alice").header("X-Real-Ip", "10.0.0.1"), "192.0.2.1:50000");
    assert_eq!(send(&app, request).await.0, StatusCode::OK);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(calls.try_recv().is_err());
}

#[tokio::test]
async fn iam_with_explicit_ip() {
    let (app, propagator, _) = app();

    let request = from_peer(get("/iam/bob/2001:db8::1"), "192.0.2.1:50000");
    assert_eq!(send(&app, request).await, (StatusCode::OK, "2001:db8::1\n".to_string()));
    assert_eq!(propagator.lookup("bob"), Some("2001:db8::1".parse().unwrap()));
}

#[tokio::test]
async fn iam_with_invalid_explicit_ip_uses_caller() {
    let (app, propagator, _) = app();

    let request = from_peer(get("/iam/bob/not-an-ip"), "192.0.2.1:50000");
    assert_eq!(send(&app, request).await, (StatusCode::OK, "192.0.2.1\n".to_string()));
    assert_eq!(propagator.lookup("bob"), Some("192.0.2.1".parse().unwrap()));
}

#[tokio::test]
async fn iam_without_any_address_is_rejected() {
    let (app, propagator, _) = app();

    let request = get("/iam/bob").body(Body::empty()).unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "valid IP required\n");
    assert_eq!(propagator.lookup("bob"), None);
}

#[tokio::test]
async fn whois_serves_recorded_address() {
    let (app, _, _) = app();

    let request = get("/whois/carol").body(Body::empty()).unwrap();
    assert_eq!(send(&app, request).await.0, StatusCode::NOT_FOUND);

    let request = from_peer(get("/iam/carol/::ffff:203.0.113.5"), "192.0.2.1:50000");
    send(&app, request).await;

    let request = get("/whois/carol").body(Body::empty()).unwrap();
    assert_eq!(send(&app, request).await, (StatusCode::OK, "203.0.113.5\n".to_string()));
}

#[tokio::test]
async fn only_get_is_routed() {
    let (app, _, _) = app();
    let request = Request::builder()
        .method("POST")
        .uri("/whoami")
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&app, request).await.0, StatusCode::METHOD_NOT_ALLOWED);
}
