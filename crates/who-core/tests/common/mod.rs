//! Test doubles and common utilities for the propagation contract tests
//!
//! - [`MockDnsProvider`]: counts calls and reports each one on a channel
//! - [`RecordingServer`]: local HTTP server that records every request

#![allow(dead_code)]

use axum::Router;
use axum::body::Bytes;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use std::collections::VecDeque;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use who_core::error::{Error, Result};
use who_core::traits::DnsProvider;

/// How long a test waits for an asynchronous side effect
pub const WAIT: Duration = Duration::from_secs(5);

/// One call made to a [`MockDnsProvider`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateCall {
    pub domain: String,
    pub ip: IpAddr,
    pub ttl: u32,
}

/// A mock DnsProvider that tracks calls
pub struct MockDnsProvider {
    /// Call counter for update()
    update_call_count: Arc<AtomicUsize>,
    /// Every call is reported here
    calls_tx: mpsc::UnboundedSender<UpdateCall>,
    /// Whether update() should fail
    fail: bool,
    /// Provider name
    pub name: &'static str,
}

impl MockDnsProvider {
    pub fn new(name: &'static str) -> (Self, mpsc::UnboundedReceiver<UpdateCall>) {
        let (calls_tx, calls_rx) = mpsc::unbounded_channel();
        let provider = Self {
            update_call_count: Arc::new(AtomicUsize::new(0)),
            calls_tx,
            fail: false,
            name,
        };
        (provider, calls_rx)
    }

    /// A provider whose every update fails after being recorded
    pub fn failing(name: &'static str) -> (Self, mpsc::UnboundedReceiver<UpdateCall>) {
        let (mut provider, calls_rx) = Self::new(name);
        provider.fail = true;
        (provider, calls_rx)
    }

    /// Get the number of times update() was called
    pub fn update_call_count(&self) -> usize {
        self.update_call_count.load(Ordering::SeqCst)
    }

    /// Handle on the call counter that outlives the provider
    pub fn counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.update_call_count)
    }
}

#[async_trait::async_trait]
impl DnsProvider for MockDnsProvider {
    async fn update(&self, domain: &str, ip: IpAddr, ttl: u32) -> Result<()> {
        self.update_call_count.fetch_add(1, Ordering::SeqCst);
        let _ = self.calls_tx.send(UpdateCall {
            domain: domain.to_string(),
            ip,
            ttl,
        });

        if self.fail {
            Err(Error::provider(self.name, "mock failure"))
        } else {
            Ok(())
        }
    }

    fn provider_name(&self) -> &'static str {
        self.name
    }
}

/// A request captured by [`RecordingServer`]
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Local HTTP server answering with scripted statuses
///
/// Responses follow the given status list in order, then 200 forever.
pub struct RecordingServer {
    pub base_url: String,
    pub requests: mpsc::UnboundedReceiver<RecordedRequest>,
}

impl RecordingServer {
    pub async fn start(statuses: Vec<StatusCode>) -> Self {
        let (tx, requests) = mpsc::unbounded_channel();
        let statuses = Arc::new(Mutex::new(VecDeque::from(statuses)));

        let app = Router::new().fallback(
            move |method: Method, uri: Uri, headers: HeaderMap, body: Bytes| {
                let tx = tx.clone();
                let statuses = Arc::clone(&statuses);
                async move {
                    let _ = tx.send(RecordedRequest {
                        method,
                        uri,
                        headers,
                        body,
                    });
                    statuses
                        .lock()
                        .unwrap()
                        .pop_front()
                        .unwrap_or(StatusCode::OK)
                }
            },
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            requests,
        }
    }

    /// Wait for the next request, panicking after [`WAIT`]
    pub async fn next_request(&mut self) -> RecordedRequest {
        tokio::time::timeout(WAIT, self.requests.recv())
            .await
            .expect("request arrives in time")
            .expect("server still running")
    }

    /// Assert nothing arrives within `window`
    pub async fn assert_idle(&mut self, window: Duration) {
        if let Ok(Some(request)) = tokio::time::timeout(window, self.requests.recv()).await {
            panic!("unexpected request: {} {}", request.method, request.uri);
        }
    }
}

/// Wait for the next provider call, panicking after [`WAIT`]
pub async fn next_call(calls: &mut mpsc::UnboundedReceiver<UpdateCall>) -> UpdateCall {
    tokio::time::timeout(WAIT, calls.recv())
        .await
        .expect("provider call arrives in time")
        .expect("provider still alive")
}

/// Poll `condition` until it holds, panicking after [`WAIT`]
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + WAIT;
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not reached in time"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
