// HTTP surface of the directory
//
// - `GET /whoami`: the caller's address
// - `GET /iam/{name}`: record the caller's address under `name`
// - `GET /iam/{name}/{ip}`: record an explicit address, falling back to the caller's
// - `GET /whois/{name}`: the address recorded under `name`
//
// Every response body is the address followed by a newline.

use axum::Router;
use axum::extract::{ConnectInfo, FromRequestParts, Path, Request, State};
use axum::http::request::Parts;
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tracing::info;
use who_core::Propagator;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub propagator: Arc<Propagator>,
}

impl AppState {
    pub fn new(propagator: Arc<Propagator>) -> Self {
        Self { propagator }
    }
}

/// Build the router; `verbose` adds an access log line per request
pub fn router(state: AppState, verbose: bool) -> Router {
    let router = Router::new()
        .route("/whoami", get(whoami))
        .route("/iam/{name}", get(iam))
        .route("/iam/{name}/{ip}", get(iam_with_ip))
        .route("/whois/{name}", get(whois))
        .with_state(state);

    if verbose {
        router.layer(middleware::from_fn(access_log))
    } else {
        router
    }
}

/// Determine the caller's address
///
/// Priority: last `X-Forwarded-For` entry, then `X-Real-Ip`, then the socket
/// peer. A candidate that does not parse is skipped.
pub fn client_ip(headers: &HeaderMap, peer: Option<IpAddr>) -> Option<IpAddr> {
    let header = |name: &str| headers.get(name).and_then(|value| value.to_str().ok());

    // The last hop is the one closest to this server
    let forwarded = header("x-forwarded-for")
        .and_then(|value| value.rsplit(',').next())
        .and_then(|ip| ip.trim().parse::<IpAddr>().ok());

    let real_ip = header("x-real-ip").and_then(|ip| ip.trim().parse::<IpAddr>().ok());

    forwarded
        .or(real_ip)
        .or(peer)
        .map(|ip| ip.to_canonical())
}

/// Caller's address as seen by [`client_ip`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientIp(pub Option<IpAddr>);

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(ClientIp(client_ip(&parts.headers, peer_addr(&parts.extensions).map(|addr| addr.ip()))))
    }
}

fn peer_addr(extensions: &axum::http::Extensions) -> Option<SocketAddr> {
    extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr)
}

fn ip_line(ip: IpAddr) -> String {
    format!("{}\n", ip)
}

async fn whoami(ClientIp(ip): ClientIp) -> String {
    ip.map(ip_line).unwrap_or_default()
}

async fn iam(
    State(state): State<AppState>,
    Path(name): Path<String>,
    ClientIp(client): ClientIp,
) -> Response {
    record(&state, &name, client)
}

async fn iam_with_ip(
    State(state): State<AppState>,
    Path((name, ip)): Path<(String, String)>,
    ClientIp(client): ClientIp,
) -> Response {
    let explicit = ip.parse::<IpAddr>().ok().map(|ip| ip.to_canonical());
    record(&state, &name, explicit.or(client))
}

fn record(state: &AppState, name: &str, ip: Option<IpAddr>) -> Response {
    let Some(ip) = ip else {
        return (StatusCode::BAD_REQUEST, "valid IP required\n").into_response();
    };

    state.propagator.record(name, ip);
    ip_line(ip).into_response()
}

async fn whois(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    match state.propagator.lookup(&name) {
        Some(ip) => ip_line(ip).into_response(),
        None => (StatusCode::NOT_FOUND, "404 page not found\n").into_response(),
    }
}

async fn access_log(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let version = request.version();
    let peer = peer_addr(request.extensions());
    let client = client_ip(request.headers(), peer.map(|addr| addr.ip()));

    let response = next.run(request).await;

    info!(
        "HTTP: {} \"{} {} {:?}\" {} [ClientIP:{}]",
        peer.map(|addr| addr.to_string()).unwrap_or_else(|| "-".to_string()),
        method,
        path,
        version,
        response.status().as_u16(),
        client.map(|ip| ip.to_string()).unwrap_or_default()
    );

    response
}
