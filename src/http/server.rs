//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the client and link directories (one cache each)
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, timeout, subscription headers)
//! - Forward subscription bodies to the configured upstream
//! - Serve until the shutdown signal fires

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderName, HeaderValue, Request, StatusCode, Uri},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::GatewayConfig;
use crate::http::health::get_health;
use crate::http::request::{request_span, MakeRequestUuid, X_REQUEST_ID};
use crate::import::{ImportRouter, NOT_FOUND};
use crate::observability::metrics;
use crate::store::{
    Clock, ClientDirectory, FileSource, LinkDirectory, LoadObserver, MonotonicClock, TableSource,
    TracingObserver,
};
use crate::subscription::{annotate_subscription, HeaderAnnotator};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub clients: Arc<ClientDirectory>,
    pub links: Arc<LinkDirectory>,
    pub import: Arc<ImportRouter>,
    pub annotator: Arc<HeaderAnnotator>,
    /// Base URL serving subscription bodies.
    pub upstream: Option<String>,
    pub client: Client<HttpConnector, Body>,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
}

impl HttpServer {
    /// Create a server reading its tables from the configured files.
    pub fn new(config: GatewayConfig) -> Self {
        let clients = Arc::new(FileSource::new(&config.tables.clients_path));
        let links = Arc::new(FileSource::new(&config.tables.links_path));
        Self::with_sources(config, clients, links, Arc::new(MonotonicClock::new()))
    }

    /// Create a server over arbitrary table sources and clock.
    pub fn with_sources(
        config: GatewayConfig,
        clients_source: Arc<dyn TableSource>,
        links_source: Arc<dyn TableSource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let ttl = Duration::from_millis(config.tables.cache_ttl_ms);
        let observer: Arc<dyn LoadObserver> = Arc::new(TracingObserver);

        tracing::info!(
            clients = %clients_source.describe(),
            links = %links_source.describe(),
            ttl_ms = config.tables.cache_ttl_ms,
            "Table sources configured"
        );

        let clients = Arc::new(ClientDirectory::new(
            clients_source,
            ttl,
            clock.clone(),
            observer.clone(),
        ));
        let links = Arc::new(LinkDirectory::new(links_source, ttl, clock, observer));

        let import = Arc::new(ImportRouter::new(
            clients.clone(),
            links.clone(),
            config.import.clone(),
        ));
        let annotator = Arc::new(HeaderAnnotator::new(
            clients.clone(),
            config.subscription.clone(),
        ));

        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        let state = AppState {
            clients,
            links,
            import,
            annotator,
            upstream: config.subscription.upstream.clone(),
            client,
        };

        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let annotator = state.annotator.clone();

        Router::new()
            .route("/i/{*rest}", get(import_handler))
            .route("/sub/{*rest}", get(subscription_handler))
            .route("/healthz", get(get_health))
            .fallback(not_found)
            .with_state(state)
            .layer(middleware::from_fn_with_state(annotator, annotate_subscription))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(TraceLayer::new_for_http().make_span_with(request_span))
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid))
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

/// Host for generated URLs: Host header, then the URI authority.
fn request_host(request: &Request<Body>) -> Option<&str> {
    request
        .headers()
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .or_else(|| request.uri().authority().map(|a| a.as_str()))
}

async fn import_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let outcome = state.import.route(request.uri().path(), request_host(&request));
    metrics::record_request("import", outcome.status().as_u16(), start);
    outcome.into_response()
}

/// Fetch the subscription body from the upstream.
async fn subscription_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let Some(upstream) = state.upstream.as_deref() else {
        metrics::record_request("subscription", 404, start);
        return (StatusCode::NOT_FOUND, NOT_FOUND).into_response();
    };

    let (parts, _body) = request.into_parts();
    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let target = format!("{}{}", upstream.trim_end_matches('/'), path_and_query);

    let uri = match target.parse::<Uri>() {
        Ok(uri) => uri,
        Err(e) => {
            tracing::error!(target = %target, error = %e, "Invalid upstream URI");
            metrics::record_request("subscription", 502, start);
            return (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response();
        }
    };

    let headers = upstream_headers(&parts.headers, &uri);
    let mut builder = Request::builder().method(parts.method).uri(uri);
    if let Some(target) = builder.headers_mut() {
        *target = headers;
    }
    let upstream_request = match builder.body(Body::empty()) {
        Ok(req) => req,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build upstream request");
            metrics::record_request("subscription", 502, start);
            return (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response();
        }
    };

    match state.client.request(upstream_request).await {
        Ok(response) => {
            metrics::record_request("subscription", response.status().as_u16(), start);
            let (parts, body) = response.into_parts();
            Response::from_parts(parts, Body::new(body))
        }
        Err(e) => {
            tracing::error!(upstream = %upstream, error = %e, "Upstream error");
            metrics::record_request("subscription", 502, start);
            (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
        }
    }
}

/// Headers that describe one connection and are never forwarded.
const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Inbound headers minus hop-by-hop ones (including any listed in
/// `Connection`), with `Host` set to the upstream authority.
fn upstream_headers(inbound: &HeaderMap, upstream: &Uri) -> HeaderMap {
    let listed: Vec<HeaderName> = inbound
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    let mut headers = HeaderMap::with_capacity(inbound.len());
    for (name, value) in inbound {
        if *name == header::HOST || HOP_BY_HOP.contains(name) || listed.contains(name) {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }
    if let Some(host) = upstream
        .authority()
        .and_then(|a| HeaderValue::from_str(a.as_str()).ok())
    {
        headers.insert(header::HOST, host);
    }
    headers
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, NOT_FOUND)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{ManualClock, MemorySource};
    use tower::ServiceExt;

    const CLIENTS: &str =
        r#"[{"token":"tok123","name":"alice","expire":1700000000}]"#;

    fn server(links: &str) -> HttpServer {
        HttpServer::with_sources(
            GatewayConfig::default(),
            Arc::new(MemorySource::new(CLIENTS)),
            Arc::new(MemorySource::new(links)),
            Arc::new(ManualClock::new(0)),
        )
    }

    async fn call(server: &HttpServer, uri: &str) -> Response {
        let request = Request::builder()
            .uri(uri)
            .header("Host", "gw.example")
            .body(Body::empty())
            .unwrap();
        server.router.clone().oneshot(request).await.unwrap()
    }

    #[test]
    fn test_upstream_headers_drop_hop_by_hop_and_rewrite_host() {
        let mut inbound = HeaderMap::new();
        inbound.insert(header::HOST, HeaderValue::from_static("gw.example"));
        inbound.insert(header::CONNECTION, HeaderValue::from_static("keep-alive, x-trace"));
        inbound.insert("keep-alive", HeaderValue::from_static("timeout=5"));
        inbound.insert("x-trace", HeaderValue::from_static("1"));
        inbound.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        inbound.insert(header::USER_AGENT, HeaderValue::from_static("Happ/3.0"));
        inbound.append(header::ACCEPT, HeaderValue::from_static("text/plain"));
        inbound.append(header::ACCEPT, HeaderValue::from_static("*/*"));

        let upstream: Uri = "http://127.0.0.1:2096/sub/tok123".parse().unwrap();
        let headers = upstream_headers(&inbound, &upstream);

        assert_eq!(headers[header::HOST], "127.0.0.1:2096");
        assert_eq!(headers[header::USER_AGENT], "Happ/3.0");
        assert_eq!(headers.get_all(header::ACCEPT).iter().count(), 2);
        for dropped in ["connection", "keep-alive", "x-trace", "transfer-encoding"] {
            assert!(!headers.contains_key(dropped), "{dropped}");
        }
    }

    #[tokio::test]
    async fn test_subscription_without_upstream_still_annotated() {
        let server = server("{}");
        let response = call(&server, "/sub/tok123").await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers()["subscription-userinfo"],
            "upload=0; download=0; total=0; expire=1700000000"
        );
        assert!(response.headers().contains_key(X_REQUEST_ID));
    }

    #[tokio::test]
    async fn test_import_route_is_not_annotated() {
        let server = server(r#"{"alice":"https://happ.example/alice"}"#);
        let response = call(&server, "/i/tok123/happ").await;

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "https://happ.example/alice");
        assert!(!response.headers().contains_key("subscription-userinfo"));
    }

    #[tokio::test]
    async fn test_unknown_paths_fall_back_to_not_found() {
        let server = server("{}");
        for uri in ["/", "/i", "/sub", "/other/tok123"] {
            let response = call(&server, uri).await;
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
            let body = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            assert_eq!(&body[..], NOT_FOUND.as_bytes(), "{uri}");
        }
    }

    #[test]
    fn test_request_host_prefers_header() {
        let request = Request::builder()
            .uri("http://authority.example/i/alice")
            .header("Host", "header.example")
            .body(Body::empty())
            .unwrap();
        assert_eq!(request_host(&request), Some("header.example"));

        let request = Request::builder()
            .uri("http://authority.example/i/alice")
            .body(Body::empty())
            .unwrap();
        assert_eq!(request_host(&request), Some("authority.example"));

        let request = Request::builder().uri("/i/alice").body(Body::empty()).unwrap();
        assert_eq!(request_host(&request), None);
    }
}
