//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the shared application state (orchestrators, token exchanger)
//! - Create the Axum router with all handlers
//! - Wire up middleware (request ID, tracing, timeout, body limit)
//! - Serve on a listener until shutdown is signalled

use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::cache::ResponseCache;
use crate::clock::{Clock, SystemClock};
use crate::config::{ProcessEnv, ProxyConfig, ResourceConfig, VarSource};
use crate::http::request::{propagate_request_id_layer, request_span, set_request_id_layer};
use crate::http::{auth, handlers};
use crate::oauth::TokenExchanger;
use crate::orchestrator::{Credential, Orchestrator, ResourceSettings};
use crate::resilience::{BackoffGuard, ErrorFieldDetector, QuotaDetector};
use crate::upstream::{ReqwestTransport, TransportError, UpstreamTransport};

/// Failure to assemble the application state.
#[derive(Debug, Error)]
pub enum StateError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("invalid OAuth authorize URL: {0}")]
    AuthorizeUrl(#[from] url::ParseError),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub items: Arc<Orchestrator>,
    pub orders: Arc<Orchestrator>,
    pub order_detail: Arc<Orchestrator>,
    pub tokens: Arc<TokenExchanger>,
    pub vars: Arc<dyn VarSource>,
    pub config: Arc<ProxyConfig>,
}

impl AppState {
    /// Production state: reqwest transport, process environment, system clock.
    pub fn from_config(config: &ProxyConfig) -> Result<Self, StateError> {
        let transport = Arc::new(ReqwestTransport::new(&config.upstream)?);
        Self::with_transport(config, Arc::new(ProcessEnv), transport, Arc::new(SystemClock))
    }

    /// State with injected collaborators.
    pub fn with_transport(
        config: &ProxyConfig,
        vars: Arc<dyn VarSource>,
        transport: Arc<dyn UpstreamTransport>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, StateError> {
        let detector: Arc<dyn QuotaDetector> = Arc::new(ErrorFieldDetector::new(config.upstream.quota.clone()));
        let items_guard = Arc::new(BackoffGuard::new(clock.clone()));
        let orders_guard = Arc::new(BackoffGuard::new(clock.clone()));
        let token_var = &config.credentials.access_token_var;

        let resource = |name: &str, path: &str, settings: &ResourceConfig, guard: &Arc<BackoffGuard>, ttl_secs: u64| {
            Arc::new(Orchestrator::new(
                ResourceSettings {
                    name: name.to_string(),
                    path: path.to_string(),
                    credential_var: token_var.clone(),
                    default_backoff_secs: settings.default_backoff_secs,
                },
                config.upstream.base_url.clone(),
                guard.clone(),
                Arc::new(ResponseCache::new(
                    Duration::from_secs(ttl_secs),
                    config.cache.max_entries,
                    clock.clone(),
                )),
                transport.clone(),
                detector.clone(),
                clock.clone(),
            ))
        };

        let items = resource("items", "/1/items", &config.items, &items_guard, config.items.cache_ttl_secs);
        let orders = resource("orders", "/1/orders", &config.orders, &orders_guard, config.orders.cache_ttl_secs);
        let order_detail = resource("order_detail", "/1/orders/detail", &config.orders, &orders_guard, 0);

        let tokens = Arc::new(TokenExchanger::new(
            transport.clone(),
            vars.clone(),
            config.oauth.clone(),
            config.credentials.clone(),
        )?);

        Ok(Self {
            items,
            orders,
            order_detail,
            tokens,
            vars,
            config: Arc::new(config.clone()),
        })
    }

    /// Upstream access token, re-read on every call.
    pub fn credential(&self) -> Option<Credential> {
        self.vars
            .get(&self.config.credentials.access_token_var)
            .map(Credential::new)
    }
}

/// HTTP server for the BFF.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(config: &ProxyConfig, state: AppState) -> Self {
        Self {
            router: Self::build_router(config, state),
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        Router::new()
            .route("/", get(handlers::root))
            .route("/health", get(handlers::health))
            .route("/items", get(handlers::items))
            .route("/orders", get(handlers::orders))
            .route("/orders/detail", get(handlers::order_detail))
            .route("/callback", get(handlers::callback))
            .route("/auth/exchange", post(auth::exchange))
            .route("/auth/refresh", post(auth::refresh))
            .route("/auth/authorize", get(auth::authorize))
            .with_state(state)
            .layer(RequestBodyLimitLayer::new(config.listener.max_body_bytes))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http().make_span_with(|request: &axum::extract::Request| request_span(request)))
            .layer(set_request_id_layer())
    }

    /// The router, for in-process use.
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Serve on `listener` until `shutdown` fires.
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::StaticVars;
    use crate::upstream::transport::mock::MockTransport;
    use crate::upstream::UpstreamResponse;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app(vars: StaticVars) -> (Router, Arc<MockTransport>) {
        let mut config = ProxyConfig::default();
        config.upstream.base_url = "https://api.example.com".into();
        config.oauth.redirect_uri = "https://app.example.com/callback".into();
        let transport = Arc::new(MockTransport::new());
        let state = AppState::with_transport(
            &config,
            Arc::new(vars),
            transport.clone(),
            Arc::new(ManualClock::default()),
        )
        .unwrap();
        (HttpServer::new(&config, state).into_router(), transport)
    }

    fn with_token() -> StaticVars {
        StaticVars::new().with("BASE_ACCESS_TOKEN", "tok")
    }

    async fn send(router: &Router, request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Value) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, headers, body)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_items_proxied_and_cached() {
        let (router, transport) = app(with_token());
        transport.push_json(200, json!({"items": [], "count": 0}));

        let (status, headers, body) = send(&router, get("/items?limit=5&visible=1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"items": [], "count": 0}));
        assert!(headers.contains_key("x-request-id"));

        let (status, _, _) = send(&router, get("/items?visible=1&limit=5")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(transport.calls(), 1);
        assert_eq!(transport.requests()[0].url, "https://api.example.com/1/items");
    }

    #[tokio::test]
    async fn test_items_without_token_is_500() {
        let (router, transport) = app(StaticVars::new());
        let (status, _, body) = send(&router, get("/items")).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"detail": "BASE_ACCESS_TOKEN is not set"}));
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_invalid_query_is_400() {
        let (router, transport) = app(with_token());

        let (status, _, _) = send(&router, get("/items?limit=500")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _, _) = send(&router, get("/items?limit=abc")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _, _) = send(&router, get("/orders/detail")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_rate_limit_on_orders_blocks_order_detail() {
        let (router, transport) = app(with_token());
        transport.push(Ok(UpstreamResponse::json(429, json!({"error": "too_many"})).with_retry_after("7")));

        let (status, headers, _) = send(&router, get("/orders")).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(headers[header::RETRY_AFTER], "7");

        let (status, headers, body) = send(&router, get("/orders/detail?order_id=9")).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(headers[header::RETRY_AFTER], "7");
        assert_eq!(body["detail"]["error"], "rate_limited");
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_items_guard_is_independent_of_orders() {
        let (router, transport) = app(with_token());
        transport.push(Ok(UpstreamResponse::text(429, "slow down")));
        transport.push_json(200, json!({"items": []}));

        let (status, _, _) = send(&router, get("/orders")).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        let (status, _, _) = send(&router, get("/items")).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_refresh_without_token_is_400() {
        let (router, transport) = app(with_token());
        let (status, _, body) = send(&router, post_json("/auth/refresh", json!({}))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"detail": "refresh_token is required"}));
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_exchange_without_client_credentials_is_500() {
        let (router, transport) = app(with_token());
        let (status, _, body) = send(&router, post_json("/auth/exchange", json!({"code": "abc"}))).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"detail": "BASE_CLIENT_ID/BASE_CLIENT_SECRET is not set"}));
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_exchange_without_redirect_uri_uses_configured_one() {
        let vars = StaticVars::new()
            .with("BASE_CLIENT_ID", "cid")
            .with("BASE_CLIENT_SECRET", "sec");
        let (router, transport) = app(vars);
        transport.push_json(200, json!({"access_token": "at"}));

        let (status, _, body) = send(&router, post_json("/auth/exchange", json!({"code": "abc"}))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["access_token"], "at");
        assert_eq!(
            transport.requests()[0].form_value("redirect_uri"),
            Some("https://app.example.com/callback")
        );
    }

    #[tokio::test]
    async fn test_authorize_redirects() {
        let (router, _) = app(StaticVars::new().with("BASE_CLIENT_ID", "cid"));
        let (status, headers, _) = send(&router, get("/auth/authorize?state=s1")).await;

        assert_eq!(status, StatusCode::TEMPORARY_REDIRECT);
        let location = headers[header::LOCATION].to_str().unwrap();
        assert!(location.starts_with("https://api.thebase.in/1/oauth/authorize?response_type=code"));
        assert!(location.contains("state=s1"));
    }

    #[tokio::test]
    async fn test_callback_and_root() {
        let (router, _) = app(StaticVars::new());

        let (status, _, body) = send(&router, get("/callback?code=abc123&state=xyz")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"received": true, "code": "abc123", "state": "xyz"}));

        let (status, _, _) = send(&router, get("/callback")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _, body) = send(&router, get("/")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["message"].as_str().unwrap().starts_with("EC-LIVE"));
    }

    #[tokio::test]
    async fn test_health_reports_credentials() {
        let (router, _) = app(with_token());
        let (status, _, body) = send(&router, get("/health")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["credentials"]["access_token"], true);
        assert_eq!(body["credentials"]["client_credentials"], false);
    }
}
