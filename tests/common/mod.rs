//! Shared utilities for integration testing.

use sdk_rust::BffClient;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use storefront_bff::clock::SystemClock;
use storefront_bff::config::StaticVars;
use storefront_bff::upstream::ReqwestTransport;
use storefront_bff::{AppState, HttpServer, ProxyConfig, Shutdown};

/// A BFF instance listening on an ephemeral port.
pub struct TestBff {
    pub addr: SocketAddr,
    pub client: BffClient,
    shutdown: Shutdown,
}

impl Drop for TestBff {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Config pointing every upstream URL at `upstream`.
pub fn config_for(upstream: &str) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.upstream.base_url = upstream.to_string();
    config.oauth.token_url = format!("{}/1/oauth/token", upstream);
    config.oauth.authorize_url = format!("{}/1/oauth/authorize", upstream);
    config.oauth.redirect_uri = "https://app.example.com/callback".to_string();
    config
}

/// Variables with an access token only.
#[allow(dead_code)]
pub fn token_vars() -> StaticVars {
    StaticVars::new().with("BASE_ACCESS_TOKEN", "tok")
}

/// Variables with OAuth client credentials only.
#[allow(dead_code)]
pub fn client_vars() -> StaticVars {
    StaticVars::new()
        .with("BASE_CLIENT_ID", "cid")
        .with("BASE_CLIENT_SECRET", "sec")
}

pub async fn spawn_bff(upstream: &str, vars: StaticVars) -> TestBff {
    spawn_bff_with(config_for(upstream), vars).await
}

pub async fn spawn_bff_with(config: ProxyConfig, vars: StaticVars) -> TestBff {
    let transport = Arc::new(ReqwestTransport::new(&config.upstream).unwrap());
    let state = AppState::with_transport(&config, Arc::new(vars), transport, Arc::new(SystemClock)).unwrap();
    let server = HttpServer::new(&config, state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });

    TestBff {
        addr,
        client: BffClient::new(&format!("http://{}", addr)),
        shutdown,
    }
}
