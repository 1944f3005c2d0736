//! Storefront backend-for-frontend library.
//!
//! A small REST surface (items, orders, OAuth token exchange) in front of the
//! BASE e-commerce API. Every proxied call goes through a per-credential
//! rate-limit backoff guard and a short-lived response cache.

// Core subsystems
pub mod cache;
pub mod config;
pub mod http;
pub mod oauth;
pub mod orchestrator;
pub mod upstream;

// Cross-cutting concerns
pub mod clock;
pub mod error;
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::schema::ProxyConfig;
pub use error::{ProxyError, ProxyResult};
pub use http::{AppState, HttpServer};
pub use lifecycle::Shutdown;
