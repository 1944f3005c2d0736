//! HTTP surface of the BFF.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum router, middleware: request ID, trace, timeout, body limit)
//!     → request.rs (request ID on the span and the response)
//!     → handlers.rs / auth.rs (extract + validate input)
//!     → orchestrator / oauth
//!     → response.rs (ProxiedResponse or {"detail": ...} error)
//! ```

pub mod auth;
pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::{AppState, HttpServer, StateError};
