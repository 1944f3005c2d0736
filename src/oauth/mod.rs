//! OAuth token exchange with the upstream platform.
//!
//! # Data Flow
//! ```text
//! POST /auth/exchange | /auth/refresh
//!     → exchanger.rs (client credentials from VarSource, form body, Basic auth)
//!     → upstream token endpoint
//!     → token payload passed back unmodified
//!
//! GET /auth/authorize
//!     → authorize.rs (provider URL with client_id, redirect_uri, scope, state)
//! ```
//!
//! # Design Decisions
//! - Stateless: tokens are neither stored nor refreshed automatically
//! - Missing client credentials fail before any network call
//! - Token calls bypass the backoff guard and cache

pub mod authorize;
pub mod exchanger;

pub use authorize::AuthorizeRedirect;
pub use exchanger::{ExchangeRequest, RefreshRequest, TokenExchanger};
