//! Per-resource request orchestration.
//!
//! # Data Flow
//! ```text
//! http handler
//!     → query.rs (typed query → range checks → QueryParams)
//!     → request.rs (ProxiedRequest: params + credential)
//!     → engine.rs (guard → cache → upstream → translate)
//!     → ProxiedResponse or ProxyError
//! ```
//!
//! # Design Decisions
//! - One orchestrator per resource; resources sharing a guard share an `Arc<BackoffGuard>`
//! - The credential is resolved by the caller so it can be re-read per request
//! - Only 2xx/3xx responses are cached

pub mod engine;
pub mod query;
pub mod request;

pub use engine::{Orchestrator, ResourceSettings, UpstreamOutcome};
pub use query::{ItemsQuery, OrderDetailQuery, OrdersQuery, ResourceQuery};
pub use request::{Credential, ProxiedRequest, ProxiedResponse, QueryParams};
