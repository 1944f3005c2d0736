//! Upstream platform API client.
//!
//! # Data Flow
//! ```text
//! orchestrator / token exchanger
//!     → transport.rs (UpstreamRequest → reqwest, timeouts, auth headers)
//!     → response.rs (UpstreamResponse: status, content type, Retry-After, body)
//!     → caller classifies the outcome
//! ```
//!
//! # Design Decisions
//! - Bodies are buffered; payloads are small JSON documents
//! - Non-2xx statuses are responses, not errors; only transport failures are `Err`
//! - No retries at this layer

pub mod response;
pub mod transport;

pub use response::UpstreamResponse;
pub use transport::{ReqwestTransport, TransportError, UpstreamRequest, UpstreamTransport};
