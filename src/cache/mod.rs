//! Short-lived response caching.
//!
//! # Data Flow
//! ```text
//! orchestrator
//!     → key.rs (resource + credential + sorted params)
//!     → store.rs lookup (fresh? serve without touching upstream)
//!     → ... upstream call ...
//!     → store.rs store (successful responses only)
//! ```
//!
//! # Design Decisions
//! - Pure TTL cache; concurrent identical misses may both reach upstream
//! - Staleness is checked on read, not by a background sweeper
//! - Bounded by `cache.max_entries`; expired entries go first, then the oldest

pub mod key;
pub mod store;

pub use key::CacheKey;
pub use store::{CachedResponse, ResponseCache};
