//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Before an upstream call:
//!     → backoff.rs (is this credential inside a backoff window?)
//! After an upstream error:
//!     → quota.rs (is it a rate limit? for how long?)
//!     → backoff.rs (record the window)
//! ```
//!
//! # Design Decisions
//! - Backoff is keyed by credential, not by caller IP
//! - Fail fast while backing off; the upstream is never probed
//! - No automatic retries; callers retry after `Retry-After`
//! - Quota detection is a trait so other upstreams can plug in their own markers

pub mod backoff;
pub mod quota;

pub use backoff::{BackoffGuard, GuardDecision};
pub use quota::{backoff_for, ErrorFieldDetector, QuotaDetector, QuotaSignal};
