//! Per-credential rate-limit backoff guard.
//!
//! Holds a "do not call before" timestamp for every credential the upstream
//! has throttled. Entries are never evicted; once their timestamp passes they
//! simply stop blocking and get overwritten by the next backoff.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::sync::Arc;

use crate::clock::Clock;

/// Longest window a single signal can impose (one year).
const MAX_BACKOFF_SECS: u64 = 365 * 24 * 3600;

/// Outcome of a guard check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Allowed,
    Blocked { retry_after_secs: u64 },
}

/// Thread-safe backoff registry keyed by credential.
pub struct BackoffGuard {
    resume_at: DashMap<String, DateTime<Utc>>,
    clock: Arc<dyn Clock>,
}

impl BackoffGuard {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            resume_at: DashMap::new(),
            clock,
        }
    }

    /// Blocked while the stored resume time is still in the future.
    pub fn check_allowed(&self, credential: &str) -> GuardDecision {
        let now = self.clock.now();
        match self.resume_at.get(credential) {
            Some(entry) if *entry > now => {
                let remaining_ms = (*entry - now).num_milliseconds().max(1) as u64;
                GuardDecision::Blocked {
                    retry_after_secs: remaining_ms.div_ceil(1000),
                }
            }
            _ => GuardDecision::Allowed,
        }
    }

    /// Block `credential` for `seconds` (clamped to 1..=one year), replacing any earlier window.
    pub fn record_backoff(&self, credential: &str, seconds: u64) -> DateTime<Utc> {
        let seconds = seconds.clamp(1, MAX_BACKOFF_SECS) as i64;
        let resume = self.clock.now() + Duration::seconds(seconds);
        self.resume_at.insert(credential.to_string(), resume);
        resume
    }

    /// Number of credentials currently inside a backoff window.
    pub fn active_count(&self) -> usize {
        let now = self.clock.now();
        self.resume_at.iter().filter(|e| *e.value() > now).count()
    }
}
