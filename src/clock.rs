//! Wall-clock abstraction.
//!
//! Backoff windows and cache ages are computed against UTC wall time (quota
//! resets happen at the top of the UTC hour and at UTC midnight), so the clock
//! hands out `DateTime<Utc>` rather than monotonic instants.
//!
//! - `SystemClock`: the real clock
//! - `ManualClock`: a fixed time that only moves when told to

use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, Mutex};

/// Source of the current UTC time.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}

/// Live implementation backed by `Utc::now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Controllable clock for tests.
#[derive(Debug, Clone)]
pub struct ManualClock {
    current: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    /// Create a clock frozen at `start`.
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            current: Arc::new(Mutex::new(start)),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: std::time::Duration) {
        let mut current = self.current.lock().expect("manual clock mutex poisoned");
        *current += Duration::milliseconds(by.as_millis() as i64);
    }

    /// Jump to an absolute time.
    pub fn set(&self, to: DateTime<Utc>) {
        *self.current.lock().expect("manual clock mutex poisoned") = to;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.current.lock().expect("manual clock mutex poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_manual_clock_advances() {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let clock = ManualClock::new(start);
        assert_eq!(clock.now(), start);

        clock.advance(std::time::Duration::from_millis(1500));
        assert_eq!((clock.now() - start).num_milliseconds(), 1500);

        clock.set(start);
        assert_eq!(clock.now(), start);
    }
}
