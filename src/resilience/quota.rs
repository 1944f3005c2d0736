//! Rate-limit detection and backoff duration policy.
//!
//! # Policy (first match wins)
//! 1. Integer `Retry-After` header → used verbatim
//! 2. Hourly quota marker in the body → seconds to the next UTC hour (floor 5)
//! 3. Daily quota marker in the body → seconds to UTC midnight (floor 60)
//! 4. Configured per-resource default
//!
//! A response is treated as rate limiting when its status is 429, it carries
//! `Retry-After`, or a quota marker is found. The platform reports exhausted
//! quotas as plain 400s, so the status alone is not enough.

use chrono::{DateTime, Timelike, Utc};
use serde_json::Value;

use crate::config::QuotaMarkers;
use crate::upstream::UpstreamResponse;

const HOURLY_FLOOR_SECS: u64 = 5;
const DAILY_FLOOR_SECS: u64 = 60;

/// Which quota the upstream reported as exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaSignal {
    Hourly,
    Daily,
}

/// Recognizes quota exhaustion in an upstream error body.
///
/// Detection is best-effort: unknown shapes return `None`, never an error.
pub trait QuotaDetector: Send + Sync {
    fn detect(&self, status: u16, body: Option<&Value>) -> Option<QuotaSignal>;
}

/// Matches the body's top-level `"error"` string against marker lists.
#[derive(Debug, Clone)]
pub struct ErrorFieldDetector {
    markers: QuotaMarkers,
}

impl ErrorFieldDetector {
    pub fn new(markers: QuotaMarkers) -> Self {
        Self { markers }
    }
}

impl Default for ErrorFieldDetector {
    fn default() -> Self {
        Self::new(QuotaMarkers::default())
    }
}

impl QuotaDetector for ErrorFieldDetector {
    fn detect(&self, _status: u16, body: Option<&Value>) -> Option<QuotaSignal> {
        let code = body?.get("error")?.as_str()?.trim();
        if self.markers.hourly.iter().any(|m| m == code) {
            Some(QuotaSignal::Hourly)
        } else if self.markers.daily.iter().any(|m| m == code) {
            Some(QuotaSignal::Daily)
        } else {
            None
        }
    }
}

/// Seconds until the top of the next UTC hour, at least 5.
pub fn seconds_until_next_hour(now: DateTime<Utc>) -> u64 {
    let past_hour = u64::from(now.minute() * 60 + now.second());
    (3600 - past_hour).max(HOURLY_FLOOR_SECS)
}

/// Seconds until the next UTC midnight, at least 60.
pub fn seconds_until_midnight(now: DateTime<Utc>) -> u64 {
    let past_day = u64::from(now.num_seconds_from_midnight());
    (86_400 - past_day).max(DAILY_FLOOR_SECS)
}

/// Integer `Retry-After` value; HTTP-date forms are not honored.
pub fn parse_retry_after(value: &str) -> Option<u64> {
    let value = value.trim();
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

/// Backoff to apply for an upstream error response, or `None` if it is not a rate limit.
pub fn backoff_for(
    response: &UpstreamResponse,
    body: Option<&Value>,
    detector: &dyn QuotaDetector,
    now: DateTime<Utc>,
    default_secs: u64,
) -> Option<u64> {
    let signal = detector.detect(response.status, body);
    let throttled = response.status == 429 || response.retry_after.is_some() || signal.is_some();
    if !throttled {
        return None;
    }

    let header_secs = response.retry_after.as_deref().and_then(parse_retry_after);
    let seconds = match (header_secs, signal) {
        (Some(secs), _) => secs,
        (None, Some(QuotaSignal::Hourly)) => seconds_until_next_hour(now),
        (None, Some(QuotaSignal::Daily)) => seconds_until_midnight(now),
        (None, None) => default_secs,
    };
    Some(seconds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, h, m, s).unwrap()
    }

    fn decide(response: &UpstreamResponse, now: DateTime<Utc>) -> Option<u64> {
        let body = response.parsed();
        backoff_for(response, body.as_ref(), &ErrorFieldDetector::default(), now, 60)
    }

    #[test]
    fn test_hour_limit_counts_down_to_next_hour() {
        let now = at(10, 34, 56);
        assert_eq!(seconds_until_next_hour(now), 3600 - (34 * 60 + 56));

        let resp = UpstreamResponse::json(400, json!({"error": "hour_api_limit"}));
        assert_eq!(decide(&resp, now), Some(3600 - (34 * 60 + 56)));
    }

    #[test]
    fn test_hour_limit_floor() {
        assert_eq!(seconds_until_next_hour(at(10, 59, 58)), 5);
        assert_eq!(seconds_until_next_hour(at(10, 0, 0)), 3600);
    }

    #[test]
    fn test_day_limit_counts_down_to_midnight() {
        let now = at(22, 0, 0);
        let resp = UpstreamResponse::json(400, json!({"error": "day_api_limit"}));
        assert_eq!(decide(&resp, now), Some(2 * 3600));
        assert_eq!(seconds_until_midnight(at(23, 59, 30)), 60);
    }

    #[test]
    fn test_retry_after_header_wins() {
        let resp = UpstreamResponse::json(400, json!({"error": "hour_api_limit"}))
            .with_retry_after("7");
        assert_eq!(decide(&resp, at(10, 0, 0)), Some(7));
    }

    #[test]
    fn test_non_integer_retry_after_uses_default() {
        let resp = UpstreamResponse::text(503, "busy")
            .with_retry_after("Wed, 21 Oct 2015 07:28:00 GMT");
        assert_eq!(decide(&resp, at(10, 0, 0)), Some(60));
    }

    #[test]
    fn test_plain_429_uses_default() {
        let resp = UpstreamResponse::text(429, "slow down");
        assert_eq!(decide(&resp, at(10, 0, 0)), Some(60));
    }

    #[test]
    fn test_ordinary_errors_are_not_rate_limits() {
        let resp = UpstreamResponse::json(401, json!({"error": "invalid_token"}));
        assert_eq!(decide(&resp, at(10, 0, 0)), None);

        let resp = UpstreamResponse::json(400, json!(["not", "an", "object"]));
        assert_eq!(decide(&resp, at(10, 0, 0)), None);
    }

    #[test]
    fn test_custom_markers() {
        let detector = ErrorFieldDetector::new(QuotaMarkers {
            hourly: vec!["too_many_calls".into()],
            daily: vec![],
        });
        let body = json!({"error": " too_many_calls "});
        assert_eq!(detector.detect(400, Some(&body)), Some(QuotaSignal::Hourly));
        assert_eq!(detector.detect(400, Some(&json!({"error": "hour_api_limit"}))), None);
    }

    #[test]
    fn test_parse_retry_after() {
        assert_eq!(parse_retry_after("5"), Some(5));
        assert_eq!(parse_retry_after(" 120 "), Some(120));
        assert_eq!(parse_retry_after("-1"), None);
        assert_eq!(parse_retry_after("1.5"), None);
        assert_eq!(parse_retry_after(""), None);
    }
}
