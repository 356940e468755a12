//! Rate limit metadata reported by the server.

use reqwest::header::HeaderMap;
use std::time::Duration;

const BUCKET: &str = "x-ratelimit-bucket";
const LIMIT: &str = "x-ratelimit-limit";
const REMAINING: &str = "x-ratelimit-remaining";
const RESET_AFTER: &str = "x-ratelimit-reset-after";

/// Longest delay accepted from the server; anything longer is treated as absent
pub(crate) const MAX_SERVER_DELAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Quota state of a bucket as of the last response
///
/// Every field is optional; present fields overwrite the bucket's local view.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateLimitHeaders {
    /// Server-assigned bucket hash
    pub bucket: Option<String>,
    pub limit: Option<u32>,
    pub remaining: Option<u32>,
    /// Time until the current window resets
    pub reset_after: Option<Duration>,
}

impl RateLimitHeaders {
    /// Read the `X-RateLimit-*` headers; `None` if none are present
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let text = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

        let parsed = Self {
            bucket: text(BUCKET).map(str::to_string),
            limit: text(LIMIT).and_then(|v| v.parse().ok()),
            remaining: text(REMAINING).and_then(|v| v.parse().ok()),
            reset_after: text(RESET_AFTER).and_then(parse_seconds),
        };

        (parsed != Self::default()).then_some(parsed)
    }
}

/// Parse fractional seconds ("1.5") into a duration
pub(crate) fn parse_seconds(value: &str) -> Option<Duration> {
    value.trim().parse::<f64>().ok().and_then(seconds)
}

/// Server-supplied seconds as a duration; `None` when negative, not a
/// number, or longer than [`MAX_SERVER_DELAY`]
pub(crate) fn seconds(secs: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(secs)
        .ok()
        .filter(|delay| *delay <= MAX_SERVER_DELAY)
}
