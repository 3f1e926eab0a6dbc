//! Server-paced wait computation.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// How long to wait before polling again, given the server's `waitUntil` hint.
///
/// A hint in the past polls immediately. A missing or unparseable hint falls
/// back to `fallback`.
pub fn delay_until(wait_until: Option<&str>, now: DateTime<Utc>, fallback: Duration) -> Duration {
    let Some(deadline) = wait_until.and_then(parse_timestamp) else {
        return fallback;
    };
    (deadline - now).to_std().unwrap_or(Duration::ZERO)
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
