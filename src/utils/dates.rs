// src/utils/dates.rs

//! Date resolution helpers.
//!
//! The provider reports review dates two ways: an absolute epoch
//! timestamp buried in the payload, and a human-relative string such as
//! "2 weeks ago". The relative form is the last-resort tier when no
//! absolute path resolves.

use chrono::{DateTime, Duration, TimeZone, Utc};
use regex::Regex;
use std::sync::OnceLock;

/// Convert a provider epoch value to a timestamp.
///
/// The payload carries microseconds since the epoch; older payload
/// revisions used milliseconds. Both are accepted by magnitude.
pub fn from_epoch(value: i64) -> Option<DateTime<Utc>> {
    if value <= 0 {
        return None;
    }
    // 1e14 as microseconds is 1973; anything smaller is milliseconds.
    if value >= 100_000_000_000_000 {
        Utc.timestamp_micros(value).single()
    } else {
        Utc.timestamp_millis_opt(value).single()
    }
}

/// Resolve a human-relative date string against `now`.
///
/// Accepts the provider's English forms: "2 weeks ago", "a month ago",
/// "an hour ago", optionally prefixed with "Edited". Returns `None` for
/// anything unrecognized.
pub fn resolve_relative(text: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| {
        Regex::new(r"(?i)\b(a|an|\d+)\s+(second|minute|hour|day|week|month|year)s?\s+ago\b")
            .expect("relative date pattern is valid")
    });

    let caps = pattern.captures(text)?;
    let count: i64 = match &caps[1] {
        "a" | "A" | "an" | "An" => 1,
        digits => digits.parse().ok()?,
    };

    let delta = match caps[2].to_ascii_lowercase().as_str() {
        "second" => Duration::seconds(count),
        "minute" => Duration::minutes(count),
        "hour" => Duration::hours(count),
        "day" => Duration::days(count),
        "week" => Duration::weeks(count),
        "month" => Duration::days(30 * count),
        "year" => Duration::days(365 * count),
        _ => return None,
    };
    Some(now - delta)
}

/// Whether a string looks like a relative date at all.
pub fn is_relative_date(text: &str) -> bool {
    resolve_relative(text, Utc::now()).is_some() || text.trim().eq_ignore_ascii_case("just now")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_epoch_micros() {
        let date = from_epoch(1_700_000_000_000_000).unwrap();
        assert_eq!(date.timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_epoch_millis() {
        let date = from_epoch(1_700_000_000_000).unwrap();
        assert_eq!(date.timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_epoch_rejects_nonpositive() {
        assert!(from_epoch(0).is_none());
        assert!(from_epoch(-5).is_none());
    }

    #[test]
    fn test_relative_weeks() {
        let resolved = resolve_relative("2 weeks ago", now()).unwrap();
        assert_eq!(now() - resolved, Duration::weeks(2));
    }

    #[test]
    fn test_relative_articles() {
        assert_eq!(
            resolve_relative("a month ago", now()).unwrap(),
            now() - Duration::days(30)
        );
        assert_eq!(
            resolve_relative("an hour ago", now()).unwrap(),
            now() - Duration::hours(1)
        );
    }

    #[test]
    fn test_relative_with_edited_prefix() {
        assert_eq!(
            resolve_relative("Edited 3 days ago", now()).unwrap(),
            now() - Duration::days(3)
        );
    }

    #[test]
    fn test_relative_rejects_noise() {
        assert!(resolve_relative("Great food", now()).is_none());
        assert!(resolve_relative("", now()).is_none());
        assert!(resolve_relative("ago", now()).is_none());
    }

    #[test]
    fn test_is_relative_date() {
        assert!(is_relative_date("5 months ago"));
        assert!(is_relative_date("just now"));
        assert!(!is_relative_date("2024-01-01"));
    }
}
