//! Relative timestamp parsing.
//!
//! The source only reports comment ages as "N units ago". The display
//! truncates, so a comment shown as "8 hours ago" was created between 8 and
//! 9 hours ago; the parse therefore yields a bounds pair whose width is one
//! unit of the phrase's own precision.

use std::sync::OnceLock;

use chrono::{DateTime, Duration, Utc};
use regex::Regex;

fn pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(\d+)\s+([a-z]+?)s?\s+ago$").expect("valid relative-time pattern")
    })
}

/// Parse a relative phrase into `(created_after, created_before)` bounds.
///
/// Returns `None` for unrecognized phrases or units; callers treat that as a
/// hard protocol mismatch rather than silently dropping the field.
pub fn parse_relative(
    phrase: &str,
    now: DateTime<Utc>,
) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    // Edit markers ride along with the age phrase.
    let cleaned = phrase.trim().trim_end_matches("(edited)").trim().to_lowercase();

    let captures = pattern().captures(&cleaned)?;
    let count: i64 = captures.get(1)?.as_str().parse().ok()?;
    let unit = unit_duration(captures.get(2)?.as_str())?;

    let created_before = now - unit * count as i32;
    let created_after = created_before - unit;
    Some((created_after, created_before))
}

fn unit_duration(unit: &str) -> Option<Duration> {
    match unit {
        "second" => Some(Duration::seconds(1)),
        "minute" => Some(Duration::minutes(1)),
        "hour" => Some(Duration::hours(1)),
        "day" => Some(Duration::days(1)),
        "week" => Some(Duration::weeks(1)),
        "month" => Some(Duration::days(30)),
        "year" => Some(Duration::days(365)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eight_hours_ago_interval() {
        let now = Utc::now();
        let (after, before) = parse_relative("8 hours ago", now).unwrap();
        assert_eq!(before, now - Duration::hours(8));
        assert_eq!(before - after, Duration::hours(1));
        // The assumed creation time sits inside the bounds.
        let assumed = now - Duration::hours(8) - Duration::minutes(30);
        assert!(after < assumed && assumed < before);
    }

    #[test]
    fn test_singular_unit() {
        let now = Utc::now();
        let (after, before) = parse_relative("1 day ago", now).unwrap();
        assert_eq!(before, now - Duration::days(1));
        assert_eq!(before - after, Duration::days(1));
    }

    #[test]
    fn test_edited_suffix_stripped() {
        let now = Utc::now();
        assert!(parse_relative("3 weeks ago (edited)", now).is_some());
    }

    #[test]
    fn test_unrecognized_unit_is_rejected() {
        let now = Utc::now();
        assert!(parse_relative("8 fortnights ago", now).is_none());
        assert!(parse_relative("just now", now).is_none());
        assert!(parse_relative("", now).is_none());
    }
}
