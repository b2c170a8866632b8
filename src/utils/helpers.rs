//! Helper functions and utilities
//!
//! This module contains common helper functions used throughout the application.

use chrono::{DateTime, NaiveDate, Utc};

/// Format a timestamp for display
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M UTC").to_string()
}

/// Truncate text to a maximum number of characters with ellipsis
pub fn truncate_text(text: &str, max_length: usize) -> String {
    if text.chars().count() <= max_length {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max_length.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Normalize whitespace in text
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Validate email format
pub fn is_valid_email(email: &str) -> bool {
    email.contains('@') && email.contains('.') && email.len() > 5
}

/// Parse a `date` query filter
///
/// Accepts a full RFC 3339 timestamp or a bare `YYYY-MM-DD` day, which is
/// taken as midnight UTC.
pub fn parse_date_filter(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Some(timestamp.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("hello", 10), "hello");
        assert_eq!(truncate_text("hello world", 8), "hello...");
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  register \n me  now "), "register me now");
    }

    #[test]
    fn test_parse_date_filter() {
        let day = parse_date_filter("2026-03-01").unwrap();
        assert_eq!(day, Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap());

        let exact = parse_date_filter("2026-03-01T10:30:00+02:00").unwrap();
        assert_eq!(exact, Utc.with_ymd_and_hms(2026, 3, 1, 8, 30, 0).unwrap());

        assert!(parse_date_filter("next tuesday").is_none());
    }

    #[test]
    fn test_format_timestamp() {
        let ts = Utc.with_ymd_and_hms(2026, 3, 1, 18, 5, 0).unwrap();
        assert_eq!(format_timestamp(ts), "2026-03-01 18:05 UTC");
    }

    #[test]
    fn test_is_valid_email() {
        assert!(is_valid_email("ada@campus.edu"));
        assert!(!is_valid_email("ada"));
    }
}
