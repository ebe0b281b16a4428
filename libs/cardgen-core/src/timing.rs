//! Time helpers: Retry-After parsing and elapsed-time formatting.

use chrono::{DateTime, Utc};

/// Fallback when a Retry-After value is absent or unparseable.
pub const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Parse a Retry-After header value into seconds from now.
///
/// Accepts the integer-seconds form or an HTTP date (RFC 2822). Falls back
/// to [`DEFAULT_RETRY_AFTER_SECS`] and floors at zero.
pub fn parse_retry_after(value: Option<&str>, now: DateTime<Utc>) -> u64 {
    let Some(value) = value else {
        return DEFAULT_RETRY_AFTER_SECS;
    };
    let value = value.trim();

    if let Ok(secs) = value.parse::<i64>() {
        return secs.max(0) as u64;
    }

    if let Ok(date) = DateTime::parse_from_rfc2822(value) {
        let until = date.with_timezone(&Utc) - now;
        return until.num_seconds().max(0) as u64;
    }

    DEFAULT_RETRY_AFTER_SECS
}

/// Format an elapsed duration for display: `"45s"`, `"1m 5s"`.
pub fn format_elapsed_time(seconds: u64) -> String {
    if seconds < 60 {
        format!("{}s", seconds)
    } else {
        format!("{}m {}s", seconds / 60, seconds % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn integer_seconds_form() {
        assert_eq!(parse_retry_after(Some("120"), Utc::now()), 120);
        assert_eq!(parse_retry_after(Some(" 30 "), Utc::now()), 30);
    }

    #[test]
    fn negative_seconds_floor_at_zero() {
        assert_eq!(parse_retry_after(Some("-5"), Utc::now()), 0);
    }

    #[test]
    fn absent_header_defaults() {
        assert_eq!(parse_retry_after(None, Utc::now()), DEFAULT_RETRY_AFTER_SECS);
    }

    #[test]
    fn garbage_defaults() {
        assert_eq!(
            parse_retry_after(Some("soonish"), Utc::now()),
            DEFAULT_RETRY_AFTER_SECS
        );
    }

    #[test]
    fn http_date_form() {
        let now = DateTime::parse_from_rfc2822("Wed, 21 Oct 2015 07:28:00 GMT")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(
            parse_retry_after(Some("Wed, 21 Oct 2015 07:30:00 GMT"), now),
            120
        );
    }

    #[test]
    fn past_http_date_floors_at_zero() {
        let now = DateTime::parse_from_rfc2822("Wed, 21 Oct 2015 07:28:00 GMT")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(parse_retry_after(Some("Wed, 21 Oct 2015 07:00:00 GMT"), now), 0);
    }

    #[test]
    fn elapsed_formatting() {
        assert_eq!(format_elapsed_time(0), "0s");
        assert_eq!(format_elapsed_time(59), "59s");
        assert_eq!(format_elapsed_time(60), "1m 0s");
        assert_eq!(format_elapsed_time(125), "2m 5s");
    }
}
