//! RFC 3339 UTC timestamps (`YYYY-MM-DDTHH:MM:SSZ`) <-> unix seconds

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};

use crate::error::Error;

/// Seconds since the unix epoch. Datalog dates are unsigned, so earlier
/// instants are an error.
pub fn unix_seconds(t: DateTime<Utc>) -> Result<u64, Error> {
    u64::try_from(t.timestamp())
        .map_err(|_| Error::InvalidDate(t.to_rfc3339_opts(SecondsFormat::Secs, true)))
}

/// Parses the second-precision `Z` form only; offsets and fractions are
/// rejected.
pub fn parse_rfc3339(s: &str) -> Option<DateTime<Utc>> {
    if s.len() != 20 || s.as_bytes()[10] != b'T' || !s.ends_with('Z') {
        return None;
    }
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Renders in the same form `parse_rfc3339` accepts. Values past chrono's
/// range come out as `<seconds?>`.
pub fn format_rfc3339(seconds: u64) -> String {
    i64::try_from(seconds)
        .ok()
        .and_then(|s| Utc.timestamp_opt(s, 0).single())
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_else(|| format!("<{}?>", seconds))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seconds(s: &str) -> Option<u64> {
        parse_rfc3339(s).and_then(|dt| unix_seconds(dt).ok())
    }

    #[test]
    fn test_known_timestamps() {
        assert_eq!(seconds("1970-01-01T00:00:00Z"), Some(0));
        assert_eq!(seconds("2021-01-01T00:00:00Z"), Some(1_609_459_200));
        assert_eq!(seconds("2000-02-29T12:34:56Z"), Some(951_827_696));
        assert_eq!(seconds("2030-12-31T23:59:59Z"), Some(1_924_991_999));
    }

    #[test]
    fn test_format_matches_parse() {
        for s in ["1970-01-01T00:00:00Z", "2000-02-29T12:34:56Z", "2030-12-31T23:59:59Z"] {
            assert_eq!(format_rfc3339(seconds(s).unwrap()), s);
        }
        assert_eq!(format_rfc3339(u64::MAX), format!("<{}?>", u64::MAX));
    }

    #[test]
    fn test_invalid_dates_rejected() {
        assert!(parse_rfc3339("2021-02-29T00:00:00Z").is_none());
        assert!(parse_rfc3339("2021-13-01T00:00:00Z").is_none());
        assert!(parse_rfc3339("2021-01-01T24:00:00Z").is_none());
        assert!(parse_rfc3339("2021-01-01 00:00:00Z").is_none());
        assert!(parse_rfc3339("2021-01-01T00:00:00+01:00").is_none());
        assert!(parse_rfc3339("2021-01-01T00:00:00.5Z").is_none());
    }

    #[test]
    fn test_pre_epoch_is_reported() {
        let before = parse_rfc3339("1969-12-31T23:59:59Z").unwrap();
        assert_eq!(
            unix_seconds(before),
            Err(Error::InvalidDate("1969-12-31T23:59:59Z".to_string()))
        );
    }
}
