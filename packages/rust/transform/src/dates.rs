//! Feed calendar-date parsing.
//!
//! The feed publishes dates as `YYYY-MM-DD`. Parsed values are normalized to
//! UTC midnight. Malformed input fails loudly; there is no fallback value.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};

use vulnfeed_shared::{Result, VulnfeedError};

/// The feed's documented calendar-date format.
const FEED_DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a mandatory date field into UTC midnight.
///
/// `record` is the advisory identifier, carried into the error so callers
/// can apply per-record failure policy.
pub fn parse_date(record: &str, value: &str) -> Result<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(value.trim(), FEED_DATE_FORMAT)
        .map_err(|_| VulnfeedError::malformed_date(record, value))?;

    Ok(Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)))
}

/// Parse an optional date field. Empty or whitespace-only input is absent,
/// not an error; anything else must parse.
pub fn parse_optional_date(record: &str, value: &str) -> Result<Option<DateTime<Utc>>> {
    if value.trim().is_empty() {
        return Ok(None);
    }
    parse_date(record, value).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn parse_date_normalizes_to_utc_midnight() {
        let parsed = parse_date("CVE-2025-0108", "2025-02-18").expect("parse date");
        assert_eq!(parsed.to_rfc3339(), "2025-02-18T00:00:00+00:00");
        assert_eq!(parsed.hour(), 0);
    }

    #[test]
    fn parse_date_rejects_malformed_input() {
        for bad in ["18-02-2025", "2025/02/18", "yesterday", ""] {
            let err = parse_date("CVE-2025-0108", bad).unwrap_err();
            match err {
                VulnfeedError::MalformedDate { record, value } => {
                    assert_eq!(record, "CVE-2025-0108");
                    assert_eq!(value, bad);
                }
                other => panic!("expected MalformedDate, got {other}"),
            }
        }
    }

    #[test]
    fn parse_date_rejects_impossible_calendar_day() {
        assert!(parse_date("CVE-2025-0108", "2025-02-30").is_err());
    }

    #[test]
    fn optional_date_absent_when_empty() {
        assert_eq!(parse_optional_date("CVE-1", "").unwrap(), None);
        assert_eq!(parse_optional_date("CVE-1", "   ").unwrap(), None);
    }

    #[test]
    fn optional_date_parses_when_present() {
        let parsed = parse_optional_date("CVE-1", "2025-03-11").expect("parse optional");
        assert_eq!(
            parsed.map(|d| d.to_rfc3339()),
            Some("2025-03-11T00:00:00+00:00".into())
        );
    }

    #[test]
    fn optional_date_still_fails_on_garbage() {
        assert!(parse_optional_date("CVE-1", "soon").is_err());
    }
}
