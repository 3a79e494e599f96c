//! Timestamp helpers
//!
//! Records carry ISO-8601 instants internally. The sheet shows a display
//! string in the en-US `toLocaleString` shape, which is lossy: decoding it
//! back gives second precision at best.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};

/// Display format written to the `Created` column (`6/1/2024, 3:04:05 PM`)
pub const DISPLAY_FORMAT: &str = "%-m/%-d/%Y, %-I:%M:%S %p";

const PARSE_DISPLAY_FORMAT: &str = "%m/%d/%Y, %I:%M:%S %p";
const PARSE_SQLISH_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const PARSE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Current instant
#[inline]
#[must_use]
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Unix epoch, used as the sort key of unreadable timestamps
#[inline]
#[must_use]
pub fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::default()
}

/// Render an instant as ISO-8601 with millisecond precision
#[inline]
#[must_use]
pub fn to_iso(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Render an instant for a sheet cell
#[inline]
#[must_use]
pub fn to_display(at: &DateTime<Utc>) -> String {
    at.format(DISPLAY_FORMAT).to_string()
}

/// Parse any timestamp shape the sheet has been seen to hold.
///
/// Tries RFC 3339, the display format, `YYYY-MM-DD HH:MM:SS` and a bare
/// date, in that order. Naive values are read as UTC.
#[must_use]
pub fn parse_flexible(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(at) = DateTime::parse_from_rfc3339(value) {
        return Some(at.with_timezone(&Utc));
    }

    for format in [PARSE_DISPLAY_FORMAT, PARSE_SQLISH_FORMAT] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    NaiveDate::parse_from_str(value, PARSE_DATE_FORMAT)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Serde adapter that never fails on a malformed timestamp.
///
/// Unreadable or null values load as the epoch.
pub mod lenient {
    use super::{epoch, parse_flexible, to_iso};
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serialize as ISO-8601
    pub fn serialize<S: Serializer>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&to_iso(at))
    }

    /// Deserialize from any string, falling back to the epoch
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
        Ok(match raw {
            Some(serde_json::Value::String(s)) => parse_flexible(&s).unwrap_or_else(epoch),
            _ => epoch(),
        })
    }
}
