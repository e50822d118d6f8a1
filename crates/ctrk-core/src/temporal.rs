//! # Temporal Types: UTC-Only Timestamps
//!
//! Defines `Timestamp`, the precise instant type every tracker record uses
//! internally. Dates cross the boundary as ISO-8601 strings; they are parsed
//! into a `Timestamp` on the way in and rendered as `YYYY-MM-DDTHH:MM:SSZ`
//! on the way out.
//!
//! ## Accepted inputs
//!
//! - RFC 3339 with any offset (`2023-11-29T23:59:59+05:30`), converted to UTC.
//! - RFC 3339 with `Z` suffix.
//! - A bare calendar date (`2023-11-29`), read as midnight UTC.
//!
//! Sub-second components are always discarded.

use chrono::{DateTime, Days, NaiveDate, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TrackerError;

/// A UTC-only timestamp, truncated to seconds precision.
///
/// # Construction
///
/// - [`Timestamp::now()`]: current UTC time, truncated.
/// - [`Timestamp::from_utc()`]: from a `DateTime<Utc>`, truncating sub-seconds.
/// - [`Timestamp::parse()`]: from an ISO-8601 string or calendar date.
/// - [`Timestamp::from_date()`]: midnight UTC of a calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Create a timestamp from the current UTC time, truncated to seconds.
    pub fn now() -> Self {
        Self(truncate_to_seconds(Utc::now()))
    }

    /// Create a timestamp from a `chrono::DateTime<Utc>`, truncating sub-seconds.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(truncate_to_seconds(dt))
    }

    /// Midnight UTC at the start of `date`.
    pub fn from_date(date: NaiveDate) -> Self {
        Self(date.and_time(chrono::NaiveTime::MIN).and_utc())
    }

    /// Parse an ISO-8601 timestamp or a bare `YYYY-MM-DD` date.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Validation`] if the input is neither valid
    /// RFC 3339 nor a calendar date.
    pub fn parse(s: &str) -> Result<Self, TrackerError> {
        let s = s.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(Self(truncate_to_seconds(dt.with_timezone(&Utc))));
        }
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Self::from_date)
            .map_err(|e| TrackerError::validation(format!("invalid ISO-8601 timestamp {s:?}: {e}")))
    }

    /// Access the inner `DateTime<Utc>`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// The UTC calendar date of this instant.
    pub fn date(&self) -> NaiveDate {
        self.0.date_naive()
    }

    /// This instant shifted forward by `days` whole days.
    ///
    /// Saturates at the representable range instead of failing.
    pub fn plus_days(&self, days: u64) -> Self {
        Self(self.0.checked_add_days(Days::new(days)).unwrap_or(DateTime::<Utc>::MAX_UTC))
    }

    /// This instant shifted back by `days` whole days, saturating.
    pub fn minus_days(&self, days: u64) -> Self {
        Self(self.0.checked_sub_days(Days::new(days)).unwrap_or(DateTime::<Utc>::MIN_UTC))
    }

    /// Render as ISO-8601 with Z suffix (e.g., `2023-11-29T23:59:59Z`).
    pub fn to_iso8601(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

impl std::str::FromStr for Timestamp {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Timestamp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_iso8601())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Truncate a `DateTime<Utc>` to seconds precision (discard nanoseconds).
fn truncate_to_seconds(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.with_nanosecond(0).unwrap_or(dt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn now_has_no_subseconds() {
        let ts = Timestamp::now();
        assert_eq!(ts.as_datetime().nanosecond(), 0);
    }

    #[test]
    fn from_utc_truncates() {
        let dt = Utc.with_ymd_and_hms(2023, 11, 29, 23, 59, 59).unwrap();
        let dt_with_nanos = dt.with_nanosecond(987_654_321).unwrap();
        let ts = Timestamp::from_utc(dt_with_nanos);
        assert_eq!(ts.to_iso8601(), "2023-11-29T23:59:59Z");
    }

    #[test]
    fn parse_z_suffix() {
        let ts = Timestamp::parse("2023-11-29T23:59:59Z").unwrap();
        assert_eq!(ts.to_iso8601(), "2023-11-29T23:59:59Z");
    }

    #[test]
    fn parse_converts_offset_to_utc() {
        let ts = Timestamp::parse("2023-11-30T05:29:59+05:30").unwrap();
        assert_eq!(ts.to_iso8601(), "2023-11-29T23:59:59Z");
    }

    #[test]
    fn parse_truncates_millis() {
        let ts = Timestamp::parse("2024-01-15T10:30:00.000Z").unwrap();
        assert_eq!(ts.to_iso8601(), "2024-01-15T10:30:00Z");
    }

    #[test]
    fn parse_bare_date_is_midnight() {
        let ts = Timestamp::parse("2024-07-31").unwrap();
        assert_eq!(ts.to_iso8601(), "2024-07-31T00:00:00Z");
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(Timestamp::parse("not-a-date").is_err());
        assert!(Timestamp::parse("").is_err());
        assert!(Timestamp::parse("2024-13-01").is_err());
    }

    #[test]
    fn plus_days_crosses_month() {
        let ts = Timestamp::parse("2024-01-31T12:00:00Z").unwrap();
        assert_eq!(ts.plus_days(1).to_iso8601(), "2024-02-01T12:00:00Z");
        assert_eq!(ts.plus_days(30).to_iso8601(), "2024-03-01T12:00:00Z");
    }

    #[test]
    fn minus_days_undoes_plus_days() {
        let t = Timestamp::parse("2024-03-01T12:00:00Z").unwrap();
        assert_eq!(t.plus_days(45).minus_days(45), t);
        assert_eq!(t.minus_days(1).to_iso8601(), "2024-02-29T12:00:00Z");
    }

    #[test]
    fn ordering_follows_instant() {
        let earlier = Timestamp::parse("2024-01-15T12:00:00Z").unwrap();
        let later = Timestamp::parse("2024-01-15T12:00:01Z").unwrap();
        assert!(earlier < later);
    }

    #[test]
    fn serde_uses_iso8601_string() {
        let ts = Timestamp::parse("2023-11-29T23:59:59Z").unwrap();
        let json = serde_json::to_string(&ts).unwrap();
        assert_eq!(json, "\"2023-11-29T23:59:59Z\"");
        let parsed: Timestamp = serde_json::from_str("\"2023-11-29\"").unwrap();
        assert_eq!(parsed.date(), ts.date());
    }
}
