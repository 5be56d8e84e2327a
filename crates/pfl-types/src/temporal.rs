use std::fmt;

use chrono::{DateTime, Months, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Date-only canonical form of a point in time.
///
/// Snapshot dates, schedule occurrence dates, and generated-entry dates
/// are all canonical dates: a timestamp is truncated to its date in UTC
/// before comparison or storage. Ordering is plain date order.
///
/// Serializes as a `YYYY-MM-DD` string; deserialization is lenient and
/// accepts full timestamps, truncating them.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalDate(NaiveDate);

impl CanonicalDate {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Result<Self, TypeError> {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(Self)
            .ok_or_else(|| TypeError::InvalidDate(format!("{year:04}-{month:02}-{day:02}")))
    }

    /// Truncate a UTC timestamp to its canonical date.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt.date_naive())
    }

    /// Parse a strict `YYYY-MM-DD` string.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
            .map(Self)
            .map_err(|_| TypeError::InvalidDate(s.to_string()))
    }

    /// Parse a date or timestamp string, truncating timestamps to their
    /// UTC date. Accepts every form [`parse_timestamp`] accepts.
    pub fn parse_lenient(s: &str) -> Result<Self, TypeError> {
        if let Ok(date) = Self::parse(s) {
            return Ok(date);
        }
        parse_timestamp(s)
            .map(Self::from_datetime)
            .map_err(|_| TypeError::InvalidDate(s.to_string()))
    }

    /// The date `months` calendar months later, clamped to the end of the
    /// target month. `None` only on date-range overflow.
    pub fn plus_months(&self, months: u32) -> Option<Self> {
        self.0.checked_add_months(Months::new(months)).map(Self)
    }

    /// The date `years` calendar years later.
    pub fn plus_years(&self, years: u32) -> Option<Self> {
        self.plus_months(years.checked_mul(12)?)
    }

    /// Midnight UTC on this date.
    pub fn at_midnight_utc(&self) -> DateTime<Utc> {
        // and_hms_opt(0, 0, 0) is always valid
        self.0
            .and_hms_opt(0, 0, 0)
            .unwrap_or_default()
            .and_utc()
    }

    pub fn as_naive(&self) -> NaiveDate {
        self.0
    }
}

impl fmt::Debug for CanonicalDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CanonicalDate({})", self.0.format(DATE_FORMAT))
    }
}

impl fmt::Display for CanonicalDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DATE_FORMAT))
    }
}

impl Serialize for CanonicalDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0.format(DATE_FORMAT))
    }
}

impl<'de> Deserialize<'de> for CanonicalDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse_lenient(&s).map_err(serde::de::Error::custom)
    }
}

/// Parse a timestamp string into a UTC instant.
///
/// Accepted forms, tried in order:
/// - RFC 3339 (`2024-01-15T10:30:00Z`, `2024-01-15T10:30:00+02:00`)
/// - Naive date-time, treated as UTC (`2024-01-15T10:30:00`, with or
///   without fractional seconds)
/// - Date only, treated as midnight UTC (`2024-01-15`)
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, TypeError> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, DATE_FORMAT) {
        return Ok(CanonicalDate(date).at_midnight_utc());
    }
    Err(TypeError::InvalidTimestamp(s.to_string()))
}
