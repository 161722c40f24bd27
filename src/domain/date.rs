//! Deadlines and other optional points in time
//!
//! A [`MaybeDate`] is either a concrete instant or [`MaybeDate::Never`].
//! "Never" sorts after every concrete instant, so the soonest of a set of
//! deadlines is simply their minimum.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Text used for [`MaybeDate::Never`] in the serialized form
pub const NEVER: &str = "never";

#[derive(Debug, Error, PartialEq)]
pub enum DateError {
    #[error("Invalid date: expected 'YYYY-MM-DD', an RFC 3339 timestamp or 'never', got '{0}'")]
    Invalid(String),

    #[error("Timestamp out of range: {0} ms")]
    OutOfRange(i64),
}

/// A concrete instant or "no date at all"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MaybeDate {
    /// A specific point in time
    At(DateTime<Utc>),
    /// No date; later than every concrete instant
    #[default]
    Never,
}

impl MaybeDate {
    /// Midnight UTC at the start of the given calendar day
    pub fn ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self::from_date)
    }

    /// Midnight UTC at the start of `date`
    pub fn from_date(date: NaiveDate) -> Self {
        MaybeDate::At(Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)))
    }

    /// Milliseconds since the Unix epoch
    pub fn from_millis(millis: i64) -> Result<Self, DateError> {
        DateTime::from_timestamp_millis(millis)
            .map(MaybeDate::At)
            .ok_or(DateError::OutOfRange(millis))
    }

    pub fn is_never(&self) -> bool {
        matches!(self, MaybeDate::Never)
    }

    /// Returns the concrete instant, if any
    pub fn instant(&self) -> Option<DateTime<Utc>> {
        match self {
            MaybeDate::At(at) => Some(*at),
            MaybeDate::Never => None,
        }
    }

    /// Milliseconds since the Unix epoch, or positive infinity for `Never`
    pub fn numeric_time(&self) -> f64 {
        match self {
            MaybeDate::At(at) => at.timestamp_millis() as f64,
            MaybeDate::Never => f64::INFINITY,
        }
    }

    /// Time left from `now` until this date; `None` for `Never`
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.instant().map(|at| at.signed_duration_since(now))
    }

    /// Returns true if this date is less than `window` away from `now`
    ///
    /// Dates in the past are always within the window; `Never` never is.
    pub fn is_within(&self, now: DateTime<Utc>, window: Duration) -> bool {
        self.remaining(now).is_some_and(|left| left < window)
    }

    /// The sooner of two dates
    pub fn earliest(self, other: Self) -> Self {
        self.min(other)
    }

    /// Calendar date (`YYYY-MM-DD`), or `never_label` for `Never`
    pub fn display_or(&self, never_label: &str) -> String {
        match self {
            MaybeDate::At(at) => at.format("%Y-%m-%d").to_string(),
            MaybeDate::Never => never_label.to_string(),
        }
    }

    /// Text form used when serializing
    ///
    /// Instants at midnight UTC are written as a calendar date, anything
    /// else as RFC 3339 with millisecond precision.
    fn wire_form(&self) -> String {
        match self {
            MaybeDate::At(at) if at.time() == NaiveTime::MIN => at.format("%Y-%m-%d").to_string(),
            MaybeDate::At(at) => at.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            MaybeDate::Never => NEVER.to_string(),
        }
    }
}

impl Ord for MaybeDate {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (MaybeDate::At(a), MaybeDate::At(b)) => a.cmp(b),
            (MaybeDate::At(_), MaybeDate::Never) => Ordering::Less,
            (MaybeDate::Never, MaybeDate::At(_)) => Ordering::Greater,
            (MaybeDate::Never, MaybeDate::Never) => Ordering::Equal,
        }
    }
}

impl PartialOrd for MaybeDate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<DateTime<Utc>> for MaybeDate {
    fn from(at: DateTime<Utc>) -> Self {
        MaybeDate::At(at)
    }
}

impl From<Option<DateTime<Utc>>> for MaybeDate {
    fn from(at: Option<DateTime<Utc>>) -> Self {
        at.map_or(MaybeDate::Never, MaybeDate::At)
    }
}

impl fmt::Display for MaybeDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.wire_form())
    }
}

impl FromStr for MaybeDate {
    type Err = DateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case(NEVER) {
            return Ok(MaybeDate::Never);
        }

        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return Ok(MaybeDate::from_date(date));
        }

        DateTime::parse_from_rfc3339(s)
            .map(|at| MaybeDate::At(at.with_timezone(&Utc)))
            .map_err(|_| DateError::Invalid(s.to_string()))
    }
}

impl Serialize for MaybeDate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.wire_form())
    }
}

impl<'de> Deserialize<'de> for MaybeDate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct MaybeDateVisitor;

        impl Visitor<'_> for MaybeDateVisitor {
            type Value = MaybeDate;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a date string, 'never', or milliseconds since the epoch")
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                value.parse().map_err(E::custom)
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                MaybeDate::from_millis(value).map_err(E::custom)
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                let millis = i64::try_from(value).map_err(E::custom)?;
                self.visit_i64(millis)
            }

            fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                if value.is_finite() && value.fract() == 0.0 {
                    self.visit_i64(value as i64)
                } else {
                    Err(E::custom(format!("invalid timestamp: {value}")))
                }
            }
        }

        deserializer.deserialize_any(MaybeDateVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> MaybeDate {
        s.parse().unwrap()
    }

    #[test]
    fn never_sorts_after_every_instant() {
        let far_future = MaybeDate::ymd(9999, 12, 31).unwrap();
        assert!(far_future < MaybeDate::Never);
        assert!(MaybeDate::Never > date("1970-01-01"));
        assert_eq!(MaybeDate::Never.cmp(&MaybeDate::Never), Ordering::Equal);
        assert!(date("2030-01-30") < date("2030-02-01"));
    }

    #[test]
    fn earliest_prefers_concrete_dates() {
        let d = date("2030-01-30");
        assert_eq!(MaybeDate::Never.earliest(d), d);
        assert_eq!(d.earliest(MaybeDate::Never), d);
        assert_eq!(d.earliest(date("2030-02-01")), d);
    }

    #[test]
    fn numeric_time() {
        assert_eq!(MaybeDate::Never.numeric_time(), f64::INFINITY);
        assert_eq!(date("1970-01-02").numeric_time(), 86_400_000.0);
    }

    #[test]
    fn within_window() {
        let now = date("2004-05-06").instant().unwrap();
        let one_day = Duration::days(1);

        assert!(date("2004-05-05").is_within(now, one_day));
        assert!(date("2004-05-06T12:00:00Z").is_within(now, one_day));
        assert!(!date("2004-05-07").is_within(now, one_day));
        assert!(!MaybeDate::Never.is_within(now, Duration::days(100_000)));
    }

    #[test]
    fn parse_forms() {
        assert_eq!(date("never"), MaybeDate::Never);
        assert_eq!(date("Never"), MaybeDate::Never);
        assert_eq!(date("2024-04-15"), MaybeDate::ymd(2024, 4, 15).unwrap());
        assert_eq!(date("2024-04-15T00:00:00.000Z"), MaybeDate::ymd(2024, 4, 15).unwrap());
        assert!("tomorrow".parse::<MaybeDate>().is_err());
        assert!("2024-13-01".parse::<MaybeDate>().is_err());
    }

    #[test]
    fn display_or_uses_label_for_never() {
        assert_eq!(MaybeDate::Never.display_or("-"), "-");
        assert_eq!(date("2025-06-07").display_or("-"), "2025-06-07");
        assert_eq!(date("2025-06-07T15:30:00Z").display_or("-"), "2025-06-07");
    }

    #[test]
    fn serde_text_forms() {
        let json = serde_json::to_string(&date("2030-02-01")).unwrap();
        assert_eq!(json, "\"2030-02-01\"");

        let json = serde_json::to_string(&date("2030-02-01T08:15:00Z")).unwrap();
        assert_eq!(json, "\"2030-02-01T08:15:00.000Z\"");

        let json = serde_json::to_string(&MaybeDate::Never).unwrap();
        assert_eq!(json, "\"never\"");
    }

    #[test]
    fn deserialize_accepts_millis() {
        let parsed: MaybeDate = serde_json::from_str("86400000").unwrap();
        assert_eq!(parsed, date("1970-01-02"));

        let parsed: MaybeDate = serde_json::from_str("\"2030-02-01T08:15:00+02:00\"").unwrap();
        assert_eq!(parsed, date("2030-02-01T06:15:00Z"));

        assert!(serde_json::from_str::<MaybeDate>("true").is_err());
        assert!(serde_json::from_str::<MaybeDate>("\"soon\"").is_err());
    }
}
