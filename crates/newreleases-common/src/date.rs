//! Partial-precision release dates and recency comparisons.
//!
//! Catalog release dates come as `YYYY`, `YYYY-MM`, or `YYYY-MM-DD`. Missing
//! components round down to the earliest value in their unit (January, the
//! 1st), so a coarse date can make a release look older than it is but never
//! newer.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};

/// Granularity a release date was published with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatePrecision {
    /// Only the year is known.
    Year,
    /// Year and month are known.
    Month,
    /// The exact day is known.
    Day,
}

impl fmt::Display for DatePrecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Year => write!(f, "year"),
            Self::Month => write!(f, "month"),
            Self::Day => write!(f, "day"),
        }
    }
}

/// A release date with declared precision.
///
/// The stored [`NaiveDate`] already carries the conservative rounding: a
/// `"2025"` date is held as 2025-01-01 with [`DatePrecision::Year`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PartialDate {
    date: NaiveDate,
    precision: DatePrecision,
}

impl PartialDate {
    /// Parse a catalog release date.
    ///
    /// Accepts `YYYY`, `YYYY-MM` and `YYYY-MM-DD`; a trailing `T...` time
    /// component is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] when the input is empty, does not start with a
    /// digit, has a malformed component, or names a day that does not exist.
    pub fn parse(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(Error::parse("empty release date"));
        }
        if !trimmed.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(Error::parse(format!("release date is not numeric: {trimmed:?}")));
        }

        let date_part = trimmed.split('T').next().unwrap_or(trimmed);
        let parts: Vec<&str> = date_part.split('-').collect();

        let (year, month, day, precision) = match parts.as_slice() {
            [y] => (component(y, 4, trimmed)?, 1, 1, DatePrecision::Year),
            [y, m] => (
                component(y, 4, trimmed)?,
                component(m, 2, trimmed)?,
                1,
                DatePrecision::Month,
            ),
            [y, m, d] => (
                component(y, 4, trimmed)?,
                component(m, 2, trimmed)?,
                component(d, 2, trimmed)?,
                DatePrecision::Day,
            ),
            _ => return Err(Error::parse(format!("unrecognised release date: {trimmed:?}"))),
        };

        let date = i32::try_from(year)
            .ok()
            .and_then(|y| NaiveDate::from_ymd_opt(y, month, day))
            .ok_or_else(|| Error::parse(format!("release date out of range: {trimmed:?}")))?;

        Ok(Self { date, precision })
    }

    /// Build a day-precision date from a calendar date.
    pub fn from_naive(date: NaiveDate) -> Self {
        Self {
            date,
            precision: DatePrecision::Day,
        }
    }

    /// The precision the catalog declared for this date.
    pub fn precision(&self) -> DatePrecision {
        self.precision
    }

    /// The conservatively-rounded calendar date.
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Midnight UTC on the conservatively-rounded date.
    pub fn to_comparable_instant(&self) -> DateTime<Utc> {
        self.date.and_time(chrono::NaiveTime::MIN).and_utc()
    }

    /// `true` iff this date falls no earlier than `window_days` before `now`.
    /// A window reaching past the earliest representable instant covers every
    /// date.
    pub fn is_within(&self, window_days: u32, now: DateTime<Utc>) -> bool {
        match now.checked_sub_signed(Duration::days(i64::from(window_days))) {
            Some(cutoff) => self.to_comparable_instant() >= cutoff,
            None => true,
        }
    }
}

/// Parse one numeric date component of exactly `width` digits.
fn component(part: &str, width: usize, whole: &str) -> Result<u32> {
    if part.len() != width || !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::parse(format!("malformed release date: {whole:?}")));
    }
    part.parse::<u32>()
        .map_err(|_| Error::parse(format!("malformed release date: {whole:?}")))
}

/// Ordering for newest-first lists.
///
/// Dated releases come before undated ones; among dated releases the later
/// instant sorts first. Equal instants compare equal so stable sorts keep
/// their input order.
pub fn compare_newest_first(a: Option<&PartialDate>, b: Option<&PartialDate>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.to_comparable_instant().cmp(&a.to_comparable_instant()),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

impl FromStr for PartialDate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for PartialDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = self.date;
        match self.precision {
            DatePrecision::Year => write!(f, "{:04}", d.year()),
            DatePrecision::Month => write!(f, "{:04}-{:02}", d.year(), d.month()),
            DatePrecision::Day => write!(f, "{:04}-{:02}-{:02}", d.year(), d.month(), d.day()),
        }
    }
}

impl Serialize for PartialDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PartialDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
