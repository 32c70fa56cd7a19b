//! Calendar dates keyed as 8-digit strings.
//!
//! Every date that crosses a storage boundary (snapshot column headers,
//! schedule rows, adjustment rows, command-line arguments) is written as
//! `YYYYMMDD`. Time of day is never stored: callers that hold a timestamp
//! truncate it with `NaiveDateTime::date` before handing it over.

use chrono::{Days, NaiveDate};
use std::fmt::{self, Display};
use std::str::FromStr;

use crate::DateError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Deserializer, Serialize, Serializer};

const KEY_FORMAT: &str = "%Y%m%d";
const KEY_LEN: usize = 8;

/// A calendar day, ordered chronologically, displayed as `YYYYMMDD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateKey(NaiveDate);

impl DateKey {
    pub const fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Parse a strict `YYYYMMDD` string. Surrounding whitespace is ignored.
    pub fn parse(input: &str) -> Result<Self, DateError> {
        parse_date(input).map(Self)
    }

    pub const fn date(self) -> NaiveDate {
        self.0
    }

    /// The key for the day before this one.
    pub fn previous(self) -> Result<Self, DateError> {
        previous_day(self.0).map(Self)
    }
}

impl From<NaiveDate> for DateKey {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl From<DateKey> for NaiveDate {
    fn from(key: DateKey) -> Self {
        key.0
    }
}

impl Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(KEY_FORMAT))
    }
}

impl FromStr for DateKey {
    type Err = DateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(feature = "serde")]
impl Serialize for DateKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for DateKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Parse a strict `YYYYMMDD` string into a date.
pub fn parse_date(input: &str) -> Result<NaiveDate, DateError> {
    let trimmed = input.trim();
    if trimmed.len() != KEY_LEN || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DateError::malformed(input));
    }
    let field = |range: std::ops::Range<usize>| trimmed[range].parse::<u32>().ok();
    match (field(0..4), field(4..6), field(6..8)) {
        (Some(y), Some(m), Some(d)) => NaiveDate::from_ymd_opt(y as i32, m, d),
        _ => None,
    }
    .ok_or_else(|| DateError::malformed(input))
}

/// Render a date as its `YYYYMMDD` key.
pub fn format_date(date: NaiveDate) -> String {
    date.format(KEY_FORMAT).to_string()
}

pub fn previous_day(date: NaiveDate) -> Result<NaiveDate, DateError> {
    date.checked_sub_days(Days::new(1))
        .ok_or_else(|| DateError::OutOfRange {
            date: format_date(date),
        })
}

/// Hours from `from` to `to` at midnight, on a calendar where every day has
/// 24 hours. Negative when `to` precedes `from`.
pub fn hours_between(from: NaiveDate, to: NaiveDate) -> f64 {
    (to - from).num_days() as f64 * 24.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_and_formats_keys() {
        let key = DateKey::parse("20240229").unwrap();
        assert_eq!(key.date(), ymd(2024, 2, 29));
        assert_eq!(key.to_string(), "20240229");
        assert_eq!(format_date(ymd(2023, 1, 5)), "20230105");
        assert_eq!(" 20230105 ".parse::<DateKey>().unwrap().date(), ymd(2023, 1, 5));
    }

    #[test]
    fn rejects_malformed_keys() {
        for bad in ["2024-01-01", "2024011", "202401011", "20230229", "2024013a", ""] {
            assert!(
                matches!(parse_date(bad), Err(DateError::Malformed { .. })),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn previous_day_crosses_month_and_year() {
        assert_eq!(previous_day(ymd(2024, 3, 1)).unwrap(), ymd(2024, 2, 29));
        assert_eq!(
            DateKey::new(ymd(2024, 1, 1)).previous().unwrap().to_string(),
            "20231231"
        );
        assert!(previous_day(NaiveDate::MIN).is_err());
    }

    #[test]
    fn hours_between_counts_whole_days() {
        assert_eq!(hours_between(ymd(2024, 1, 1), ymd(2024, 1, 3)), 48.0);
        assert_eq!(hours_between(ymd(2024, 1, 3), ymd(2024, 1, 1)), -48.0);
        assert_eq!(hours_between(ymd(2024, 3, 30), ymd(2024, 4, 1)), 48.0);
    }

    #[test]
    fn keys_order_chronologically() {
        let mut keys = vec![
            DateKey::parse("20240110").unwrap(),
            DateKey::parse("20231231").unwrap(),
            DateKey::parse("20240101").unwrap(),
        ];
        keys.sort();
        let rendered: Vec<String> = keys.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, ["20231231", "20240101", "20240110"]);
    }
}
