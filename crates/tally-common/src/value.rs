use chrono::{Duration as ChronoDur, NaiveDate};
use std::fmt::{self, Display};

use crate::{CellTypeError, DateError, format_date, parse_date};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/* ───────────────────── Spreadsheet date-serial utilities ───────────────────
The 1900 serial date system used by xlsx files:
  Serial 1  = 1900-01-01
  Serial 59 = 1900-02-28
  Serial 60 = 1900-02-29  (phantom: doesn't exist, but the format thinks it does)
  Serial 61 = 1900-03-01
Base date = 1899-12-31 so that serial 1 = base + 1 day = 1900-01-01.
Only whole days are meaningful here; the time fraction is dropped.
------------------------------------------------------------------- */

/// Base date for the 1900 date system. Serial 1 = base + 1 day = 1900-01-01.
const SERIAL_EPOCH: NaiveDate = NaiveDate::from_ymd_opt(1899, 12, 31).unwrap();
const PHANTOM_LEAP_DAY: i64 = 60;

pub fn date_to_serial(date: NaiveDate) -> f64 {
    let days = (date - SERIAL_EPOCH).num_days();
    // Dates after the phantom 1900-02-29 are shifted by one.
    let serial = if days >= PHANTOM_LEAP_DAY { days + 1 } else { days };
    serial as f64
}

pub fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() {
        return None;
    }
    let days = serial.trunc() as i64;
    let offset = match days {
        d if d < PHANTOM_LEAP_DAY => d,
        // Serial 60 is the phantom 1900-02-29; map it to 1900-02-28.
        PHANTOM_LEAP_DAY => PHANTOM_LEAP_DAY - 1,
        d => d - 1,
    };
    SERIAL_EPOCH.checked_add_signed(ChronoDur::try_days(offset)?)
}

/// One table cell as read from a delimited-text file or a spreadsheet.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Number(f64),
    Text(String),
    Bool(bool),
    Date(NaiveDate),
}

impl Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Number(n) => write!(f, "{n}"),
            Cell::Text(s) => write!(f, "{s}"),
            Cell::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            Cell::Date(d) => write!(f, "{}", format_date(*d)),
        }
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<NaiveDate> for Cell {
    fn from(value: NaiveDate) -> Self {
        Cell::Date(value)
    }
}

impl Cell {
    /// True for `Empty` and for text that is blank after trimming.
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Numeric view. Blank cells are `Ok(None)`; text must parse as a float.
    pub fn to_number(&self) -> Result<Option<f64>, CellTypeError> {
        if self.is_blank() {
            return Ok(None);
        }
        match self {
            Cell::Number(n) => Ok(Some(*n)),
            Cell::Text(s) => s
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|_| self.type_error("number")),
            _ => Err(self.type_error("number")),
        }
    }

    /// Text view. Blank cells are `None`; numbers render without a trailing
    /// fraction when integral, so a numeric id `101` reads back as `"101"`.
    pub fn to_text(&self) -> Option<String> {
        if self.is_blank() {
            return None;
        }
        match self {
            Cell::Text(s) => Some(s.trim().to_string()),
            other => Some(other.to_string()),
        }
    }

    /// Date view. Accepts date cells, `YYYYMMDD` text, and integral numbers
    /// such as `20240131` that spreadsheets store for unformatted date keys.
    pub fn to_date(&self) -> Result<Option<NaiveDate>, DateError> {
        if self.is_blank() {
            return Ok(None);
        }
        match self {
            Cell::Date(d) => Ok(Some(*d)),
            Cell::Number(n) if n.fract() == 0.0 => parse_date(&format!("{n}")).map(Some),
            other => parse_date(&other.to_string()).map(Some),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Cell::Empty => "empty",
            Cell::Number(_) => "number",
            Cell::Text(_) => "text",
            Cell::Bool(_) => "boolean",
            Cell::Date(_) => "date",
        }
    }

    fn type_error(&self, expected: &'static str) -> CellTypeError {
        CellTypeError {
            expected,
            found: self.to_string(),
        }
    }
}
