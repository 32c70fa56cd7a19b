//! Error types that do not depend on any storage backend.

use std::{error::Error, fmt};

/// A date string that is not a valid 8-digit `YYYYMMDD` calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DateError {
    /// The input is not eight ASCII digits, or names a day that does not exist.
    Malformed { input: String },
    /// The date has no predecessor/successor in the supported calendar range.
    OutOfRange { date: String },
}

impl DateError {
    pub fn malformed(input: impl Into<String>) -> Self {
        Self::Malformed {
            input: input.into(),
        }
    }
}

impl fmt::Display for DateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed { input } => {
                write!(f, "malformed date `{input}`: expected YYYYMMDD")
            }
            Self::OutOfRange { date } => write!(f, "date {date} is out of range"),
        }
    }
}

impl Error for DateError {}

/// A cell that could not be converted to the requested type.
#[derive(Debug, Clone, PartialEq)]
pub struct CellTypeError {
    pub expected: &'static str,
    pub found: String,
}

impl fmt::Display for CellTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expected {}, found `{}`", self.expected, self.found)
    }
}

impl Error for CellTypeError {}
