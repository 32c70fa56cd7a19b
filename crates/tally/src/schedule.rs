//! Piecewise-linear completion schedule.

use chrono::NaiveDate;
use tally_common::hours_between;
use tally_table::{Table, TableError};

use crate::error::{ReportError, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SchedulePoint {
    pub date: NaiveDate,
    /// Fraction of the full target that should be met by `date`.
    pub value: f64,
}

impl SchedulePoint {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

/// At least two control points with strictly increasing dates.
#[derive(Debug, Clone, PartialEq)]
pub struct Schedule {
    points: Vec<SchedulePoint>,
}

impl Schedule {
    /// Sort `points` by date and check that there are at least two of them
    /// and no date repeats.
    pub fn new(mut points: Vec<SchedulePoint>) -> Result<Self> {
        points.sort_by_key(|p| p.date);
        if points.len() < 2 {
            return Err(ReportError::InvalidSchedule(format!(
                "need at least 2 points, got {}",
                points.len()
            )));
        }
        if let Some(dup) = points.windows(2).find(|w| w[0].date == w[1].date) {
            return Err(ReportError::InvalidSchedule(format!(
                "date {} appears more than once",
                dup[0].date.format("%Y%m%d")
            )));
        }
        Ok(Self { points })
    }

    /// Read a DATE, VALUE table. DATE cells may be `YYYYMMDD` text or typed
    /// dates; an empty VALUE is 1.0.
    pub fn from_table(table: &Table) -> Result<Self> {
        let invalid = |source: TableError| ReportError::Validation {
            what: "schedule".to_string(),
            source,
        };
        table.require(&["DATE", "VALUE"]).map_err(invalid)?;
        let values = table.numbers("VALUE").map_err(invalid)?;
        let dates = table.column("DATE").unwrap_or_default();

        let mut points = Vec::with_capacity(dates.len());
        for (row, (cell, value)) in dates.iter().zip(values).enumerate() {
            let date = cell.to_date()?.ok_or_else(|| {
                ReportError::InvalidSchedule(format!("row {}: empty DATE", row + 2))
            })?;
            points.push(SchedulePoint::new(date, value.unwrap_or(1.0)));
        }
        Self::new(points)
    }

    pub fn points(&self) -> &[SchedulePoint] {
        &self.points
    }

    pub fn start(&self) -> NaiveDate {
        self.points[0].date
    }

    pub fn end(&self) -> NaiveDate {
        self.points[self.points.len() - 1].date
    }

    /// Completion factor at `date`.
    ///
    /// Interpolates on the first segment whose right end lies strictly after
    /// `date`, so every control point except the last returns its own value.
    /// Dates before the first point extrapolate the first segment. At or
    /// after the last point the factor is NaN.
    ///
    /// Elapsed time is counted in naive 24-hour days rather than local wall
    /// clock time, so a segment spanning a daylight-saving change does not
    /// gain or lose an hour.
    pub fn factor_at(&self, date: NaiveDate) -> f64 {
        for w in self.points.windows(2) {
            let (p1, p2) = (w[0], w[1]);
            if p2.date > date {
                return p1.value
                    + (p2.value - p1.value) * hours_between(p1.date, date)
                        / hours_between(p1.date, p2.date);
            }
        }
        f64::NAN
    }
}
