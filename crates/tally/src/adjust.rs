//! Manual corrections added on top of snapshot deltas.

use chrono::NaiveDate;
use tally_table::{Table, TableError};

use crate::error::{ReportError, Result};
use crate::hierarchy::UnitValues;

#[derive(Debug, Clone, PartialEq)]
pub struct Adjustment {
    pub date: NaiveDate,
    pub id: String,
    pub name: Option<String>,
    pub value: f64,
}

/// Adjustment entries in file order. Repeated (date, id) pairs are allowed
/// and add up.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Adjustments {
    entries: Vec<Adjustment>,
}

impl Adjustments {
    pub fn new(entries: Vec<Adjustment>) -> Self {
        Self { entries }
    }

    /// Read a DATE, ID, [NAME], VALUE table.
    ///
    /// Rows with an unreadable or empty DATE, or an empty ID, can never fall
    /// inside a statistics interval and are skipped. An empty VALUE is 0.
    pub fn from_table(table: &Table) -> Result<Self> {
        let invalid = |source: TableError| ReportError::Validation {
            what: "adjustments".to_string(),
            source,
        };
        table.require(&["DATE", "ID", "VALUE"]).map_err(invalid)?;
        let dates = table.column("DATE").unwrap_or_default();
        let ids = table.texts("ID").map_err(invalid)?;
        let values = table.numbers("VALUE").map_err(invalid)?;
        let names = if table.has_column("NAME") {
            table.texts("NAME").map_err(invalid)?
        } else {
            vec![None; table.height()]
        };

        let mut entries = Vec::with_capacity(table.height());
        for (_row, (((cell, id), value), name)) in
            dates.iter().zip(ids).zip(values).zip(names).enumerate()
        {
            let date = match cell.to_date() {
                Ok(Some(date)) => date,
                _ => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(row = _row + 2, date = %cell, "skipping adjustment without a valid date");
                    continue;
                }
            };
            let Some(id) = id else {
                #[cfg(feature = "tracing")]
                tracing::warn!(row = _row + 2, "skipping adjustment without an ID");
                continue;
            };
            entries.push(Adjustment {
                date,
                id,
                name,
                value: value.unwrap_or(0.0),
            });
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[Adjustment] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Per-id totals of entries dated in `[start, end)`.
    pub fn sum_between(&self, start: NaiveDate, end: NaiveDate) -> UnitValues {
        let mut sums = UnitValues::new();
        for entry in self
            .entries
            .iter()
            .filter(|e| start <= e.date && e.date < end)
        {
            *sums.entry(entry.id.clone()).or_insert(0.0) += entry.value;
        }
        sums
    }
}
