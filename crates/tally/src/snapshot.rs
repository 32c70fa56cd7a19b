//! Rolled-up values per ingestion date, one column per date.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use tally_common::DateKey;
use tally_table::{Cell, Table, TableError};

use crate::error::{ReportError, Result};
use crate::hierarchy::{Hierarchy, UnitValues};

/// Column store aligned to the hierarchy's unit order: every column has one
/// value per unit, and units without a stored value read as 0.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnapshotStore {
    ids: Vec<String>,
    columns: BTreeMap<DateKey, Vec<f64>>,
}

impl SnapshotStore {
    /// An empty store for the units of `hierarchy`.
    pub fn new(hierarchy: &Hierarchy) -> Self {
        Self {
            ids: hierarchy.ids().map(str::to_string).collect(),
            columns: BTreeMap::new(),
        }
    }

    /// Load from a table with an `ID` column and one `YYYYMMDD` column per
    /// date.
    ///
    /// Rows for ids outside the hierarchy are dropped; the first row wins for
    /// repeated ids. Columns whose header is not a date are ignored.
    pub fn from_table(hierarchy: &Hierarchy, table: &Table) -> Result<Self> {
        let invalid = |source: TableError| ReportError::Validation {
            what: "snapshots".to_string(),
            source,
        };
        table.require(&["ID"]).map_err(invalid)?;

        let mut rows: FxHashMap<String, usize> = FxHashMap::default();
        for (row, id) in table.texts("ID").map_err(invalid)?.into_iter().enumerate() {
            if let Some(id) = id {
                rows.entry(id).or_insert(row);
            }
        }
        let aligned: Vec<Option<usize>> = hierarchy.ids().map(|id| rows.get(id).copied()).collect();

        #[cfg(feature = "tracing")]
        {
            let dropped = rows.keys().filter(|id| !hierarchy.contains(id)).count();
            if dropped > 0 {
                tracing::debug!(rows = dropped, "snapshot rows for unknown units dropped");
            }
        }

        let mut store = Self::new(hierarchy);
        for name in table.column_names() {
            if name.trim().eq_ignore_ascii_case("ID") {
                continue;
            }
            let Ok(key) = DateKey::parse(name) else {
                #[cfg(feature = "tracing")]
                tracing::warn!(column = name, "ignoring non-date snapshot column");
                continue;
            };
            let values = table.numbers(name).map_err(invalid)?;
            let column = aligned
                .iter()
                .map(|row| row.and_then(|r| values[r]).unwrap_or(0.0))
                .collect();
            store.columns.insert(key, column);
        }
        Ok(store)
    }

    /// `ID` followed by the date columns in ascending order.
    pub fn to_table(&self) -> Table {
        let header = std::iter::once("ID".to_string())
            .chain(self.columns.keys().map(DateKey::to_string));
        let rows = self.ids.iter().enumerate().map(|(r, id)| {
            std::iter::once(Cell::from(id.as_str()))
                .chain(self.columns.values().map(|col| Cell::Number(col[r])))
                .collect()
        });
        Table::from_rows(header, rows)
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Stored dates, ascending.
    pub fn dates(&self) -> impl Iterator<Item = DateKey> + '_ {
        self.columns.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn has(&self, key: DateKey) -> bool {
        self.columns.contains_key(&key)
    }

    pub fn column(&self, key: DateKey) -> Option<&[f64]> {
        self.columns.get(&key).map(Vec::as_slice)
    }

    pub fn values(&self, key: DateKey) -> Option<UnitValues> {
        let column = self.columns.get(&key)?;
        Some(self.ids.iter().cloned().zip(column.iter().copied()).collect())
    }

    /// Store `column` under `key`, replacing and returning any previous
    /// column. The column is padded with zeros or cut to one value per unit.
    pub fn insert(&mut self, key: DateKey, mut column: Vec<f64>) -> Option<Vec<f64>> {
        column.resize(self.ids.len(), 0.0);
        self.columns.insert(key, column)
    }

    pub fn remove(&mut self, key: DateKey) -> Option<Vec<f64>> {
        self.columns.remove(&key)
    }
}
