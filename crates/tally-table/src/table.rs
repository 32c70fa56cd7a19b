//! Column-major labeled table.
//!
//! Storage files are small (one row per organizational unit or per manual
//! adjustment), so the table keeps every cell in memory and exposes typed
//! column views instead of a query language. Header lookups ignore ASCII case
//! and surrounding whitespace: `id`, `ID` and ` Id ` name the same column.

use crate::TableError;
use tally_common::Cell;

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    cells: Vec<Cell>,
}

impl Column {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    height: usize,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from a header and row-major records.
    ///
    /// Short rows are padded with [`Cell::Empty`]; cells beyond the header
    /// have no column to land in and are dropped.
    pub fn from_rows<H, R>(header: H, rows: R) -> Self
    where
        H: IntoIterator,
        H::Item: Into<String>,
        R: IntoIterator<Item = Vec<Cell>>,
    {
        let mut columns: Vec<Column> = header
            .into_iter()
            .map(|name| Column {
                name: name.into(),
                cells: Vec::new(),
            })
            .collect();
        let mut height = 0;
        for row in rows {
            let mut cells = row.into_iter();
            for column in columns.iter_mut() {
                column.cells.push(cells.next().unwrap_or_default());
            }
            height += 1;
        }
        Self { columns, height }
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.height == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        let wanted = name.trim();
        self.columns
            .iter()
            .position(|c| c.name.trim().eq_ignore_ascii_case(wanted))
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn column(&self, name: &str) -> Option<&[Cell]> {
        self.position(name).map(|i| self.columns[i].cells.as_slice())
    }

    /// Fail with [`TableError::MissingColumn`] for the first absent name.
    pub fn require(&self, names: &[&str]) -> Result<(), TableError> {
        match names.iter().find(|name| !self.has_column(name)) {
            Some(missing) => Err(TableError::MissingColumn {
                column: (*missing).to_string(),
            }),
            None => Ok(()),
        }
    }

    fn required(&self, name: &str) -> Result<&[Cell], TableError> {
        self.column(name).ok_or_else(|| TableError::MissingColumn {
            column: name.to_string(),
        })
    }

    /// Numeric view of a column; blank cells are `None`.
    pub fn numbers(&self, name: &str) -> Result<Vec<Option<f64>>, TableError> {
        self.required(name)?
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                cell.to_number().map_err(|source| TableError::InvalidCell {
                    column: name.to_string(),
                    row: i + 2,
                    source,
                })
            })
            .collect()
    }

    /// Text view of a column; blank cells are `None`.
    pub fn texts(&self, name: &str) -> Result<Vec<Option<String>>, TableError> {
        Ok(self.required(name)?.iter().map(Cell::to_text).collect())
    }

    /// Cells of row `index` in column order.
    pub fn row(&self, index: usize) -> impl Iterator<Item = &Cell> {
        self.columns.iter().filter_map(move |c| c.cells.get(index))
    }
}
