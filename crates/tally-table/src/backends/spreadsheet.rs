#![cfg(feature = "xlsx")]

use crate::{Table, TableError};
use calamine::{Data, Range, Reader, open_workbook_auto};
use std::path::Path;
use tally_common::{Cell, serial_to_date};

/// Read one worksheet of an `.xlsx`/`.xlsm`/`.xls`/`.ods` file.
///
/// The first row of the used range is the header. `sheet = None` selects the
/// first sheet in workbook order.
pub fn read_sheet_path(path: impl AsRef<Path>, sheet: Option<&str>) -> Result<Table, TableError> {
    let mut workbook =
        open_workbook_auto(path.as_ref()).map_err(|e| TableError::from_backend("calamine", e))?;

    let names = workbook.sheet_names();
    let name = match sheet {
        Some(wanted) => names
            .iter()
            .find(|n| n.as_str() == wanted)
            .cloned()
            .ok_or_else(|| TableError::SheetNotFound {
                sheet: wanted.to_string(),
            })?,
        None => names.first().cloned().ok_or(TableError::EmptyWorkbook)?,
    };

    let range = workbook
        .worksheet_range(&name)
        .map_err(|e| TableError::from_backend("calamine", e))?;
    Ok(range_to_table(&range))
}

fn range_to_table(range: &Range<Data>) -> Table {
    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Table::new();
    };
    let header: Vec<String> = header
        .iter()
        .map(|d| convert_value(d).to_text().unwrap_or_default())
        .collect();
    let body: Vec<Vec<Cell>> = rows.map(|row| row.iter().map(convert_value).collect()).collect();
    Table::from_rows(header, body)
}

fn convert_value(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) if s.is_empty() => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Bool(*b),
        // Error cells keep their display code so a numeric read reports it.
        Data::Error(e) => Cell::Text(e.to_string()),
        Data::DateTime(dt) if dt.is_duration() => Cell::Number(dt.as_f64()),
        Data::DateTime(dt) => match serial_to_date(dt.as_f64()) {
            Some(d) => Cell::Date(d),
            None => Cell::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) => s
            .get(..10)
            .and_then(|prefix| chrono::NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
            .map(Cell::Date)
            .unwrap_or_else(|| Cell::Text(s.clone())),
        Data::DurationIso(s) => Cell::Text(s.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn converts_calamine_values() {
        assert_eq!(convert_value(&Data::Int(3)), Cell::Number(3.0));
        assert_eq!(convert_value(&Data::String(String::new())), Cell::Empty);
        assert_eq!(
            convert_value(&Data::DateTimeIso("2024-02-01T00:00:00".to_string())),
            Cell::Date(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap())
        );
        assert_eq!(
            convert_value(&Data::Error(calamine::CellErrorType::Div0)),
            Cell::Text("#DIV/0!".to_string())
        );
    }
}
