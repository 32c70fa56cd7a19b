//! Fixture builders shared by the tally test suites.
//!
//! Spreadsheets are authored with `umya-spreadsheet` so the calamine read path
//! sees real xlsx files; everything lives in a `tempfile` directory that is
//! removed when the fixture drops.

use std::fs;
use std::path::{Path, PathBuf};

use tally_common::{Cell, date_to_serial};
use tempfile::TempDir;
use umya_spreadsheet::NumberingFormat;

/// Write `header` + `rows` to the first sheet of a new xlsx file at `path`.
///
/// `Cell::Date` values are stored as serial numbers with a date format, the
/// way spreadsheet applications store typed dates.
pub fn write_xlsx(path: &Path, header: &[&str], rows: &[Vec<Cell>]) {
    let mut book = umya_spreadsheet::new_file();
    let sheet = book
        .get_sheet_by_name_mut("Sheet1")
        .expect("new workbook has Sheet1");

    for (ci, name) in header.iter().enumerate() {
        sheet.get_cell_mut((ci as u32 + 1, 1)).set_value(*name);
    }
    for (ri, row) in rows.iter().enumerate() {
        let r = ri as u32 + 2;
        for (ci, cell) in row.iter().enumerate() {
            let c = ci as u32 + 1;
            match cell {
                Cell::Empty => {}
                Cell::Number(n) => {
                    sheet.get_cell_mut((c, r)).set_value_number(*n);
                }
                Cell::Text(s) => {
                    sheet.get_cell_mut((c, r)).set_value(s.as_str());
                }
                Cell::Bool(b) => {
                    sheet.get_cell_mut((c, r)).set_value_bool(*b);
                }
                Cell::Date(d) => {
                    sheet
                        .get_cell_mut((c, r))
                        .set_value_number(date_to_serial(*d));
                    let _ = sheet
                        .get_style_mut((c, r))
                        .get_number_format_mut()
                        .set_format_code(NumberingFormat::FORMAT_DATE_XLSX14);
                }
            }
        }
    }

    umya_spreadsheet::writer::xlsx::write(&book, path).expect("write xlsx fixture");
}

/// One hierarchy row: id, level, super-id, target.
pub type UnitRow<'a> = (&'a str, u32, Option<&'a str>, f64);

/// A temporary storage directory with the default tally file layout.
pub struct StorageFixture {
    dir: TempDir,
}

impl Default for StorageFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageFixture {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn join(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// `base.xlsx` with columns ID, NAME, LEVEL, SUPER, TARGET. Names are
    /// derived from ids ("Unit A" for "A").
    pub fn hierarchy(&self, units: &[UnitRow<'_>]) -> &Self {
        let rows: Vec<Vec<Cell>> = units
            .iter()
            .map(|(id, level, sup, target)| {
                vec![
                    Cell::from(*id),
                    Cell::Text(format!("Unit {id}")),
                    Cell::Number(f64::from(*level)),
                    sup.map(Cell::from).unwrap_or_default(),
                    Cell::Number(*target),
                ]
            })
            .collect();
        write_xlsx(
            &self.join("base.xlsx"),
            &["ID", "NAME", "LEVEL", "SUPER", "TARGET"],
            &rows,
        );
        self
    }

    /// `schedule.xlsx` with DATE stored as `YYYYMMDD` text.
    pub fn schedule(&self, points: &[(&str, f64)]) -> &Self {
        let rows: Vec<Vec<Cell>> = points
            .iter()
            .map(|(date, value)| vec![Cell::from(*date), Cell::Number(*value)])
            .collect();
        write_xlsx(&self.join("schedule.xlsx"), &["DATE", "VALUE"], &rows);
        self
    }

    /// `adjust.xlsx` with columns DATE, ID, NAME, VALUE.
    pub fn adjustments(&self, entries: &[(&str, &str, f64)]) -> &Self {
        let rows: Vec<Vec<Cell>> = entries
            .iter()
            .map(|(date, id, value)| {
                vec![
                    Cell::from(*date),
                    Cell::from(*id),
                    Cell::Text(format!("Unit {id}")),
                    Cell::Number(*value),
                ]
            })
            .collect();
        write_xlsx(
            &self.join("adjust.xlsx"),
            &["DATE", "ID", "NAME", "VALUE"],
            &rows,
        );
        self
    }

    /// `data.csv` with the given raw contents.
    pub fn snapshots(&self, contents: &str) -> &Self {
        self.write_text("data.csv", contents);
        self
    }

    pub fn write_text(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.join(name);
        fs::write(&path, contents).expect("write fixture file");
        path
    }

    pub fn read_text(&self, name: &str) -> String {
        fs::read_to_string(self.join(name)).expect("read fixture file")
    }

    /// File names in the directory, sorted.
    pub fn entries(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(self.path())
            .expect("list fixture dir")
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}
