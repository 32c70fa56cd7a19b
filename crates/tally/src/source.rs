//! Where raw measurements come from.

use std::path::Path;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use tally_common::parse_date;
use tally_table::{ReadOptions, Table, TableError, read_table};
use thiserror::Error;

use crate::config::ReportConfig;
use crate::error::BoxError;

/// Resolves a source name to the measurement date and a raw table with at
/// least `ID` and `VALUE` columns.
///
/// Any `Fn(&str) -> Result<(NaiveDate, Table), BoxError>` qualifies.
pub trait SourceAdapter: Send + Sync {
    fn fetch(&self, name: &str) -> Result<(NaiveDate, Table), BoxError>;
}

impl<F> SourceAdapter for F
where
    F: Fn(&str) -> Result<(NaiveDate, Table), BoxError> + Send + Sync,
{
    fn fetch(&self, name: &str) -> Result<(NaiveDate, Table), BoxError> {
        self(name)
    }
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("no YYYYMMDD date in file name `{0}`")]
    NoDate(String),

    #[error(transparent)]
    Table(#[from] TableError),
}

static DIGIT_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("valid digit regex"));

/// Reads `name` as a table file. The date is fixed, or taken from the first
/// eight-digit run in the file stem that is a valid calendar date
/// (`sales_20240131.xlsx`).
#[derive(Debug, Clone)]
pub struct FileSource {
    options: ReadOptions,
    date: Option<NaiveDate>,
}

impl Default for FileSource {
    fn default() -> Self {
        Self {
            options: ReportConfig::default().read_options(),
            date: None,
        }
    }
}

impl FileSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(mut self, options: ReadOptions) -> Self {
        self.options = options;
        self
    }

    /// Use `date` for every file instead of reading it from the name.
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn date_from_path(path: &Path) -> Option<NaiveDate> {
        let stem = path.file_stem()?.to_str()?;
        DIGIT_RUN
            .find_iter(stem)
            .filter(|run| run.as_str().len() == 8)
            .find_map(|run| parse_date(run.as_str()).ok())
    }

    fn load(&self, name: &str) -> Result<(NaiveDate, Table), SourceError> {
        let path = Path::new(name);
        let date = match self.date {
            Some(date) => date,
            None => Self::date_from_path(path).ok_or_else(|| SourceError::NoDate(name.to_string()))?,
        };
        let table = read_table(path, &self.options)?;
        Ok((date, table))
    }
}

impl SourceAdapter for FileSource {
    fn fetch(&self, name: &str) -> Result<(NaiveDate, Table), BoxError> {
        Ok(self.load(name)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn date_comes_from_file_stem() {
        let cases = [
            ("in/sales_20240131.csv", Some(ymd(2024, 1, 31))),
            ("20240229.xlsx", Some(ymd(2024, 2, 29))),
            ("v2_20241301_20240105_final.csv", Some(ymd(2024, 1, 5))),
            ("batch-202401310.csv", None),
            ("20240101/summary.csv", None),
        ];
        for (path, expected) in cases {
            assert_eq!(FileSource::date_from_path(Path::new(path)), expected, "{path}");
        }
    }

    #[test]
    fn fetch_reads_table_and_date() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feed_20240105.csv");
        std::fs::write(&path, "ID,VALUE\nA,3\n").unwrap();

        let (date, table) = FileSource::new().fetch(path.to_str().unwrap()).unwrap();
        assert_eq!(date, ymd(2024, 1, 5));
        assert_eq!(table.numbers("VALUE").unwrap(), vec![Some(3.0)]);
    }

    #[test]
    fn ids_keep_their_spelling() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feed_20240105.csv");
        std::fs::write(&path, "ID,VALUE\n1.10,1\n4000000000000000001,2\n").unwrap();

        let (_, table) = FileSource::new().fetch(path.to_str().unwrap()).unwrap();
        assert_eq!(
            table.texts("ID").unwrap(),
            vec![
                Some("1.10".to_string()),
                Some("4000000000000000001".to_string())
            ]
        );
        assert_eq!(table.numbers("VALUE").unwrap(), vec![Some(1.0), Some(2.0)]);
    }

    #[test]
    fn fixed_date_overrides_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latest.csv");
        std::fs::write(&path, "ID,VALUE\n").unwrap();

        let source = FileSource::new().with_date(ymd(2024, 3, 1));
        let (date, _) = source.fetch(path.to_str().unwrap()).unwrap();
        assert_eq!(date, ymd(2024, 3, 1));

        let err = FileSource::new().fetch(path.to_str().unwrap()).unwrap_err();
        assert!(err.to_string().contains("no YYYYMMDD date"));
    }
}
