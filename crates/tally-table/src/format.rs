use crate::backends;
use crate::{CsvReadOptions, Table, TableError};
use std::path::Path;

/// On-disk table format, chosen by file extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Tsv,
    Spreadsheet,
}

impl TableFormat {
    pub fn from_path(path: &Path) -> Result<Self, TableError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        match extension.as_str() {
            "csv" | "txt" => Ok(Self::Csv),
            "tsv" | "tab" => Ok(Self::Tsv),
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(Self::Spreadsheet),
            _ => Err(TableError::UnsupportedFormat { extension }),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ReadOptions {
    /// Options for `.csv`; `.tsv` files use the same options with a tab delimiter.
    pub csv: CsvReadOptions,
    /// Worksheet to read from spreadsheets; the first sheet when `None`.
    pub sheet: Option<String>,
}

/// Read a table from `path`, choosing the backend by extension.
pub fn read_table(path: impl AsRef<Path>, opts: &ReadOptions) -> Result<Table, TableError> {
    let path = path.as_ref();
    let format = TableFormat::from_path(path)?;

    #[cfg(feature = "tracing")]
    let _span = tracing::debug_span!("table_read", path = %path.display(), ?format).entered();

    let table = match format {
        TableFormat::Csv => backends::read_csv_path(path, &opts.csv)?,
        TableFormat::Tsv => {
            let tsv = CsvReadOptions {
                delimiter: b'\t',
                ..opts.csv.clone()
            };
            backends::read_csv_path(path, &tsv)?
        }
        #[cfg(feature = "xlsx")]
        TableFormat::Spreadsheet => backends::read_sheet_path(path, opts.sheet.as_deref())?,
        #[cfg(not(feature = "xlsx"))]
        TableFormat::Spreadsheet => {
            return Err(TableError::UnsupportedFormat {
                extension: "spreadsheet (enable the `xlsx` feature)".to_string(),
            });
        }
    };

    #[cfg(feature = "tracing")]
    tracing::debug!(rows = table.height(), columns = table.width(), "table loaded");

    Ok(table)
}
