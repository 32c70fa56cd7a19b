pub mod csv;

#[cfg(feature = "xlsx")]
pub mod spreadsheet;

pub use self::csv::{read_csv, read_csv_bytes, read_csv_path, write_csv, write_csv_bytes};

#[cfg(feature = "xlsx")]
pub use self::spreadsheet::read_sheet_path;
