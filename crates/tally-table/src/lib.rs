//! Labeled tables for the files a tally storage directory is made of.
//!
//! Reading dispatches on the file extension: delimited text goes through the
//! `csv` crate, spreadsheets through `calamine` (feature `xlsx`). Writing is
//! delimited text only.

pub mod backends;
pub mod error;
pub mod format;
pub mod table;

pub use backends::csv::{CsvNewline, CsvReadOptions, CsvTypeInference, CsvWriteOptions};
pub use backends::{read_csv, read_csv_path, write_csv};
pub use error::TableError;
pub use format::{ReadOptions, TableFormat, read_table};
pub use table::{Column, Table};

// Re-export for convenience
pub use tally_common::Cell;
