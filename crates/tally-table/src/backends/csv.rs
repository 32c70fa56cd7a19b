//! Delimited text through the `csv` crate.
//!
//! The first record is always the header. With [`CsvTypeInference::Basic`]
//! data fields are typed conservatively ("007" and "A1" stay text), but a
//! field such as `1.10` still becomes a number and loses its spelling. Read
//! identifier columns with [`CsvTypeInference::Off`].

use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;

use tally_common::Cell;

use crate::{Table, TableError};

const BACKEND: &str = "csv";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CsvTypeInference {
    /// Every non-empty field is text.
    Off,
    /// Booleans and plain decimal numbers become typed cells.
    #[default]
    Basic,
}

#[derive(Clone, Debug)]
pub struct CsvReadOptions {
    pub delimiter: u8,
    /// Strip surrounding whitespace from every field, header included.
    pub trim: bool,
    pub type_inference: CsvTypeInference,
}

impl Default for CsvReadOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            trim: true,
            type_inference: CsvTypeInference::Basic,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CsvNewline {
    #[default]
    Lf,
    Crlf,
}

/// Fields are quoted only when they contain the delimiter, a quote or a
/// line break.
#[derive(Clone, Debug)]
pub struct CsvWriteOptions {
    pub delimiter: u8,
    pub newline: CsvNewline,
}

impl Default for CsvWriteOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            newline: CsvNewline::Lf,
        }
    }
}

pub fn read_csv_path(path: impl AsRef<Path>, opts: &CsvReadOptions) -> Result<Table, TableError> {
    let file = File::open(path.as_ref())?;
    read_csv(BufReader::new(file), opts)
}

pub fn read_csv_bytes(bytes: &[u8], opts: &CsvReadOptions) -> Result<Table, TableError> {
    read_csv(bytes, opts)
}

/// Rows may be shorter or longer than the header; [`Table::from_rows`] pads
/// and truncates them.
pub fn read_csv<R: Read>(reader: R, opts: &CsvReadOptions) -> Result<Table, TableError> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(opts.delimiter)
        .has_headers(true)
        .flexible(true)
        .trim(if opts.trim {
            csv::Trim::All
        } else {
            csv::Trim::None
        })
        .from_reader(reader);

    let header: Vec<String> = rdr
        .headers()
        .map_err(|e| TableError::from_backend(BACKEND, e))?
        .iter()
        .map(str::to_string)
        .collect();

    let rows = rdr
        .records()
        .map(|record| {
            let record = record.map_err(|e| TableError::from_backend(BACKEND, e))?;
            Ok(record
                .iter()
                .map(|field| typed_cell(field, opts.type_inference))
                .collect::<Vec<Cell>>())
        })
        .collect::<Result<Vec<_>, TableError>>()?;

    Ok(Table::from_rows(header, rows))
}

pub fn write_csv_bytes(table: &Table, opts: &CsvWriteOptions) -> Result<Vec<u8>, TableError> {
    let mut buf = Vec::new();
    write_csv(table, &mut buf, opts)?;
    Ok(buf)
}

/// Numbers use Rust's shortest round-trip formatting, so values read back
/// bit-identical. NaN is written as `NaN`.
pub fn write_csv<W: Write + ?Sized>(
    table: &Table,
    writer: &mut W,
    opts: &CsvWriteOptions,
) -> Result<(), TableError> {
    let terminator = match opts.newline {
        CsvNewline::Lf => csv::Terminator::Any(b'\n'),
        CsvNewline::Crlf => csv::Terminator::CRLF,
    };
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(opts.delimiter)
        .terminator(terminator)
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(writer);

    wtr.write_record(table.column_names())
        .map_err(|e| TableError::from_backend(BACKEND, e))?;
    let mut record: Vec<String> = Vec::with_capacity(table.width());
    for r in 0..table.height() {
        record.clear();
        record.extend(table.row(r).map(Cell::to_string));
        wtr.write_record(&record)
            .map_err(|e| TableError::from_backend(BACKEND, e))?;
    }
    wtr.flush()?;
    Ok(())
}

fn typed_cell(field: &str, mode: CsvTypeInference) -> Cell {
    if field.is_empty() {
        return Cell::Empty;
    }
    if mode == CsvTypeInference::Basic {
        if field.eq_ignore_ascii_case("true") {
            return Cell::Bool(true);
        }
        if field.eq_ignore_ascii_case("false") {
            return Cell::Bool(false);
        }
        if let Some(n) = plain_number(field) {
            return Cell::Number(n);
        }
    }
    Cell::Text(field.to_string())
}

/// Decimal notation with an optional sign, fraction and exponent. A leading
/// zero followed by another digit ("007", "01.5") marks a code, not a number.
/// `NaN` and `inf` stay text here; [`Cell::to_number`] still accepts them.
fn plain_number(s: &str) -> Option<f64> {
    let unsigned = s.strip_prefix(['+', '-']).unwrap_or(s);
    let bytes = unsigned.as_bytes();
    if !bytes.first()?.is_ascii_digit() && bytes[0] != b'.' {
        return None;
    }
    if bytes.len() > 1 && bytes[0] == b'0' && bytes[1].is_ascii_digit() {
        return None;
    }
    s.parse::<f64>().ok().filter(|n| n.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_numbers_only() {
        assert_eq!(plain_number("12"), Some(12.0));
        assert_eq!(plain_number("-3.5"), Some(-3.5));
        assert_eq!(plain_number("+1e3"), Some(1000.0));
        assert_eq!(plain_number("0.25"), Some(0.25));
        assert_eq!(plain_number(".5"), Some(0.5));
        assert_eq!(plain_number("0"), Some(0.0));
        assert_eq!(plain_number("007"), None);
        assert_eq!(plain_number("01.5"), None);
        assert_eq!(plain_number("NaN"), None);
        assert_eq!(plain_number("inf"), None);
        assert_eq!(plain_number("1e999"), None);
        assert_eq!(plain_number("-"), None);
        assert_eq!(plain_number("A1"), None);
    }

    #[test]
    fn untrimmed_fields_keep_whitespace() {
        let opts = CsvReadOptions {
            trim: false,
            ..CsvReadOptions::default()
        };
        let table = read_csv_bytes(b"ID,VALUE\n A ,1\n", &opts).unwrap();
        assert_eq!(table.column("ID").unwrap()[0], Cell::Text(" A ".to_string()));
    }
}
