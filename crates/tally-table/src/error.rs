use tally_common::CellTypeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{backend} backend error: {message}")]
    Backend {
        backend: &'static str,
        message: String,
    },

    #[error("unsupported table format `{extension}`")]
    UnsupportedFormat { extension: String },

    #[error("workbook contains no sheet named `{sheet}`")]
    SheetNotFound { sheet: String },

    #[error("workbook has no sheets")]
    EmptyWorkbook,

    #[error("missing required column `{column}`")]
    MissingColumn { column: String },

    /// `row` is the 1-based row in the file, counting the header as row 1.
    #[error("column `{column}` row {row}: {source}")]
    InvalidCell {
        column: String,
        row: usize,
        #[source]
        source: CellTypeError,
    },
}

impl TableError {
    pub fn from_backend<E: std::fmt::Display>(backend: &'static str, err: E) -> Self {
        Self::Backend {
            backend,
            message: err.to_string(),
        }
    }

    /// True for errors about the table's shape or content rather than about
    /// reaching or decoding the file.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::MissingColumn { .. } | Self::InvalidCell { .. }
        )
    }
}
