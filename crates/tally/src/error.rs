use std::path::PathBuf;

use tally_common::DateError;
use tally_table::TableError;
use thiserror::Error;

/// Boxed error returned by caller-supplied collaborators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T, E = ReportError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ReportError {
    /// A required column is missing or a cell has the wrong type.
    #[error("{what}: {source}")]
    Validation {
        what: String,
        #[source]
        source: TableError,
    },

    #[error("invalid hierarchy: {0}")]
    InvalidHierarchy(String),

    #[error(transparent)]
    MalformedDate(#[from] DateError),

    #[error("invalid schedule: {0}")]
    InvalidSchedule(String),

    /// A snapshot column needed by a query has never been ingested.
    #[error("snapshot not found: {key}")]
    NotFound { key: String },

    #[error("failed to read `{}`: {source}", .path.display())]
    Table {
        path: PathBuf,
        #[source]
        source: TableError,
    },

    #[error("I/O error on `{}`: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Persist(#[from] PersistError),

    #[error("source `{name}` failed: {source}")]
    Source {
        name: String,
        #[source]
        source: BoxError,
    },

    #[error("invalid config `{}`: {source}", .path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

impl ReportError {
    /// Classify a table failure for the file at `path`: shape problems become
    /// [`ReportError::Validation`], everything else [`ReportError::Table`].
    pub(crate) fn from_table(path: impl Into<PathBuf>, source: TableError) -> Self {
        let path = path.into();
        if source.is_validation() {
            Self::Validation {
                what: path.display().to_string(),
                source,
            }
        } else {
            Self::Table { path, source }
        }
    }
}

/// Failure while replacing the durable snapshot file.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("I/O error on `{}`: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode `{}`: {source}", .path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: TableError,
    },

    /// The write failed and the backup could not be moved back. The backup
    /// file is left in place for manual recovery.
    #[error(
        "failed to restore `{}` from backup `{}` after a failed write: {source}",
        .path.display(),
        .backup.display()
    )]
    Restore {
        path: PathBuf,
        backup: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
