//! Hierarchical target tracking.
//!
//! A [`Report`] owns one storage directory: the unit hierarchy, the history of
//! rolled-up snapshots (one column per ingestion date), a completion schedule
//! and manual adjustments. [`Report::feed`] ingests raw per-unit values;
//! [`Report::stat`] and [`Report::target`] answer period questions.

pub mod adjust;
pub mod config;
pub mod error;
pub mod hierarchy;
pub mod persist;
pub mod report;
pub mod rollup;
pub mod schedule;
pub mod snapshot;
pub mod source;
pub mod stats;
pub mod target;

pub use adjust::{Adjustment, Adjustments};
pub use config::{CsvConfig, ReportConfig, StorageLayout};
pub use error::{BoxError, PersistError, ReportError, Result};
pub use hierarchy::{Hierarchy, HierarchyIssue, Unit, UnitValues};
pub use persist::{WriteStrategy, replace_file};
pub use report::Report;
pub use rollup::{Aggregator, LevelRollup, TopologicalRollup};
pub use schedule::{Schedule, SchedulePoint};
pub use snapshot::SnapshotStore;
pub use source::{FileSource, SourceAdapter, SourceError};

// Re-export for convenience
pub use tally_common::{DateError, DateKey, format_date, parse_date};
pub use tally_table::{Cell, Table};
