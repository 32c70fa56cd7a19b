//! The report: hierarchy, snapshot history, schedule and adjustments of one
//! storage directory, with ingestion and queries on top.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tally_common::DateKey;
use tally_table::{Table, TableError, read_table, write_csv};

use crate::adjust::Adjustments;
use crate::config::ReportConfig;
use crate::error::{PersistError, ReportError, Result};
use crate::hierarchy::{Hierarchy, UnitValues};
use crate::persist::replace_file;
use crate::rollup::{Aggregator, LevelRollup};
use crate::schedule::Schedule;
use crate::snapshot::SnapshotStore;
use crate::source::SourceAdapter;
use crate::{stats, target};

pub struct Report {
    root: PathBuf,
    config: ReportConfig,
    source: Box<dyn SourceAdapter>,
    aggregator: Box<dyn Aggregator>,
    hierarchy: Hierarchy,
    store: SnapshotStore,
    schedule: Schedule,
    adjustments: Adjustments,
}

impl fmt::Debug for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Report")
            .field("root", &self.root)
            .field("config", &self.config)
            .field("units", &self.hierarchy.len())
            .field("snapshots", &self.store.len())
            .field("schedule", &self.schedule)
            .field("adjustments", &self.adjustments.len())
            .finish_non_exhaustive()
    }
}

impl Report {
    /// Load the storage directory at `path` with the default rollup and the
    /// directory's `tally.yaml`, if any.
    pub fn load(path: impl AsRef<Path>, source: impl SourceAdapter + 'static) -> Result<Self> {
        let config = ReportConfig::discover(path.as_ref())?;
        Self::load_with(path, source, LevelRollup, config)
    }

    pub fn load_with(
        path: impl AsRef<Path>,
        source: impl SourceAdapter + 'static,
        aggregator: impl Aggregator + 'static,
        config: ReportConfig,
    ) -> Result<Self> {
        let root = path.as_ref().to_path_buf();

        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!("report_load", root = %root.display()).entered();

        config.validate()?;
        let options = config.read_options();
        let layout = &config.layout;

        let hierarchy_path = layout.hierarchy_path(&root);
        let hierarchy = read(&hierarchy_path, &options)
            .and_then(|t| Hierarchy::from_table(&t))
            .map_err(located(&hierarchy_path))?;
        check_hierarchy(&hierarchy, config.strict)?;

        let snapshots_path = layout.snapshots_path(&root);
        let store = if snapshots_path.exists() {
            read(&snapshots_path, &options)
                .and_then(|t| SnapshotStore::from_table(&hierarchy, &t))
                .map_err(located(&snapshots_path))?
        } else {
            #[cfg(feature = "tracing")]
            tracing::info!(path = %snapshots_path.display(), "no snapshot file yet, starting empty");
            SnapshotStore::new(&hierarchy)
        };

        let schedule_path = layout.schedule_path(&root);
        let schedule = read(&schedule_path, &options)
            .and_then(|t| Schedule::from_table(&t))
            .map_err(located(&schedule_path))?;

        let adjustments_path = layout.adjustments_path(&root);
        let adjustments = read(&adjustments_path, &options)
            .and_then(|t| Adjustments::from_table(&t))
            .map_err(located(&adjustments_path))?;

        #[cfg(feature = "tracing")]
        tracing::info!(
            units = hierarchy.len(),
            snapshots = store.len(),
            adjustments = adjustments.len(),
            start = %DateKey::from(schedule.start()),
            end = %DateKey::from(schedule.end()),
            "report loaded"
        );

        Ok(Self {
            root,
            config,
            source: Box::new(source),
            aggregator: Box::new(aggregator),
            hierarchy,
            store,
            schedule,
            adjustments,
        })
    }

    /// Ingest the source named `name`: roll its raw values up the hierarchy,
    /// store them under the source's date (replacing an earlier ingestion of
    /// the same date) and rewrite the snapshot file.
    ///
    /// On any failure the in-memory store is left as it was.
    pub fn feed(&mut self, name: &str) -> Result<NaiveDate> {
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!("report_feed", name).entered();

        let (date, raw) = self.source.fetch(name).map_err(|source| ReportError::Source {
            name: name.to_string(),
            source,
        })?;
        let values = self.raw_values(name, &raw)?;
        let rolled = self.aggregator.aggregate(&self.hierarchy, &values);

        let key = DateKey::from(date);
        let previous = self.store.insert(key, self.hierarchy.to_dense(&rolled));
        if let Err(err) = self.persist() {
            match previous {
                Some(column) => {
                    self.store.insert(key, column);
                }
                None => {
                    self.store.remove(key);
                }
            }
            return Err(err.into());
        }

        #[cfg(feature = "tracing")]
        tracing::info!(date = %key, replaced = previous.is_some(), "snapshot stored");
        Ok(date)
    }

    /// Sum VALUE per known unit id; duplicate ids add up, unknown ids and
    /// rows without an id are skipped and blank values count as 0.
    fn raw_values(&self, name: &str, raw: &Table) -> Result<UnitValues> {
        let invalid = |source: TableError| ReportError::Validation {
            what: format!("source `{name}`"),
            source,
        };
        raw.require(&["ID", "VALUE"]).map_err(invalid)?;
        let ids = raw.texts("ID").map_err(invalid)?;
        let numbers = raw.numbers("VALUE").map_err(invalid)?;

        let mut values = UnitValues::new();
        let mut _unknown = 0usize;
        for (id, value) in ids.into_iter().zip(numbers) {
            let Some(id) = id else { continue };
            if !self.hierarchy.contains(&id) {
                _unknown += 1;
                continue;
            }
            *values.entry(id).or_insert(0.0) += value.unwrap_or(0.0);
        }

        #[cfg(feature = "tracing")]
        {
            if _unknown > 0 {
                tracing::debug!(rows = _unknown, "raw rows for unknown units ignored");
            }
        }
        Ok(values)
    }

    fn persist(&self) -> Result<(), PersistError> {
        let path = self.config.layout.snapshots_path(&self.root);
        let table = self.store.to_table();
        let options = self.config.snapshot_write_options();
        replace_file(&path, self.config.write_strategy, |out| {
            write_csv(&table, out, &options)
        })
    }

    /// Activity in `[start, end)`: the change between the snapshots of the
    /// days before `start` and before `end`, plus adjustments dated in the
    /// interval.
    pub fn stat(&self, start: NaiveDate, end: NaiveDate) -> Result<UnitValues> {
        stats::stat(&self.hierarchy, &self.store, &self.adjustments, start, end)
    }

    /// [`Report::stat`] from the schedule start.
    pub fn stat_by(&self, end: NaiveDate) -> Result<UnitValues> {
        self.stat(self.start_date(), end)
    }

    /// Scheduled cumulative target at `date`. NaN for every unit at or after
    /// the schedule end.
    pub fn target_by(&self, date: NaiveDate) -> UnitValues {
        target::target_by(&self.hierarchy, &self.schedule, date)
    }

    /// Target for `[start, end)` that keeps each unit on track given what it
    /// achieved since the schedule start. Never negative or NaN.
    pub fn target(&self, start: NaiveDate, end: NaiveDate) -> Result<UnitValues> {
        let achieved = self.stat_by(start)?;
        let start_targets = self.target_by(start);
        let end_targets = self.target_by(end);
        Ok(target::period_target(
            &self.hierarchy,
            &achieved,
            &start_targets,
            &end_targets,
        ))
    }

    /// A copy of the hierarchy.
    pub fn base(&self) -> Hierarchy {
        self.hierarchy.clone()
    }

    pub fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    pub fn start_date(&self) -> NaiveDate {
        self.schedule.start()
    }

    pub fn end_date(&self) -> NaiveDate {
        self.schedule.end()
    }

    /// Ingested snapshot dates, ascending.
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.store.dates().map(DateKey::date).collect()
    }

    pub fn snapshots(&self) -> &SnapshotStore {
        &self.store
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn adjustments(&self) -> &Adjustments {
        &self.adjustments
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn read(path: &Path, options: &tally_table::ReadOptions) -> Result<Table> {
    read_table(path, options).map_err(|e| ReportError::from_table(path, e))
}

/// Name the file in validation errors raised while interpreting it.
fn located(path: &Path) -> impl FnOnce(ReportError) -> ReportError + '_ {
    move |err| match err {
        ReportError::Validation { source, .. } => ReportError::Validation {
            what: path.display().to_string(),
            source,
        },
        other => other,
    }
}

fn check_hierarchy(hierarchy: &Hierarchy, strict: bool) -> Result<()> {
    let issues = hierarchy.check();
    if issues.is_empty() {
        return Ok(());
    }
    if strict {
        let detail: Vec<String> = issues.iter().map(ToString::to_string).collect();
        return Err(ReportError::InvalidHierarchy(detail.join("; ")));
    }
    #[cfg(feature = "tracing")]
    {
        for issue in &issues {
            tracing::warn!(%issue, "hierarchy issue, affected contributions are dropped");
        }
    }
    Ok(())
}
