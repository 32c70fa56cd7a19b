//! Storage layout and behavior switches, optionally read from `tally.yaml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tally_table::{CsvReadOptions, CsvTypeInference, CsvWriteOptions, ReadOptions, TableFormat};

use crate::error::{ReportError, Result};
use crate::persist::WriteStrategy;

/// File names of the four storage tables, relative to the storage directory
/// unless absolute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageLayout {
    pub hierarchy: PathBuf,
    pub snapshots: PathBuf,
    pub schedule: PathBuf,
    pub adjustments: PathBuf,
}

impl Default for StorageLayout {
    fn default() -> Self {
        Self {
            hierarchy: PathBuf::from("base.xlsx"),
            snapshots: PathBuf::from("data.csv"),
            schedule: PathBuf::from("schedule.xlsx"),
            adjustments: PathBuf::from("adjust.xlsx"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CsvConfig {
    /// Single ASCII character separating fields of `.csv` files.
    pub delimiter: char,
}

impl Default for CsvConfig {
    fn default() -> Self {
        Self { delimiter: ',' }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportConfig {
    pub layout: StorageLayout,
    pub write_strategy: WriteStrategy,
    /// Reject hierarchies whose levels do not decrease from parent to child
    /// or whose super-ids name unknown units. Otherwise those are logged and
    /// the affected contributions are lost during rollup.
    pub strict: bool,
    pub csv: CsvConfig,
}

impl ReportConfig {
    pub const FILE_NAME: &'static str = "tally.yaml";

    pub fn from_yaml_str(yaml: &str) -> std::result::Result<Self, serde_yaml::Error> {
        // An empty document means "all defaults".
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|source| ReportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml_str(&yaml).map_err(|source| ReportError::Config {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read `tally.yaml` from the storage directory, or use the defaults when
    /// the directory has none.
    pub fn discover(dir: impl AsRef<Path>) -> Result<Self> {
        let path = dir.as_ref().join(Self::FILE_NAME);
        if path.is_file() {
            Self::from_path(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.csv.delimiter.is_ascii() {
            return Err(ReportError::InvalidConfig(format!(
                "csv.delimiter must be an ASCII character, got `{}`",
                self.csv.delimiter
            )));
        }
        match TableFormat::from_path(&self.layout.snapshots) {
            Ok(TableFormat::Csv | TableFormat::Tsv) => Ok(()),
            _ => Err(ReportError::InvalidConfig(format!(
                "layout.snapshots must be a .csv or .tsv file, got `{}`",
                self.layout.snapshots.display()
            ))),
        }
    }

    /// Delimited fields are read as text: unit ids keep their exact
    /// spelling and numeric columns are parsed on access.
    pub fn read_options(&self) -> ReadOptions {
        ReadOptions {
            csv: CsvReadOptions {
                delimiter: self.delimiter(),
                type_inference: CsvTypeInference::Off,
                ..CsvReadOptions::default()
            },
            sheet: None,
        }
    }

    /// Writer options for the snapshot file; `.tsv` always uses tabs.
    pub fn snapshot_write_options(&self) -> CsvWriteOptions {
        let delimiter = match TableFormat::from_path(&self.layout.snapshots) {
            Ok(TableFormat::Tsv) => b'\t',
            _ => self.delimiter(),
        };
        CsvWriteOptions {
            delimiter,
            ..CsvWriteOptions::default()
        }
    }

    fn delimiter(&self) -> u8 {
        u8::try_from(self.csv.delimiter).unwrap_or(b',')
    }
}

impl StorageLayout {
    pub fn hierarchy_path(&self, root: &Path) -> PathBuf {
        root.join(&self.hierarchy)
    }

    pub fn snapshots_path(&self, root: &Path) -> PathBuf {
        root.join(&self.snapshots)
    }

    pub fn schedule_path(&self, root: &Path) -> PathBuf {
        root.join(&self.schedule)
    }

    pub fn adjustments_path(&self, root: &Path) -> PathBuf {
        root.join(&self.adjustments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_yaml_is_default() {
        assert_eq!(ReportConfig::from_yaml_str("").unwrap(), ReportConfig::default());
    }

    #[test]
    fn partial_yaml_keeps_other_defaults() {
        let config = ReportConfig::from_yaml_str(
            "layout:\n  hierarchy: units.csv\nwrite_strategy: backup_restore\nstrict: true\n",
        )
        .unwrap();
        assert_eq!(config.layout.hierarchy, PathBuf::from("units.csv"));
        assert_eq!(config.layout.snapshots, PathBuf::from("data.csv"));
        assert_eq!(config.write_strategy, WriteStrategy::BackupRestore);
        assert!(config.strict);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(ReportConfig::from_yaml_str("stritc: true\n").is_err());
    }

    #[test]
    fn spreadsheet_snapshot_file_is_rejected() {
        let mut config = ReportConfig::default();
        config.layout.snapshots = PathBuf::from("data.xlsx");
        assert!(matches!(
            config.validate(),
            Err(ReportError::InvalidConfig(msg)) if msg.contains("layout.snapshots")
        ));
    }

    #[test]
    fn tsv_snapshots_write_tabs() {
        let mut config = ReportConfig::default();
        config.layout.snapshots = PathBuf::from("data.tsv");
        config.csv.delimiter = ';';
        assert_eq!(config.snapshot_write_options().delimiter, b'\t');
        assert_eq!(config.read_options().csv.delimiter, b';');
        assert_eq!(
            config.read_options().csv.type_inference,
            CsvTypeInference::Off
        );
    }

    #[test]
    fn discover_reads_yaml_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            ReportConfig::discover(dir.path()).unwrap(),
            ReportConfig::default()
        );
        std::fs::write(dir.path().join(ReportConfig::FILE_NAME), "csv:\n  delimiter: ';'\n")
            .unwrap();
        assert_eq!(ReportConfig::discover(dir.path()).unwrap().csv.delimiter, ';');

        std::fs::write(dir.path().join(ReportConfig::FILE_NAME), "csv: [1, 2]\n").unwrap();
        assert!(matches!(
            ReportConfig::discover(dir.path()),
            Err(ReportError::Config { .. })
        ));
    }
}
