//! Whole-file replacement of the snapshot table.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tally_table::TableError;

use crate::error::PersistError;

/// How the snapshot file is replaced on every ingestion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteStrategy {
    /// Write a temporary file in the destination directory, fsync it and
    /// rename it over the destination.
    #[default]
    AtomicRename,
    /// Copy the destination to `YYYYMMDDhhmmss.bak`, write in place and move
    /// the backup back if the write fails.
    BackupRestore,
}

/// Replace the contents of `path` with whatever `write` produces.
///
/// Either the new contents are in place when this returns `Ok`, or the
/// previous contents are (or the file is still absent). No temporary or
/// backup file is left behind except when restoring a backup itself fails,
/// see [`PersistError::Restore`].
pub fn replace_file<F>(path: &Path, strategy: WriteStrategy, write: F) -> Result<(), PersistError>
where
    F: FnOnce(&mut dyn Write) -> Result<(), TableError>,
{
    #[cfg(feature = "tracing")]
    tracing::debug!(path = %path.display(), ?strategy, "replacing file");

    match strategy {
        WriteStrategy::AtomicRename => write_atomic(path, write),
        WriteStrategy::BackupRestore => write_with_backup(path, write),
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> PersistError + '_ {
    move |source| PersistError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn encode_error(path: &Path, source: TableError) -> PersistError {
    match source {
        TableError::Io(source) => PersistError::Io {
            path: path.to_path_buf(),
            source,
        },
        source => PersistError::Encode {
            path: path.to_path_buf(),
            source,
        },
    }
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    }
}

fn write_atomic<F>(path: &Path, write: F) -> Result<(), PersistError>
where
    F: FnOnce(&mut dyn Write) -> Result<(), TableError>,
{
    let dir = parent_dir(path);
    // Dropping `tmp` on any early return removes the temporary file.
    let mut tmp = tempfile::Builder::new()
        .prefix(".tally-")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(io_error(dir))?;
    {
        let mut out = BufWriter::new(tmp.as_file_mut());
        write(&mut out).map_err(|e| encode_error(path, e))?;
        out.flush().map_err(io_error(path))?;
    }
    tmp.as_file().sync_all().map_err(io_error(path))?;
    tmp.persist(path).map_err(|e| PersistError::Io {
        path: path.to_path_buf(),
        source: e.error,
    })?;
    sync_dir(dir);
    Ok(())
}

/// Best effort: make the rename itself durable.
fn sync_dir(dir: &Path) {
    #[cfg(unix)]
    {
        if let Err(_err) = File::open(dir).and_then(|d| d.sync_all()) {
            #[cfg(feature = "tracing")]
            tracing::debug!(dir = %dir.display(), error = %_err, "directory sync failed");
        }
    }
    #[cfg(not(unix))]
    let _ = dir;
}

fn write_direct<F>(path: &Path, write: F) -> Result<(), PersistError>
where
    F: FnOnce(&mut dyn Write) -> Result<(), TableError>,
{
    let file = File::create(path).map_err(io_error(path))?;
    let mut out = BufWriter::new(file);
    write(&mut out).map_err(|e| encode_error(path, e))?;
    out.flush().map_err(io_error(path))?;
    out.get_ref().sync_all().map_err(io_error(path))?;
    Ok(())
}

fn write_with_backup<F>(path: &Path, write: F) -> Result<(), PersistError>
where
    F: FnOnce(&mut dyn Write) -> Result<(), TableError>,
{
    if !path.exists() {
        return write_direct(path, write).inspect_err(|_| {
            let _ = fs::remove_file(path);
        });
    }

    let backup = backup_path(path);
    fs::copy(path, &backup).map_err(io_error(&backup))?;

    match write_direct(path, write) {
        Ok(()) => {
            if let Err(_err) = fs::remove_file(&backup) {
                #[cfg(feature = "tracing")]
                tracing::warn!(backup = %backup.display(), error = %_err, "could not remove backup");
            }
            Ok(())
        }
        Err(err) => {
            let _ = fs::remove_file(path);
            fs::rename(&backup, path).map_err(|source| PersistError::Restore {
                path: path.to_path_buf(),
                backup: backup.clone(),
                source,
            })?;
            #[cfg(feature = "tracing")]
            tracing::warn!(path = %path.display(), error = %err, "write failed, backup restored");
            Err(err)
        }
    }
}

/// `YYYYMMDDhhmmss.bak` next to `path`; a numeric suffix keeps an existing
/// backup from the same second untouched.
fn backup_path(path: &Path) -> PathBuf {
    let dir = parent_dir(path);
    let stamp = chrono::Local::now().format("%Y%m%d%H%M%S").to_string();
    let mut candidate = dir.join(format!("{stamp}.bak"));
    let mut n = 1;
    while candidate.exists() {
        candidate = dir.join(format!("{stamp}-{n}.bak"));
        n += 1;
    }
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    fn fail_midway(out: &mut dyn Write) -> Result<(), TableError> {
        out.write_all(b"ID,2024")?;
        Err(TableError::Backend {
            backend: "test",
            message: "disk full".to_string(),
        })
    }

    const STRATEGIES: [WriteStrategy; 2] =
        [WriteStrategy::AtomicRename, WriteStrategy::BackupRestore];

    #[test]
    fn replaces_contents() {
        for strategy in STRATEGIES {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("data.csv");
            fs::write(&path, "old").unwrap();

            replace_file(&path, strategy, |out| {
                out.write_all(b"new")?;
                Ok(())
            })
            .unwrap();

            assert_eq!(fs::read_to_string(&path).unwrap(), "new");
            assert_eq!(listing(dir.path()), vec!["data.csv"], "{strategy:?}");
        }
    }

    #[test]
    fn creates_missing_file() {
        for strategy in STRATEGIES {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("data.csv");
            replace_file(&path, strategy, |out| {
                out.write_all(b"ID\n")?;
                Ok(())
            })
            .unwrap();
            assert_eq!(fs::read_to_string(&path).unwrap(), "ID\n");
        }
    }

    #[test]
    fn failed_write_keeps_previous_contents() {
        for strategy in STRATEGIES {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("data.csv");
            fs::write(&path, "ID,20240101\nA,1\n").unwrap();

            let err = replace_file(&path, strategy, fail_midway).unwrap_err();
            assert!(matches!(err, PersistError::Encode { .. }), "{err:?}");

            assert_eq!(fs::read_to_string(&path).unwrap(), "ID,20240101\nA,1\n");
            assert_eq!(listing(dir.path()), vec!["data.csv"], "{strategy:?}");
        }
    }

    #[test]
    fn failed_first_write_leaves_nothing() {
        for strategy in STRATEGIES {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("data.csv");
            assert!(replace_file(&path, strategy, fail_midway).is_err());
            assert!(listing(dir.path()).is_empty(), "{strategy:?}");
        }
    }

    #[test]
    fn writer_io_errors_name_the_destination() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        let err = replace_file(&path, WriteStrategy::AtomicRename, |_| {
            Err(TableError::Io(std::io::Error::other("boom")))
        })
        .unwrap_err();
        match err {
            PersistError::Io { path: p, .. } => assert_eq!(p, path),
            other => panic!("expected io error, got {other:?}"),
        }
    }

    #[test]
    fn backup_names_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        let first = backup_path(&path);
        fs::write(&first, "").unwrap();
        let second = backup_path(&path);
        assert_ne!(first, second);
        assert_eq!(second.extension().unwrap(), "bak");
    }

    #[test]
    fn strategy_names_in_yaml() {
        let parsed: WriteStrategy = serde_yaml::from_str("backup_restore").unwrap();
        assert_eq!(parsed, WriteStrategy::BackupRestore);
        assert_eq!(WriteStrategy::default(), WriteStrategy::AtomicRename);
    }
}
