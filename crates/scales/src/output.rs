//! Snapshot persistence.
//!
//! The JSON is written to a hidden sibling file and renamed into place, so the
//! target is either the previous file or the complete new snapshot.

use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("failed to write state file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to serialise state for '{}': {source}", path.display())]
    Serialize {
        path: PathBuf,
        source: serde_json::Error,
    },
}

pub fn write_snapshot<T: Serialize>(path: &Path, snapshot: &T) -> Result<(), OutputError> {
    let io_error = |source| OutputError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_error)?;
    }

    let staging = staging_path(path);
    let result = write_staged(&staging, path, snapshot);
    if result.is_err() {
        let _ = fs::remove_file(&staging);
    }
    result?;

    fs::rename(&staging, path).map_err(io_error)
}

fn write_staged<T: Serialize>(staging: &Path, target: &Path, snapshot: &T) -> Result<(), OutputError> {
    let io_error = |source| OutputError::Io {
        path: target.to_path_buf(),
        source,
    };

    let file = File::create(staging).map_err(io_error)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, snapshot).map_err(|source| {
        OutputError::Serialize {
            path: target.to_path_buf(),
            source,
        }
    })?;
    writer.flush().map_err(io_error)?;
    let file = writer.into_inner().map_err(|err| io_error(err.into_error()))?;
    file.sync_all().map_err(io_error)
}

fn staging_path(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "state.json".to_string());
    path.with_file_name(format!(".{file_name}.tmp"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn creates_parent_directories_and_pretty_prints() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("data/modules/X_state.json");

        write_snapshot(&path, &json!({ "name": "Índice ÆØ", "score": 12.5 })).expect("written");

        let written = fs::read_to_string(&path).expect("readable");
        assert!(written.contains("\n  \"name\": \"Índice ÆØ\""));
        assert!(!dir.path().join("data/modules/.X_state.json.tmp").exists());
    }

    #[test]
    fn replaces_existing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("state.json");
        fs::write(&path, "old").expect("seed");

        write_snapshot(&path, &json!({ "fresh": true })).expect("written");

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).expect("readable")).expect("json");
        assert_eq!(value["fresh"], true);
    }
}
