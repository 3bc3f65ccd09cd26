//! Crash-safe JSON file helpers.
//!
//! Whole records are written atomically (temp file in the same directory,
//! then rename). Logs are appended one JSON document per line.

use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::error::{PersistenceError, Result};

/// Creates `dir` (and parents) if it does not exist yet.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        fs::create_dir_all(dir).map_err(|source| PersistenceError::DirectoryError {
            path: dir.to_path_buf(),
            source,
        })?;
    }
    Ok(())
}

/// Serializes `value` and writes it to `path` atomically.
///
/// The file is never observed half-written, even if the process crashes
/// mid-write.
pub fn atomic_write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let data = serde_json::to_vec_pretty(value)?;
    let dir = path.parent().unwrap_or(Path::new("."));
    ensure_dir(dir)?;

    let write_err = |source| PersistenceError::WriteError {
        path: path.to_path_buf(),
        source,
    };

    let mut temp_file = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
    temp_file.write_all(&data).map_err(write_err)?;
    temp_file.flush().map_err(write_err)?;
    temp_file
        .persist(path)
        .map_err(|e| PersistenceError::WriteError {
            path: path.to_path_buf(),
            source: e.error,
        })?;

    Ok(())
}

/// Reads a JSON record, returning None if the file doesn't exist.
pub fn read_json_optional<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let data = fs::read_to_string(path).map_err(|source| PersistenceError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(serde_json::from_str(&data)?))
}

/// Reads every `*.json` record in `dir`.
///
/// Unreadable records are skipped with a warning so one corrupt file does
/// not hide the rest of the collection. A missing directory is empty.
pub fn read_json_dir<T: DeserializeOwned>(dir: &Path) -> Result<Vec<T>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let read_err = |source| PersistenceError::ReadError {
        path: dir.to_path_buf(),
        source,
    };

    let mut records = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_err)? {
        let path = entry.map_err(read_err)?.path();
        if !path.extension().is_some_and(|ext| ext == "json") {
            continue;
        }
        match read_json_optional::<T>(&path) {
            Ok(Some(record)) => records.push(record),
            Ok(None) => {}
            Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable record"),
        }
    }

    Ok(records)
}

/// Appends `value` as a single JSON line to `path`.
pub fn append_json_line<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(dir) = path.parent() {
        ensure_dir(dir)?;
    }

    let mut line = serde_json::to_vec(value)?;
    line.push(b'\n');

    let write_err = |source| PersistenceError::WriteError {
        path: path.to_path_buf(),
        source,
    };

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(write_err)?;
    file.write_all(&line).map_err(write_err)?;
    file.flush().map_err(write_err)?;
    Ok(())
}

/// Reads a JSON-lines log in file order. A missing file is an empty log.
///
/// A trailing partial line (from an interrupted append) is ignored.
pub fn read_json_lines<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let read_err = |source| PersistenceError::ReadError {
        path: path.to_path_buf(),
        source,
    };

    let file = fs::File::open(path).map_err(read_err)?;
    let mut records = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line.map_err(read_err)?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str(&line) {
            Ok(record) => records.push(record),
            Err(e) => warn!(path = %path.display(), error = %e, "Skipping malformed log line"),
        }
    }
    Ok(records)
}
