//! Document codec for record files.
//!
//! Records are UTF-8 JSON objects. Writes go through a uniquely named hidden
//! temp file in the target directory followed by a rename, so a concurrent
//! reader never sees a half-written document.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

use super::layout::RECORD_EXT;
use crate::storage::traits::StorageError;

/// How documents are written.
#[derive(Debug, Clone, Copy)]
pub(crate) struct WriteOptions {
    pub sync_on_write: bool,
    pub pretty: bool,
}

/// Serializes a record to its on-disk bytes.
pub(crate) fn encode<T: Serialize>(value: &T, pretty: bool) -> Result<Vec<u8>, StorageError> {
    let encoded = if pretty {
        serde_json::to_vec_pretty(value)
    } else {
        serde_json::to_vec(value)
    };
    encoded.map_err(|e| StorageError::SerializationError(format!("serialization failed: {e}")))
}

/// Reads a record. A missing file is `Ok(None)`.
///
/// # Errors
/// - `Io` if the file exists but cannot be read
/// - `SerializationError` if the document is truncated or malformed
pub(crate) fn read_record<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StorageError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(StorageError::io(path, e)),
    };
    serde_json::from_slice(&bytes).map(Some).map_err(|e| {
        StorageError::SerializationError(format!(
            "deserialization of {} failed: {e}",
            path.display()
        ))
    })
}

/// Writes a record atomically, replacing any existing file.
pub(crate) fn write_record<T: Serialize>(
    path: &Path,
    value: &T,
    options: WriteOptions,
) -> Result<(), StorageError> {
    let bytes = encode(value, options.pretty)?;
    let tmp = temp_path_for(path);

    let written = write_file(&tmp, &bytes, options.sync_on_write)
        .and_then(|()| fs::rename(&tmp, path).map_err(|e| StorageError::io(path, e)));
    if written.is_err() {
        // Leftover temp files are hidden from scans, removal is best effort.
        let _ = fs::remove_file(&tmp);
    }
    written
}

fn write_file(path: &Path, bytes: &[u8], sync: bool) -> Result<(), StorageError> {
    let mut file = File::create(path).map_err(|e| StorageError::io(path, e))?;
    file.write_all(bytes).map_err(|e| StorageError::io(path, e))?;
    if sync {
        file.sync_all().map_err(|e| StorageError::io(path, e))?;
    }
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map_or_else(|| "record".into(), |n| n.to_string_lossy().into_owned());
    path.with_file_name(format!(".{name}.{}.tmp", Uuid::new_v4().simple()))
}

/// Removes a record file. Returns whether it existed.
pub(crate) fn remove_record(path: &Path) -> Result<bool, StorageError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(StorageError::io(path, e)),
    }
}

/// Returns true if `path` exists.
pub(crate) fn exists(path: &Path) -> Result<bool, StorageError> {
    path.try_exists().map_err(|e| StorageError::io(path, e))
}

/// Lists `(stem, path)` of every record file directly under `dir`.
///
/// Hidden files (temp files included), non-JSON files and directories are
/// skipped. A missing directory yields an empty list.
pub(crate) fn record_entries(dir: &Path) -> Result<Vec<(String, PathBuf)>, StorageError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(StorageError::io(dir, e)),
    };

    let mut out = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| StorageError::io(dir, e))?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| StorageError::io(&path, e))?;
        if !file_type.is_file() {
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXT) {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if stem.starts_with('.') {
            continue;
        }
        out.push((stem.to_string(), path.clone()));
    }
    Ok(out)
}

/// Lists the names of sub-directories directly under `dir`.
pub(crate) fn subdirectories(dir: &Path) -> Result<Vec<(String, PathBuf)>, StorageError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(StorageError::io(dir, e)),
    };

    let mut out = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| StorageError::io(dir, e))?;
        let path = entry.path();
        if !entry.file_type().map_err(|e| StorageError::io(&path, e))?.is_dir() {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            out.push((name.to_string(), path.clone()));
        }
    }
    Ok(out)
}
