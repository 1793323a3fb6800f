//! File I/O utilities with atomic writes
//!
//! Key files must never be left half-written: a torn `keys.json` would lose
//! every user's key at once.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};
use tempfile::NamedTempFile;

use crate::error::FieldSealError;

/// Read JSON from a file, returning a default value if file doesn't exist
pub fn read_json<T, P>(path: P) -> Result<T, FieldSealError>
where
    T: DeserializeOwned + Default,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    if !path.exists() {
        return Ok(T::default());
    }

    let file = File::open(path)
        .map_err(|e| FieldSealError::Storage(format!("Failed to open {}: {}", path.display(), e)))?;

    let reader = BufReader::new(file);
    serde_json::from_reader(reader)
        .map_err(|e| FieldSealError::Storage(format!("Failed to parse {}: {}", path.display(), e)))
}

/// Write JSON to a file atomically (write to a uniquely named temp file, then rename)
///
/// On Unix the file is created readable by the owner only.
pub fn write_json_atomic<T, P>(path: P, data: &T) -> Result<(), FieldSealError>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|e| {
        FieldSealError::Storage(format!(
            "Failed to create directory {}: {}",
            parent.display(),
            e
        ))
    })?;

    // Same directory, so the rename stays on one filesystem. Dropped unpersisted
    // temp files are removed by `NamedTempFile`.
    let temp = NamedTempFile::new_in(parent)
        .map_err(|e| FieldSealError::Storage(format!("Failed to create temp file: {}", e)))?;
    restrict_permissions(temp.as_file())?;

    let mut writer = BufWriter::new(temp);
    serde_json::to_writer_pretty(&mut writer, data)
        .map_err(|e| FieldSealError::Storage(format!("Failed to serialize data: {}", e)))?;

    let temp = writer
        .into_inner()
        .map_err(|e| FieldSealError::Storage(format!("Failed to flush data: {}", e.error())))?;

    temp.as_file()
        .sync_all()
        .map_err(|e| FieldSealError::Storage(format!("Failed to sync data: {}", e)))?;

    temp.persist(path)
        .map_err(|e| FieldSealError::Storage(format!("Failed to rename temp file: {}", e.error)))?;

    Ok(())
}

#[cfg(unix)]
fn restrict_permissions(file: &File) -> Result<(), FieldSealError> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(fs::Permissions::from_mode(0o600))
        .map_err(|e| FieldSealError::Storage(format!("Failed to set file permissions: {}", e)))
}

#[cfg(not(unix))]
fn restrict_permissions(_file: &File) -> Result<(), FieldSealError> {
    Ok(())
}
