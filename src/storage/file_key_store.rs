//! JSON file key store
//!
//! Persists key records to `keys.json`. Every operation re-reads the file
//! while holding an exclusive lock on `keys.json.lock`, so a record written
//! by another thread or process is seen before a new one is created and no
//! concurrent write is lost.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::error::FieldSealResult;
use crate::models::{KeyRecord, UserId};

use super::file_io::{read_json, write_json_atomic};
use super::key_store::KeyStore;
use super::lock::{lock_path_for, KeyFileLock};

/// Serializable key file structure
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct KeyFile {
    #[serde(default)]
    keys: BTreeMap<UserId, KeyRecord>,
}

/// Key store backed by a single JSON file
pub struct FileKeyStore {
    path: PathBuf,
    lock_path: PathBuf,
}

impl FileKeyStore {
    /// Create a store for the given file path
    pub fn new(path: PathBuf) -> Self {
        let lock_path = lock_path_for(&path);
        Self { path, lock_path }
    }

    /// Path of the backing file
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Open a fresh lock handle; the caller holds `lock()` on it
    fn open_lock(&self) -> FieldSealResult<KeyFileLock> {
        KeyFileLock::open(&self.lock_path)
    }
}

impl KeyStore for FileKeyStore {
    fn get(&self, user_id: &UserId) -> FieldSealResult<Option<KeyRecord>> {
        let lock = self.open_lock()?;
        let _guard = lock.lock()?;
        let file: KeyFile = read_json(&self.path)?;
        Ok(file.keys.get(user_id).cloned())
    }

    fn insert_if_absent(&self, record: KeyRecord) -> FieldSealResult<KeyRecord> {
        let lock = self.open_lock()?;
        let _guard = lock.lock()?;
        let mut file: KeyFile = read_json(&self.path)?;

        if let Some(existing) = file.keys.get(&record.user_id) {
            return Ok(existing.clone());
        }

        file.keys.insert(record.user_id.clone(), record.clone());
        write_json_atomic(&self.path, &file)?;
        tracing::debug!(
            user = %record.user_id,
            key_id = %record.key_id,
            path = %self.path.display(),
            "persisted new key record"
        );
        Ok(record)
    }

    fn remove(&self, user_id: &UserId) -> FieldSealResult<bool> {
        let lock = self.open_lock()?;
        let _guard = lock.lock()?;
        let mut file: KeyFile = read_json(&self.path)?;

        if file.keys.remove(user_id).is_none() {
            return Ok(false);
        }

        write_json_atomic(&self.path, &file)?;
        Ok(true)
    }
}
