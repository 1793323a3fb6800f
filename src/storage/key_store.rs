//! Key storage collaborator
//!
//! One exported key per user identity. Implementations must make
//! `insert_if_absent` an atomic check-and-set: when two callers race to
//! create a key, both get back the same stored record.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::{FieldSealError, FieldSealResult};
use crate::models::{KeyRecord, UserId};

/// Durable key-value storage for exported keys
pub trait KeyStore: Send + Sync {
    /// Look up the record for a user
    fn get(&self, user_id: &UserId) -> FieldSealResult<Option<KeyRecord>>;

    /// Store `record` unless the user already has one
    ///
    /// Returns whichever record is stored after the call.
    fn insert_if_absent(&self, record: KeyRecord) -> FieldSealResult<KeyRecord>;

    /// Remove a user's record, returning whether one existed
    fn remove(&self, user_id: &UserId) -> FieldSealResult<bool>;
}

/// In-process store, used by tests and the `memory` backend
#[derive(Default)]
pub struct MemoryKeyStore {
    records: RwLock<HashMap<UserId, KeyRecord>>,
}

impl MemoryKeyStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyStore for MemoryKeyStore {
    fn get(&self, user_id: &UserId) -> FieldSealResult<Option<KeyRecord>> {
        let records = self.records.read().map_err(|e| {
            FieldSealError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;
        Ok(records.get(user_id).cloned())
    }

    fn insert_if_absent(&self, record: KeyRecord) -> FieldSealResult<KeyRecord> {
        let mut records = self.records.write().map_err(|e| {
            FieldSealError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;
        let stored = records
            .entry(record.user_id.clone())
            .or_insert(record);
        Ok(stored.clone())
    }

    fn remove(&self, user_id: &UserId) -> FieldSealResult<bool> {
        let mut records = self.records.write().map_err(|e| {
            FieldSealError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;
        Ok(records.remove(user_id).is_some())
    }
}
