//! Per-user key lifecycle
//!
//! One key per user, created lazily on first use and reused afterwards.
//! Creation is a critical section per user: concurrent first use within the
//! process is serialized by a per-user lock, and across processes by the
//! store's atomic `insert_if_absent`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use crate::crypto::{generate_key, EncryptionKey};
use crate::error::{FieldSealError, FieldSealResult};
use crate::models::{KeyRecord, UserId};
use crate::storage::KeyStore;

/// Generates, persists and hands out user keys
pub struct KeyManager {
    store: Arc<dyn KeyStore>,
    cache: RwLock<HashMap<UserId, Arc<EncryptionKey>>>,
    creation_locks: Mutex<HashMap<UserId, Arc<Mutex<()>>>>,
}

impl KeyManager {
    /// Create a manager over a key store
    pub fn new(store: Arc<dyn KeyStore>) -> Self {
        Self {
            store,
            cache: RwLock::new(HashMap::new()),
            creation_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Get the user's key without creating one
    pub fn get_key(&self, user_id: &UserId) -> FieldSealResult<Option<Arc<EncryptionKey>>> {
        if let Some(key) = self.cached(user_id)? {
            return Ok(Some(key));
        }

        match self.key_record(user_id)? {
            Some(record) => self.import_and_cache(user_id, &record).map(Some),
            None => Ok(None),
        }
    }

    /// The stored record for the user's key, if any
    pub fn key_record(&self, user_id: &UserId) -> FieldSealResult<Option<KeyRecord>> {
        self.store.get(user_id).map_err(|e| unavailable(user_id, e))
    }

    /// Get the user's key, creating and persisting one if none exists
    ///
    /// Concurrent callers for the same user always receive the same key.
    pub fn ensure_user_has_key(&self, user_id: &UserId) -> FieldSealResult<Arc<EncryptionKey>> {
        if let Some(key) = self.cached(user_id)? {
            return Ok(key);
        }

        let lock = self.creation_lock(user_id)?;
        let result = match lock.lock() {
            Ok(_guard) => self.load_or_create(user_id),
            Err(e) => Err(FieldSealError::key_unavailable(user_id.as_str(), e.to_string())),
        };
        self.release_creation_lock(user_id, lock);
        result
    }

    fn load_or_create(&self, user_id: &UserId) -> FieldSealResult<Arc<EncryptionKey>> {
        // Another caller may have finished while we waited
        if let Some(key) = self.get_key(user_id)? {
            return Ok(key);
        }

        let key = generate_key().map_err(|e| unavailable(user_id, e))?;
        let candidate = KeyRecord::new(user_id.clone(), &key);
        let stored = self
            .store
            .insert_if_absent(candidate.clone())
            .map_err(|e| unavailable(user_id, e))?;

        if stored.key_id == candidate.key_id {
            tracing::info!(user = %user_id, key_id = %stored.key_id, "created encryption key");
        } else {
            tracing::debug!(
                user = %user_id,
                key_id = %stored.key_id,
                "key created concurrently elsewhere; using stored key"
            );
        }

        self.import_and_cache(user_id, &stored)
    }

    /// Delete the user's key from the store and cache
    ///
    /// Anything encrypted under the key can no longer be decrypted.
    pub fn delete_key(&self, user_id: &UserId) -> FieldSealResult<bool> {
        self.forget(user_id);
        let removed = self
            .store
            .remove(user_id)
            .map_err(|e| unavailable(user_id, e))?;
        if removed {
            tracing::warn!(user = %user_id, "deleted encryption key");
        }
        Ok(removed)
    }

    /// Drop the user's key from the in-process cache
    pub fn forget(&self, user_id: &UserId) {
        if let Ok(mut cache) = self.cache.write() {
            cache.remove(user_id);
        }
    }

    /// Drop every cached key, e.g. at the end of a session
    pub fn clear_cache(&self) {
        if let Ok(mut cache) = self.cache.write() {
            cache.clear();
        }
    }

    fn cached(&self, user_id: &UserId) -> FieldSealResult<Option<Arc<EncryptionKey>>> {
        let cache = self
            .cache
            .read()
            .map_err(|e| FieldSealError::key_unavailable(user_id.as_str(), e.to_string()))?;
        Ok(cache.get(user_id).cloned())
    }

    fn creation_lock(&self, user_id: &UserId) -> FieldSealResult<Arc<Mutex<()>>> {
        let mut locks = self
            .creation_locks
            .lock()
            .map_err(|e| FieldSealError::key_unavailable(user_id.as_str(), e.to_string()))?;
        Ok(locks.entry(user_id.clone()).or_default().clone())
    }

    /// Drop the user's creation lock once no other caller is waiting on it
    fn release_creation_lock(&self, user_id: &UserId, lock: Arc<Mutex<()>>) {
        if let Ok(mut locks) = self.creation_locks.lock() {
            // Our handle plus the map's: nobody else holds or waits on it
            if Arc::strong_count(&lock) == 2 {
                locks.remove(user_id);
            }
        }
    }

    fn import_and_cache(
        &self,
        user_id: &UserId,
        record: &KeyRecord,
    ) -> FieldSealResult<Arc<EncryptionKey>> {
        let key = Arc::new(record.import().map_err(|e| unavailable(user_id, e))?);
        let mut cache = self
            .cache
            .write()
            .map_err(|e| FieldSealError::key_unavailable(user_id.as_str(), e.to_string()))?;
        let key = cache.entry(user_id.clone()).or_insert(key).clone();
        tracing::debug!(user = %user_id, key_id = %record.key_id, "loaded encryption key");
        Ok(key)
    }
}

fn unavailable(user_id: &UserId, err: FieldSealError) -> FieldSealError {
    match err {
        FieldSealError::KeyUnavailable { .. } => err,
        other => FieldSealError::key_unavailable(user_id.as_str(), other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{decrypt_value, encrypt_value, export_key};
    use crate::storage::{FileKeyStore, MemoryKeyStore};
    use tempfile::TempDir;

    struct BrokenStore;

    impl KeyStore for BrokenStore {
        fn get(&self, _user_id: &UserId) -> FieldSealResult<Option<KeyRecord>> {
            Err(FieldSealError::Storage("disk unavailable".into()))
        }

        fn insert_if_absent(&self, _record: KeyRecord) -> FieldSealResult<KeyRecord> {
            Err(FieldSealError::Storage("disk unavailable".into()))
        }

        fn remove(&self, _user_id: &UserId) -> FieldSealResult<bool> {
            Err(FieldSealError::Storage("disk unavailable".into()))
        }
    }

    fn alice() -> UserId {
        UserId::new("alice").unwrap()
    }

    #[test]
    fn test_creates_key_once() {
        let store = Arc::new(MemoryKeyStore::new());
        let manager = KeyManager::new(store.clone());

        assert!(manager.get_key(&alice()).unwrap().is_none());
        assert!(manager.key_record(&alice()).unwrap().is_none());
        let first = manager.ensure_user_has_key(&alice()).unwrap();
        let second = manager.ensure_user_has_key(&alice()).unwrap();

        assert_eq!(first.as_bytes(), second.as_bytes());
        assert_eq!(store.len(), 1);
        let record = manager.key_record(&alice()).unwrap().unwrap();
        assert_eq!(record.import().unwrap().as_bytes(), first.as_bytes());
    }

    #[test]
    fn test_users_get_distinct_keys() {
        let manager = KeyManager::new(Arc::new(MemoryKeyStore::new()));
        let a = manager.ensure_user_has_key(&alice()).unwrap();
        let b = manager
            .ensure_user_has_key(&UserId::new("bob").unwrap())
            .unwrap();
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn test_concurrent_first_use_yields_one_key() {
        let store = Arc::new(MemoryKeyStore::new());
        let manager = KeyManager::new(store.clone());

        let exported: Vec<String> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(|| export_key(&manager.ensure_user_has_key(&alice()).unwrap()).as_str().to_owned()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert!(exported.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_creation_locks_released_after_use() {
        let manager = KeyManager::new(Arc::new(MemoryKeyStore::new()));
        for i in 0..50 {
            let user = UserId::new(format!("user-{}", i)).unwrap();
            manager.ensure_user_has_key(&user).unwrap();
        }
        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| manager.ensure_user_has_key(&alice()).unwrap());
            }
        });

        assert!(manager.creation_locks.lock().unwrap().is_empty());
    }

    #[test]
    fn test_concurrent_first_use_over_shared_key_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("keys.json");

        for round in 0..10 {
            let user = UserId::new(format!("user-{}", round)).unwrap();
            let exported: Vec<String> = std::thread::scope(|s| {
                let handles: Vec<_> = (0..4)
                    .map(|_| {
                        // Each manager has its own store and cache, as in separate processes
                        let manager = KeyManager::new(Arc::new(FileKeyStore::new(path.clone())));
                        let user = user.clone();
                        s.spawn(move || {
                            export_key(&manager.ensure_user_has_key(&user).unwrap())
                                .as_str()
                                .to_owned()
                        })
                    })
                    .collect();
                handles.into_iter().map(|h| h.join().unwrap()).collect()
            });

            assert!(exported.windows(2).all(|w| w[0] == w[1]));
            let stored = FileKeyStore::new(path.clone()).get(&user).unwrap().unwrap();
            assert_eq!(export_key(&stored.import().unwrap()).as_str(), exported[0]);
        }
    }

    #[test]
    fn test_separate_managers_share_stored_key() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("keys.json");
        let manager_a = KeyManager::new(Arc::new(FileKeyStore::new(path.clone())));
        let manager_b = KeyManager::new(Arc::new(FileKeyStore::new(path)));

        let key_a = manager_a.ensure_user_has_key(&alice()).unwrap();
        let envelope = encrypt_value("Pharmacy", &key_a).unwrap();

        let key_b = manager_b.ensure_user_has_key(&alice()).unwrap();
        assert_eq!(decrypt_value(&envelope, &key_b).unwrap(), "Pharmacy");
    }

    #[test]
    fn test_key_survives_cache_clear() {
        let manager = KeyManager::new(Arc::new(MemoryKeyStore::new()));
        let key = manager.ensure_user_has_key(&alice()).unwrap();
        manager.clear_cache();

        let reloaded = manager.get_key(&alice()).unwrap().unwrap();
        assert_eq!(key.as_bytes(), reloaded.as_bytes());
    }

    #[test]
    fn test_broken_store_is_key_unavailable() {
        let manager = KeyManager::new(Arc::new(BrokenStore));

        let err = manager.ensure_user_has_key(&alice()).unwrap_err();
        assert!(err.is_key_unavailable());
        assert!(err.to_string().contains("disk unavailable"));
        assert!(manager.get_key(&alice()).unwrap_err().is_key_unavailable());
    }

    #[test]
    fn test_corrupt_record_is_key_unavailable() {
        let store = Arc::new(MemoryKeyStore::new());
        let mut record = KeyRecord::new(alice(), &generate_key().unwrap());
        record.key = "garbage".to_string();
        store.insert_if_absent(record).unwrap();

        let manager = KeyManager::new(store);
        assert!(manager.ensure_user_has_key(&alice()).unwrap_err().is_key_unavailable());
    }

    #[test]
    fn test_delete_key() {
        let store = Arc::new(MemoryKeyStore::new());
        let manager = KeyManager::new(store.clone());
        let old = manager.ensure_user_has_key(&alice()).unwrap();

        assert!(manager.delete_key(&alice()).unwrap());
        assert!(store.is_empty());
        assert!(manager.get_key(&alice()).unwrap().is_none());

        let new = manager.ensure_user_has_key(&alice()).unwrap();
        assert_ne!(old.as_bytes(), new.as_bytes());
    }
}
