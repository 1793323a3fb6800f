//! Entity encryption on behalf of a user
//!
//! Looks up the user's key first; without one, nothing is written.

use crate::adapters::{AdapterRegistry, EntityAdapter};
use crate::config::{FieldSealPaths, Settings};
use crate::error::FieldSealResult;
use crate::models::{Record, UserId};
use crate::storage::open_key_store;

use super::key_manager::KeyManager;

/// Combines key lookup with the adapter for an entity type
pub struct SealService {
    keys: KeyManager,
    registry: AdapterRegistry,
}

impl SealService {
    /// Create a service from its parts
    pub fn new(keys: KeyManager, registry: AdapterRegistry) -> Self {
        Self { keys, registry }
    }

    /// Create a service using the key store and thresholds in settings
    pub fn from_settings(paths: &FieldSealPaths, settings: &Settings) -> FieldSealResult<Self> {
        let store = open_key_store(paths, settings)?;
        Ok(Self::new(
            KeyManager::new(store),
            AdapterRegistry::standard(settings),
        ))
    }

    /// The key manager
    pub fn keys(&self) -> &KeyManager {
        &self.keys
    }

    /// The adapter registry
    pub fn registry(&self) -> &AdapterRegistry {
        &self.registry
    }

    /// Encrypt one entity for a user
    pub fn encrypt_for_user(
        &self,
        user_id: &UserId,
        entity_type: &str,
        entity: &Record,
    ) -> FieldSealResult<Record> {
        let adapter = self.registry.get(entity_type)?;
        let key = self.keys.ensure_user_has_key(user_id)?;
        adapter.encrypt_entity(entity, &key)
    }

    /// Decrypt one entity for a user
    pub fn decrypt_for_user(
        &self,
        user_id: &UserId,
        entity_type: &str,
        entity: &Record,
    ) -> FieldSealResult<Record> {
        let adapter = self.registry.get(entity_type)?;
        let key = self.keys.ensure_user_has_key(user_id)?;
        Ok(adapter.decrypt_entity(entity, &key))
    }

    /// Encrypt a batch of entities for a user
    pub fn encrypt_batch_for_user(
        &self,
        user_id: &UserId,
        entity_type: &str,
        entities: &[Record],
    ) -> FieldSealResult<Vec<Record>> {
        let adapter = self.registry.get(entity_type)?;
        let key = self.keys.ensure_user_has_key(user_id)?;
        adapter.encrypt_entities(entities, &key)
    }

    /// Decrypt a batch of entities for a user
    pub fn decrypt_batch_for_user(
        &self,
        user_id: &UserId,
        entity_type: &str,
        entities: &[Record],
    ) -> FieldSealResult<Vec<Record>> {
        let adapter = self.registry.get(entity_type)?;
        let key = self.keys.ensure_user_has_key(user_id)?;
        Ok(adapter.decrypt_entities(entities, &key))
    }
}
