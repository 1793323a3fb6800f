//! Persisted form of a user's key

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use zeroize::Zeroize;

use super::ids::UserId;
use crate::crypto::{export_key, import_key, EncryptionKey, KEY_ALGORITHM};
use crate::error::FieldSealResult;

/// One exported key, stored keyed by user identity
///
/// Records are created once and never mutated in place.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyRecord {
    /// Owner of the key
    pub user_id: UserId,

    /// Identifies the key in logs without revealing it
    pub key_id: Uuid,

    /// Cipher the key is meant for
    #[serde(default = "default_algorithm")]
    pub algorithm: String,

    /// The exported key (base64)
    pub key: String,

    /// When the key was generated
    pub created_at: DateTime<Utc>,
}

fn default_algorithm() -> String {
    KEY_ALGORITHM.to_string()
}

impl KeyRecord {
    /// Build a record for a freshly generated key
    pub fn new(user_id: UserId, key: &EncryptionKey) -> Self {
        Self {
            user_id,
            key_id: Uuid::new_v4(),
            algorithm: default_algorithm(),
            key: export_key(key).as_str().to_owned(),
            created_at: Utc::now(),
        }
    }

    /// Import the stored key
    pub fn import(&self) -> FieldSealResult<EncryptionKey> {
        import_key(&self.key)
    }
}

impl Drop for KeyRecord {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

// Don't print the key in Debug output
impl fmt::Debug for KeyRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyRecord")
            .field("user_id", &self.user_id)
            .field("key_id", &self.key_id)
            .field("algorithm", &self.algorithm)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::generate_key;

    #[test]
    fn test_record_imports_same_key() {
        let key = generate_key().unwrap();
        let record = KeyRecord::new(UserId::new("alice").unwrap(), &key);
        assert_eq!(record.algorithm, "AES-256-GCM");
        assert_eq!(record.import().unwrap().as_bytes(), key.as_bytes());
    }

    #[test]
    fn test_debug_redacts_key() {
        let key = generate_key().unwrap();
        let record = KeyRecord::new(UserId::new("alice").unwrap(), &key);
        let debug = format!("{:?}", record);
        assert!(debug.contains("alice"));
        assert!(!debug.contains(&record.key));
    }

    #[test]
    fn test_serde_round_trip() {
        let key = generate_key().unwrap();
        let record = KeyRecord::new(UserId::new("alice").unwrap(), &key);
        let json = serde_json::to_string(&record).unwrap();
        let loaded: KeyRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record, loaded);
    }

    #[test]
    fn test_algorithm_defaults_when_missing() {
        let json = r#"{
            "user_id": "bob",
            "key_id": "550e8400-e29b-41d4-a716-446655440000",
            "key": "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=",
            "created_at": "2024-01-05T00:00:00Z"
        }"#;
        let record: KeyRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.algorithm, "AES-256-GCM");
        assert!(record.import().is_ok());
    }
}
