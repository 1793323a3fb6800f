//! Storage layer for fieldseal
//!
//! Holds the key storage collaborator: the only shared, mutable state the
//! engine touches. Entity records themselves are never stored here.

pub mod file_io;
pub mod file_key_store;
pub mod key_store;
pub mod lock;

pub use file_io::{read_json, write_json_atomic};
pub use file_key_store::FileKeyStore;
pub use key_store::{KeyStore, MemoryKeyStore};
pub use lock::{KeyFileLock, KeyFileLockGuard};

use std::sync::Arc;

use crate::config::paths::FieldSealPaths;
use crate::config::settings::{KeyStoreBackend, Settings};
use crate::error::FieldSealError;

/// Open the key store selected in settings
pub fn open_key_store(
    paths: &FieldSealPaths,
    settings: &Settings,
) -> Result<Arc<dyn KeyStore>, FieldSealError> {
    match settings.key_store {
        KeyStoreBackend::File => {
            paths.ensure_directories()?;
            Ok(Arc::new(FileKeyStore::new(paths.keys_file())))
        }
        KeyStoreBackend::Memory => Ok(Arc::new(MemoryKeyStore::new())),
    }
}
