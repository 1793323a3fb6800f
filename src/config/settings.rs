//! User settings for fieldseal
//!
//! Selects the key store backend, tunes the conditional reference-number
//! rule, and sets the default log filter.

use serde::{Deserialize, Serialize};

use super::paths::FieldSealPaths;
use crate::error::FieldSealError;

/// Default minimum length at which a reference number is treated as sensitive
pub const DEFAULT_REFERENCE_MIN_LENGTH: usize = 10;

/// Where key records are persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum KeyStoreBackend {
    /// `keys.json` in the base directory (default)
    #[default]
    File,
    /// Process memory only; keys vanish on exit
    Memory,
}

/// User settings for fieldseal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Key store backend
    #[serde(default)]
    pub key_store: KeyStoreBackend,

    /// Reference numbers shorter than this stay in plaintext
    #[serde(default = "default_reference_min_length")]
    pub reference_min_length: usize,

    /// Default `tracing` filter directive
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_schema_version() -> u32 {
    1
}

fn default_reference_min_length() -> usize {
    DEFAULT_REFERENCE_MIN_LENGTH
}

fn default_log_filter() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            key_store: KeyStoreBackend::default(),
            reference_min_length: default_reference_min_length(),
            log_filter: default_log_filter(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or create default settings if file doesn't exist
    pub fn load_or_create(paths: &FieldSealPaths) -> Result<Self, FieldSealError> {
        let settings_path = paths.settings_file();

        if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path).map_err(|e| {
                FieldSealError::Io(format!("Failed to read settings file: {}", e))
            })?;

            let settings: Settings = serde_json::from_str(&contents).map_err(|e| {
                FieldSealError::Config(format!("Failed to parse settings file: {}", e))
            })?;

            Ok(settings)
        } else {
            // Don't save yet - let caller decide when to persist
            Ok(Settings::default())
        }
    }

    /// Save settings to disk
    pub fn save(&self, paths: &FieldSealPaths) -> Result<(), FieldSealError> {
        paths.ensure_directories()?;

        let contents = serde_json::to_string_pretty(self).map_err(|e| {
            FieldSealError::Config(format!("Failed to serialize settings: {}", e))
        })?;

        std::fs::write(paths.settings_file(), contents)
            .map_err(|e| FieldSealError::Io(format!("Failed to write settings file: {}", e)))?;

        Ok(())
    }
}
