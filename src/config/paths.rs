//! Path management for fieldseal
//!
//! ## Path Resolution Order
//!
//! 1. `FIELDSEAL_DATA_DIR` environment variable (if set)
//! 2. Unix (Linux/macOS): `$XDG_CONFIG_HOME/fieldseal` or `~/.config/fieldseal`
//! 3. Otherwise the platform config directory (`%APPDATA%\fieldseal` on Windows)

use std::path::PathBuf;

use crate::error::FieldSealError;

/// Environment variable overriding the base directory
pub const DATA_DIR_ENV: &str = "FIELDSEAL_DATA_DIR";

/// Manages all paths used by fieldseal
#[derive(Debug, Clone)]
pub struct FieldSealPaths {
    base_dir: PathBuf,
}

impl FieldSealPaths {
    /// Create a new FieldSealPaths instance
    ///
    /// # Errors
    ///
    /// Returns an error if no home or config directory can be determined.
    pub fn new() -> Result<Self, FieldSealError> {
        let base_dir = match std::env::var(DATA_DIR_ENV) {
            Ok(custom) if !custom.is_empty() => PathBuf::from(custom),
            _ => resolve_default_path()?,
        };

        Ok(Self { base_dir })
    }

    /// Create FieldSealPaths with a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the path to the settings file
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the path to the key records file
    pub fn keys_file(&self) -> PathBuf {
        self.base_dir.join("keys.json")
    }

    /// Ensure the base directory exists
    pub fn ensure_directories(&self) -> Result<(), FieldSealError> {
        std::fs::create_dir_all(&self.base_dir)
            .map_err(|e| FieldSealError::Io(format!("Failed to create base directory: {}", e)))
    }
}

#[cfg(not(windows))]
fn resolve_default_path() -> Result<PathBuf, FieldSealError> {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        if !xdg.is_empty() {
            return Ok(PathBuf::from(xdg).join("fieldseal"));
        }
    }
    let base = directories::BaseDirs::new()
        .ok_or_else(|| FieldSealError::Config("Could not determine home directory".into()))?;
    Ok(base.home_dir().join(".config").join("fieldseal"))
}

#[cfg(windows)]
fn resolve_default_path() -> Result<PathBuf, FieldSealError> {
    let base = directories::BaseDirs::new()
        .ok_or_else(|| FieldSealError::Config("Could not determine APPDATA directory".into()))?;
    Ok(base.config_dir().join("fieldseal"))
}
