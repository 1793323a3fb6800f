//! Configuration module for fieldseal
//!
//! This module provides configuration management including:
//! - XDG-compliant path resolution
//! - Settings persistence

pub mod paths;
pub mod settings;

pub use paths::FieldSealPaths;
pub use settings::{KeyStoreBackend, Settings};
