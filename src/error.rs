//! Custom error types for fieldseal
//!
//! This module defines the error hierarchy for the encryption engine using
//! thiserror for ergonomic error definitions.

use thiserror::Error;

/// The main error type for fieldseal operations
#[derive(Error, Debug)]
pub enum FieldSealError {
    /// A user's key could not be generated, imported, or persisted.
    ///
    /// Fatal for any encrypt/decrypt attempt on that user's data.
    #[error("Key unavailable for user '{user_id}': {reason}")]
    KeyUnavailable { user_id: String, reason: String },

    /// An envelope failed authentication or was malformed
    #[error("Decryption error: {0}")]
    Decryption(String),

    /// The cipher or key was unusable during an encrypt call
    #[error("Encryption failure: {0}")]
    Encryption(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Key store errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Input records that don't have the expected shape
    #[error("Validation error: {0}")]
    Validation(String),

    /// No adapter is registered for the entity type
    #[error("Unknown entity type: {0}")]
    UnknownEntity(String),
}

impl FieldSealError {
    /// Create a "key unavailable" error for a user
    pub fn key_unavailable(user_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::KeyUnavailable {
            user_id: user_id.into(),
            reason: reason.into(),
        }
    }

    /// Check if this is a "key unavailable" error
    pub fn is_key_unavailable(&self) -> bool {
        matches!(self, Self::KeyUnavailable { .. })
    }

    /// Check if this is a decryption error
    pub fn is_decryption(&self) -> bool {
        matches!(self, Self::Decryption(_))
    }
}

impl From<std::io::Error> for FieldSealError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for FieldSealError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for fieldseal operations
pub type FieldSealResult<T> = Result<T, FieldSealError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FieldSealError::Config("test error".into());
        assert_eq!(err.to_string(), "Configuration error: test error");
    }

    #[test]
    fn test_key_unavailable_error() {
        let err = FieldSealError::key_unavailable("user-1", "store offline");
        assert_eq!(
            err.to_string(),
            "Key unavailable for user 'user-1': store offline"
        );
        assert!(err.is_key_unavailable());
        assert!(!err.is_decryption());
    }

    #[test]
    fn test_decryption_error() {
        let err = FieldSealError::Decryption("bad tag".into());
        assert!(err.is_decryption());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: FieldSealError = io_err.into();
        assert!(matches!(err, FieldSealError::Io(_)));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{nope").unwrap_err();
        let err: FieldSealError = json_err.into();
        assert!(matches!(err, FieldSealError::Json(_)));
    }
}
