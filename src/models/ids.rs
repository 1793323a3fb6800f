//! Identity wrappers
//!
//! User identities come from the surrounding application and are opaque
//! strings. The newtype keeps them from being mixed up with entity fields.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{FieldSealError, FieldSealResult};

/// The identity a key belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Create a user ID, rejecting blank identities
    pub fn new(id: impl Into<String>) -> FieldSealResult<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(FieldSealError::Validation(
                "User ID cannot be empty".to_string(),
            ));
        }
        Ok(Self(id))
    }

    /// Get the identity as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for UserId {
    type Err = FieldSealError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
