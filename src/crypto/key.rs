//! Per-user symmetric keys
//!
//! Keys are 256-bit AES-GCM keys drawn from the operating system's secure
//! random source. They are never derived from a passphrase. The exported form
//! is standard base64 of the raw key bytes.

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::OsRng;
use base64::{engine::general_purpose::STANDARD, Engine};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::{FieldSealError, FieldSealResult};

/// Key size in bytes (256 bits)
pub const KEY_SIZE: usize = 32;

/// Algorithm identifier recorded alongside exported keys
pub const KEY_ALGORITHM: &str = "AES-256-GCM";

/// A symmetric key usable for both encryption and decryption
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct EncryptionKey {
    key: [u8; KEY_SIZE],
}

impl EncryptionKey {
    /// Wrap raw key bytes
    pub fn from_bytes(key: [u8; KEY_SIZE]) -> Self {
        Self { key }
    }

    /// Get the key bytes
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.key
    }
}

// Never print key material
impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptionKey")
            .field("algorithm", &KEY_ALGORITHM)
            .finish_non_exhaustive()
    }
}

/// Generate a new random 256-bit key
///
/// An unavailable entropy source is reported as an error and never retried.
pub fn generate_key() -> FieldSealResult<EncryptionKey> {
    let mut key = [0u8; KEY_SIZE];
    OsRng.try_fill_bytes(&mut key).map_err(|e| {
        FieldSealError::Encryption(format!("Secure random source unavailable: {}", e))
    })?;
    Ok(EncryptionKey { key })
}

/// Serialize a key for persistence
///
/// The returned string is the key itself; it is wiped when dropped.
pub fn export_key(key: &EncryptionKey) -> Zeroizing<String> {
    Zeroizing::new(STANDARD.encode(key.as_bytes()))
}

/// Restore a key from its exported form
pub fn import_key(exported: &str) -> FieldSealResult<EncryptionKey> {
    let bytes = Zeroizing::new(
        STANDARD
            .decode(exported.trim())
            .map_err(|e| FieldSealError::Encryption(format!("Invalid key encoding: {}", e)))?,
    );

    if bytes.len() != KEY_SIZE {
        return Err(FieldSealError::Encryption(format!(
            "Invalid key size: expected {}, got {}",
            KEY_SIZE,
            bytes.len()
        )));
    }

    let mut key = [0u8; KEY_SIZE];
    key.copy_from_slice(&bytes);
    Ok(EncryptionKey { key })
}
