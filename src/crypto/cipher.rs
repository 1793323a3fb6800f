//! AES-256-GCM value encryption
//!
//! Each call encrypts one string into a self-contained envelope:
//! `base64(nonce || ciphertext || tag)`. The nonce is fresh for every call.
//! Empty input is passed through unchanged in both directions.

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD, Engine};

use crate::error::{FieldSealError, FieldSealResult};

use super::EncryptionKey;

/// Size of the AES-GCM nonce in bytes (96 bits)
pub const NONCE_SIZE: usize = 12;

/// Size of the AES-GCM authentication tag in bytes (128 bits)
pub const TAG_SIZE: usize = 16;

fn cipher_for(key: &EncryptionKey) -> FieldSealResult<Aes256Gcm> {
    Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| FieldSealError::Encryption(format!("Failed to create cipher: {}", e)))
}

/// Encrypt a single value into a base64 envelope
pub fn encrypt_value(plaintext: &str, key: &EncryptionKey) -> FieldSealResult<String> {
    if plaintext.is_empty() {
        return Ok(String::new());
    }

    let cipher = cipher_for(key)?;

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    OsRng.try_fill_bytes(&mut nonce_bytes).map_err(|e| {
        FieldSealError::Encryption(format!("Secure random source unavailable: {}", e))
    })?;
    let nonce = Nonce::from_slice(&nonce_bytes);

    // Output is ciphertext with the tag appended
    let sealed = cipher
        .encrypt(nonce, plaintext.as_bytes())
        .map_err(|e| FieldSealError::Encryption(format!("Encryption failed: {}", e)))?;

    let mut envelope = Vec::with_capacity(NONCE_SIZE + sealed.len());
    envelope.extend_from_slice(&nonce_bytes);
    envelope.extend_from_slice(&sealed);

    Ok(STANDARD.encode(envelope))
}

/// Decrypt a base64 envelope produced by [`encrypt_value`]
pub fn decrypt_value(envelope: &str, key: &EncryptionKey) -> FieldSealResult<String> {
    if envelope.is_empty() {
        return Ok(String::new());
    }

    let bytes = STANDARD
        .decode(envelope)
        .map_err(|e| FieldSealError::Decryption(format!("Invalid envelope encoding: {}", e)))?;

    if bytes.len() < NONCE_SIZE + TAG_SIZE {
        return Err(FieldSealError::Decryption(format!(
            "Envelope too short: expected at least {} bytes, got {}",
            NONCE_SIZE + TAG_SIZE,
            bytes.len()
        )));
    }

    let (nonce_bytes, sealed) = bytes.split_at(NONCE_SIZE);
    let nonce = Nonce::from_slice(nonce_bytes);

    let plaintext = cipher_for(key)?.decrypt(nonce, sealed).map_err(|_| {
        FieldSealError::Decryption("Decryption failed: invalid key or corrupted data".to_string())
    })?;

    String::from_utf8(plaintext)
        .map_err(|e| FieldSealError::Decryption(format!("Invalid UTF-8 in decrypted data: {}", e)))
}
