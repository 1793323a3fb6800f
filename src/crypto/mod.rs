//! Cryptographic primitives for fieldseal
//!
//! Provides per-user AES-256-GCM keys and single-value envelope
//! encryption. Field selection lives in the engine, not here.

pub mod cipher;
pub mod key;

pub use cipher::{decrypt_value, encrypt_value, NONCE_SIZE, TAG_SIZE};
pub use key::{export_key, generate_key, import_key, EncryptionKey, KEY_ALGORITHM, KEY_SIZE};
