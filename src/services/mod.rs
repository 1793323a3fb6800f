//! Service layer for fieldseal
//!
//! Services tie key management to the entity adapters so callers only deal
//! in users, entity types and records.

pub mod key_manager;
pub mod seal;

pub use key_manager::KeyManager;
pub use seal::SealService;
