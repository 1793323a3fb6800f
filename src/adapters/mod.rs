//! Domain adapters
//!
//! Each adapter binds the structural engine to one entity shape: it declares
//! which fields are sensitive and which hold dates, and exposes entity and
//! batch encrypt/decrypt. Fields an adapter doesn't declare are passed
//! through unchanged, including ones it has never heard of.

pub mod finance;
pub mod registry;
pub mod routine;

pub use finance::{RecurringTransactionAdapter, TransactionAdapter};
pub use registry::AdapterRegistry;
pub use routine::RoutineAdapter;

use rayon::prelude::*;

use crate::crypto::EncryptionKey;
use crate::engine::{decrypt_fields_detailed, encrypt_fields, DecryptOutcome, FieldAllowlist};
use crate::error::{FieldSealError, FieldSealResult};
use crate::models::{DateValue, Record, Value};

/// Binds selective encryption to one entity type
pub trait EntityAdapter: Send + Sync {
    /// Name of the entity type, e.g. `transaction`
    fn entity_type(&self) -> &'static str;

    /// Sensitive fields of this entity type
    fn allowlist(&self) -> &FieldAllowlist;

    /// Dotted paths of fields holding dates
    fn date_fields(&self) -> &'static [&'static str] {
        &[]
    }

    /// Encrypt one entity
    fn encrypt_entity(&self, entity: &Record, key: &EncryptionKey) -> FieldSealResult<Record> {
        encrypt_fields(entity, self.allowlist(), key)
    }

    /// Decrypt one entity, keeping undecryptable fields as stored
    fn decrypt_entity(&self, entity: &Record, key: &EncryptionKey) -> Record {
        self.decrypt_entity_detailed(entity, key).record
    }

    /// Decrypt one entity and report fallback fields
    fn decrypt_entity_detailed(&self, entity: &Record, key: &EncryptionKey) -> DecryptOutcome {
        let outcome = decrypt_fields_detailed(entity, self.allowlist(), key);
        if !outcome.is_clean() {
            tracing::debug!(
                entity_type = self.entity_type(),
                fallbacks = outcome.fallbacks.len(),
                "entity decrypted with plaintext fallbacks"
            );
        }
        outcome
    }

    /// Encrypt a batch concurrently
    ///
    /// Any failure blocks the whole batch so no sensitive plaintext is
    /// handed on for writing.
    fn encrypt_entities(
        &self,
        entities: &[Record],
        key: &EncryptionKey,
    ) -> FieldSealResult<Vec<Record>> {
        entities
            .par_iter()
            .map(|entity| self.encrypt_entity(entity, key))
            .collect()
    }

    /// Decrypt a batch concurrently; items never affect each other
    fn decrypt_entities(&self, entities: &[Record], key: &EncryptionKey) -> Vec<Record> {
        entities
            .par_iter()
            .map(|entity| self.decrypt_entity(entity, key))
            .collect()
    }

    /// Build an entity from JSON, typing the declared date fields
    ///
    /// Date fields that don't parse stay text; they are never allowlisted so
    /// they are still never encrypted.
    fn ingest_json(&self, json: serde_json::Value) -> FieldSealResult<Record> {
        let mut record = Record::from_json(json).ok_or_else(|| {
            FieldSealError::Validation(format!(
                "{} must be a JSON object",
                self.entity_type()
            ))
        })?;
        for path in self.date_fields() {
            lift_dates(&mut record, path);
        }
        Ok(record)
    }
}

/// Turn text at `path` into a date where it parses
///
/// Path segments step into nested objects and into every object of a list.
fn lift_dates(record: &mut Record, path: &str) {
    let (head, rest) = match path.split_once('.') {
        Some((head, rest)) => (head, Some(rest)),
        None => (path, None),
    };
    if let Some(value) = record.get_mut(head) {
        lift_value(value, rest);
    }
}

fn lift_value(value: &mut Value, rest: Option<&str>) {
    match value {
        Value::List(items) => {
            for item in items.iter_mut() {
                lift_value(item, rest);
            }
        }
        Value::Object(inner) => {
            if let Some(rest) = rest {
                lift_dates(inner, rest);
            }
        }
        Value::Text(text) if rest.is_none() => {
            if let Some(date) = DateValue::parse(text) {
                *value = Value::Date(date);
            }
        }
        _ => {}
    }
}
