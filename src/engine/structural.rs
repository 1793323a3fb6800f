//! Selective encryption over record graphs
//!
//! Walks a record alongside its allowlist and applies the value cipher only
//! to text leaves the allowlist reaches. Everything else is copied as is:
//! numbers, booleans, nulls, dates, and any field the allowlist doesn't name.
//!
//! Encrypting is fail-closed: the first failure aborts the whole record.
//! Decrypting is fail-open per field: a value that doesn't decrypt is kept as
//! stored, on the assumption it predates encryption.

use std::convert::Infallible;

use crate::crypto::{decrypt_value, encrypt_value, EncryptionKey};
use crate::error::FieldSealResult;
use crate::models::{Record, Value};

use super::allowlist::{FieldAllowlist, FieldRule};

/// Result of decrypting one record
#[derive(Debug, Clone, PartialEq)]
pub struct DecryptOutcome {
    /// The decrypted record
    pub record: Record,
    /// Paths of fields left as stored because they did not decrypt
    pub fallbacks: Vec<String>,
}

impl DecryptOutcome {
    /// Check if every reached field decrypted
    pub fn is_clean(&self) -> bool {
        self.fallbacks.is_empty()
    }
}

/// Encrypt the allowlisted fields of a record
pub fn encrypt_fields(
    record: &Record,
    allowlist: &FieldAllowlist,
    key: &EncryptionKey,
) -> FieldSealResult<Record> {
    let mut walker = Walker::new(|text: &str, _path: &str| encrypt_value(text, key));
    walker.record(record, allowlist, "")
}

/// Decrypt the allowlisted fields of a record
pub fn decrypt_fields(record: &Record, allowlist: &FieldAllowlist, key: &EncryptionKey) -> Record {
    decrypt_fields_detailed(record, allowlist, key).record
}

/// Decrypt the allowlisted fields and report which ones fell back
pub fn decrypt_fields_detailed(
    record: &Record,
    allowlist: &FieldAllowlist,
    key: &EncryptionKey,
) -> DecryptOutcome {
    let mut fallbacks = Vec::new();
    let mut walker = Walker::new(|text: &str, path: &str| -> Result<String, Infallible> {
        match decrypt_value(text, key) {
            Ok(plain) => Ok(plain),
            Err(e) => {
                tracing::warn!(
                    field = %path,
                    error = %e,
                    "field did not decrypt; keeping stored value"
                );
                fallbacks.push(path.to_string());
                Ok(text.to_string())
            }
        }
    });
    let record = match walker.record(record, allowlist, "") {
        Ok(record) => record,
        Err(never) => match never {},
    };
    DecryptOutcome { record, fallbacks }
}

/// Rebuilds a record, passing each reached text leaf and its path through `cipher`
struct Walker<F> {
    cipher: F,
}

impl<F, E> Walker<F>
where
    F: FnMut(&str, &str) -> Result<String, E>,
{
    fn new(cipher: F) -> Self {
        Self { cipher }
    }

    fn record(
        &mut self,
        record: &Record,
        allowlist: &FieldAllowlist,
        prefix: &str,
    ) -> Result<Record, E> {
        let mut out = Record::new();
        for (name, value) in record.iter() {
            let next = match allowlist.get(name) {
                Some(rule) => {
                    let path = if prefix.is_empty() {
                        name.to_string()
                    } else {
                        format!("{}.{}", prefix, name)
                    };
                    self.value(value, rule, &path)?
                }
                None => value.clone(),
            };
            out.insert(name, next);
        }
        Ok(out)
    }

    fn value(&mut self, value: &Value, rule: &FieldRule, path: &str) -> Result<Value, E> {
        match (value, rule) {
            (Value::Text(text), FieldRule::Text) => (self.cipher)(text, path).map(Value::Text),
            (Value::Text(text), FieldRule::TextMinLength(min_len)) => {
                // Envelopes are always longer than their plaintext, so the
                // same threshold selects the same fields in both directions
                if text.chars().count() >= *min_len {
                    (self.cipher)(text, path).map(Value::Text)
                } else {
                    Ok(value.clone())
                }
            }
            (Value::Object(inner), FieldRule::Nested(allowlist)) => {
                self.record(inner, allowlist, path).map(Value::Object)
            }
            (Value::List(items), _) => {
                let mut out = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    out.push(self.value(item, rule, &format!("{}[{}]", path, i))?);
                }
                Ok(Value::List(out))
            }
            // Dates, scalars, and shapes that don't match the rule
            _ => Ok(value.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::generate_key;
    use crate::models::DateValue;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn key() -> EncryptionKey {
        generate_key().unwrap()
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_only_allowlisted_fields_change() {
        let key = key();
        let allowlist = FieldAllowlist::new().text("description");
        let record = Record::new()
            .with("description", "Grocery Store")
            .with("amount", -42.5)
            .with("date", day(2024, 1, 5))
            .with("referenceNumber", "998877");

        let encrypted = encrypt_fields(&record, &allowlist, &key).unwrap();

        let description = encrypted.get_text("description").unwrap();
        assert_ne!(description, "Grocery Store");
        assert!(description.len() > 16);
        assert_eq!(encrypted.get("amount"), record.get("amount"));
        assert_eq!(encrypted.get("date"), record.get("date"));
        assert_eq!(encrypted.get("referenceNumber"), record.get("referenceNumber"));

        let decrypted = decrypt_fields(&encrypted, &allowlist, &key);
        assert_eq!(decrypted, record);
    }

    #[test]
    fn test_dates_never_encrypted_even_if_allowlisted() {
        let key = key();
        let allowlist = FieldAllowlist::new().text("date").text("createdAt");
        let created = Utc.with_ymd_and_hms(2024, 1, 5, 10, 30, 0).unwrap();
        let record = Record::new()
            .with("date", day(2024, 1, 5))
            .with("createdAt", created);

        let encrypted = encrypt_fields(&record, &allowlist, &key).unwrap();
        assert_eq!(
            encrypted.get("date"),
            Some(&Value::Date(DateValue::from(day(2024, 1, 5))))
        );
        assert_eq!(
            encrypted.get("createdAt"),
            Some(&Value::Date(DateValue::from(created)))
        );
    }

    #[test]
    fn test_non_text_leaves_pass_through() {
        let key = key();
        let allowlist = FieldAllowlist::new()
            .text("flag")
            .text("count")
            .text("missing");
        let record = Record::new()
            .with("flag", true)
            .with("count", 3i64)
            .with("missing", Value::Null);

        let encrypted = encrypt_fields(&record, &allowlist, &key).unwrap();
        assert_eq!(encrypted, record);
    }

    #[test]
    fn test_field_order_preserved() {
        let key = key();
        let allowlist = FieldAllowlist::new().text("b");
        let record = Record::new().with("c", 1i64).with("b", "secret").with("a", 2i64);

        let encrypted = encrypt_fields(&record, &allowlist, &key).unwrap();
        let names: Vec<&str> = encrypted.iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["c", "b", "a"]);
    }

    #[test]
    fn test_list_of_text_is_encrypted_element_wise() {
        let key = key();
        let allowlist = FieldAllowlist::new().text("tags");
        let record = Record::new().with(
            "tags",
            vec![Value::from("private"), Value::from(""), Value::from(7i64)],
        );

        let encrypted = encrypt_fields(&record, &allowlist, &key).unwrap();
        let tags = encrypted.get("tags").and_then(Value::as_list).unwrap();
        assert_ne!(tags[0], Value::from("private"));
        assert_eq!(tags[1], Value::from(""));
        assert_eq!(tags[2], Value::from(7i64));

        assert_eq!(decrypt_fields(&encrypted, &allowlist, &key), record);
    }

    #[test]
    fn test_nested_lists_of_objects() {
        let key = key();
        let allowlist = FieldAllowlist::new().nested(
            "sessions",
            FieldAllowlist::new().nested("exercises", FieldAllowlist::new().text("notes")),
        );
        let exercise = Record::new()
            .with("name", "Bench press")
            .with("notes", "Left shoulder twinge")
            .with("sets", vec![Value::from(8i64), Value::from(8i64)]);
        let session = Record::new()
            .with("day", "Monday")
            .with("exercises", vec![Value::from(exercise)]);
        let record = Record::new().with("sessions", vec![Value::from(session)]);

        let encrypted = encrypt_fields(&record, &allowlist, &key).unwrap();
        let enc_session = encrypted.get("sessions").and_then(Value::as_list).unwrap()[0]
            .as_object()
            .unwrap();
        let enc_exercise = enc_session.get("exercises").and_then(Value::as_list).unwrap()[0]
            .as_object()
            .unwrap();

        assert_eq!(enc_session.get_text("day"), Some("Monday"));
        assert_eq!(enc_exercise.get_text("name"), Some("Bench press"));
        assert_ne!(enc_exercise.get_text("notes"), Some("Left shoulder twinge"));

        assert_eq!(decrypt_fields(&encrypted, &allowlist, &key), record);
    }

    #[test]
    fn test_nested_single_object() {
        let key = key();
        let allowlist =
            FieldAllowlist::new().nested("merchant", FieldAllowlist::new().text("address"));
        let merchant = Record::new()
            .with("address", "1 Main St")
            .with("mcc", "5411");
        let record = Record::new().with("merchant", merchant);

        let encrypted = encrypt_fields(&record, &allowlist, &key).unwrap();
        let enc_merchant = encrypted.get("merchant").and_then(Value::as_object).unwrap();
        assert_ne!(enc_merchant.get_text("address"), Some("1 Main St"));
        assert_eq!(enc_merchant.get_text("mcc"), Some("5411"));
    }

    #[test]
    fn test_unreached_nested_data_untouched() {
        let key = key();
        let allowlist = FieldAllowlist::new().text("name");
        let extra = Record::new().with("notes", "not declared here");
        let record = Record::new().with("name", "Rent").with("extra", extra);

        let encrypted = encrypt_fields(&record, &allowlist, &key).unwrap();
        assert_eq!(encrypted.get("extra"), record.get("extra"));
    }

    #[test]
    fn test_min_length_rule() {
        let key = key();
        let allowlist = FieldAllowlist::new().text_min_length("ref", 10);
        let short = Record::new().with("ref", "998877");
        let long = Record::new().with("ref", "DE89370400440532013000");

        assert_eq!(encrypt_fields(&short, &allowlist, &key).unwrap(), short);

        let encrypted = encrypt_fields(&long, &allowlist, &key).unwrap();
        assert_ne!(encrypted, long);
        assert_eq!(decrypt_fields(&encrypted, &allowlist, &key), long);
    }

    #[test]
    fn test_legacy_plaintext_falls_back() {
        let key = key();
        let allowlist = FieldAllowlist::new().text("description").text("notes");
        let encrypted_notes = encrypt_value("Paid in cash", &key).unwrap();
        let record = Record::new()
            .with("description", "Coffee shop")
            .with("notes", encrypted_notes);

        let outcome = decrypt_fields_detailed(&record, &allowlist, &key);
        assert_eq!(outcome.record.get_text("description"), Some("Coffee shop"));
        assert_eq!(outcome.record.get_text("notes"), Some("Paid in cash"));
        assert_eq!(outcome.fallbacks, vec!["description".to_string()]);
        assert!(!outcome.is_clean());
    }

    #[test]
    fn test_fallback_paths_include_list_index() {
        let key = key();
        let allowlist =
            FieldAllowlist::new().nested("paymentHistory", FieldAllowlist::new().text("notes"));
        let good = Record::new().with("notes", encrypt_value("late fee", &key).unwrap());
        let legacy = Record::new().with("notes", "old plaintext");
        let record = Record::new().with(
            "paymentHistory",
            vec![Value::from(good), Value::from(legacy)],
        );

        let outcome = decrypt_fields_detailed(&record, &allowlist, &key);
        assert_eq!(outcome.fallbacks, vec!["paymentHistory[1].notes".to_string()]);
    }

    #[test]
    fn test_wrong_key_keeps_ciphertext() {
        let key1 = key();
        let key2 = key();
        let allowlist = FieldAllowlist::new().text("description");
        let record = Record::new().with("description", "Pharmacy");

        let encrypted = encrypt_fields(&record, &allowlist, &key1).unwrap();
        let outcome = decrypt_fields_detailed(&encrypted, &allowlist, &key2);
        assert_eq!(outcome.record, encrypted);
        assert_eq!(outcome.fallbacks.len(), 1);
    }
}
