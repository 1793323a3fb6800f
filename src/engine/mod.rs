//! Structural encryption engine
//!
//! Applies the value cipher across heterogeneous records, guided by a
//! per-shape allowlist of sensitive fields.

pub mod allowlist;
pub mod structural;

pub use allowlist::{FieldAllowlist, FieldRule};
pub use structural::{decrypt_fields, decrypt_fields_detailed, encrypt_fields, DecryptOutcome};
