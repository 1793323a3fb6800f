//! Data model for fieldseal
//!
//! Entity snapshots are generic records so that fields the engine does not
//! know about pass through untouched.

pub mod ids;
pub mod key_record;
pub mod value;

pub use ids::UserId;
pub use key_record::KeyRecord;
pub use value::{DateKind, DateValue, Record, Value};
