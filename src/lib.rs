//! fieldseal - client-side field-level encryption for personal records
//!
//! Protects the sensitive free-text fields of finance and fitness records
//! with a per-user AES-256-GCM key while leaving amounts, dates, IDs and
//! categories in plaintext for querying and aggregation.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Configuration and path management
//! - `error`: Custom error types
//! - `crypto`: Key generation and the value cipher
//! - `models`: Record values, user IDs and key records
//! - `storage`: Key store backends
//! - `engine`: Allowlist-driven structural encryption
//! - `adapters`: Per-entity-type field declarations
//! - `services`: Key management and the user-facing facade
//! - `cli`: Command handlers for the binary
//!
//! # Example
//!
//! ```rust,ignore
//! use fieldseal::config::{paths::FieldSealPaths, settings::Settings};
//! use fieldseal::models::{Record, UserId};
//! use fieldseal::services::SealService;
//!
//! let paths = FieldSealPaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! let service = SealService::from_settings(&paths, &settings)?;
//!
//! let user = UserId::new("alice")?;
//! let entity = Record::new().with("description", "Grocery Store").with("amount", -42.5);
//! let stored = service.encrypt_for_user(&user, "transaction", &entity)?;
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod crypto;
pub mod engine;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;
pub mod storage;

pub use error::{FieldSealError, FieldSealResult};
