//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the service layer.

pub mod key;
pub mod seal;

pub use key::{handle_key_command, KeyCommands};
pub use seal::{handle_decrypt_command, handle_encrypt_command, SealArgs};
