//! Key CLI commands
//!
//! Create, inspect and delete per-user keys.

use clap::Subcommand;

use crate::error::FieldSealResult;
use crate::models::UserId;
use crate::services::KeyManager;

/// Key management commands
#[derive(Subcommand)]
pub enum KeyCommands {
    /// Create the user's key if it doesn't exist yet
    Init {
        /// User ID
        user: String,
    },

    /// Show whether the user has a key
    Status {
        /// User ID
        user: String,
    },

    /// Delete the user's key; data encrypted under it becomes unreadable
    #[command(alias = "delete")]
    Forget {
        /// User ID
        user: String,
        /// Confirm deletion
        #[arg(long)]
        yes: bool,
    },
}

/// Handle key commands
pub fn handle_key_command(keys: &KeyManager, cmd: KeyCommands) -> FieldSealResult<()> {
    match cmd {
        KeyCommands::Init { user } => init_key(keys, &UserId::new(user)?),
        KeyCommands::Status { user } => show_status(keys, &UserId::new(user)?),
        KeyCommands::Forget { user, yes } => forget_key(keys, &UserId::new(user)?, yes),
    }
}

fn init_key(keys: &KeyManager, user_id: &UserId) -> FieldSealResult<()> {
    let existed = keys.key_record(user_id)?.is_some();
    keys.ensure_user_has_key(user_id)?;

    if existed {
        println!("User '{}' already has a key.", user_id);
    } else {
        println!("Created key for user '{}'.", user_id);
    }
    show_status(keys, user_id)
}

fn show_status(keys: &KeyManager, user_id: &UserId) -> FieldSealResult<()> {
    match keys.key_record(user_id)? {
        Some(record) => {
            println!("User:      {}", record.user_id);
            println!("Key ID:    {}", record.key_id);
            println!("Algorithm: {}", record.algorithm);
            println!("Created:   {}", record.created_at.format("%Y-%m-%d %H:%M:%S UTC"));
        }
        None => {
            println!("User '{}' has no key.", user_id);
            println!("Run 'fieldseal key init {}' to create one.", user_id);
        }
    }
    Ok(())
}

fn forget_key(keys: &KeyManager, user_id: &UserId, confirmed: bool) -> FieldSealResult<()> {
    if !confirmed {
        println!("Deleting a key makes everything encrypted under it unreadable.");
        println!("Re-run with --yes to delete the key for '{}'.", user_id);
        return Ok(());
    }

    if keys.delete_key(user_id)? {
        println!("Deleted key for user '{}'.", user_id);
    } else {
        println!("User '{}' has no key.", user_id);
    }
    Ok(())
}
