//! Encrypt/decrypt CLI commands
//!
//! Reads a JSON entity (object) or batch (array) from a file or stdin and
//! writes the result to stdout as JSON.

use std::io::Read;
use std::path::PathBuf;

use clap::Args;

use crate::adapters::EntityAdapter;
use crate::error::{FieldSealError, FieldSealResult};
use crate::models::{Record, UserId};
use crate::services::SealService;

/// Arguments shared by `encrypt` and `decrypt`
#[derive(Args)]
pub struct SealArgs {
    /// User whose key is used
    #[arg(short, long, env = "FIELDSEAL_USER")]
    pub user: String,

    /// Entity type (see `fieldseal entities`)
    #[arg(short, long)]
    pub entity: String,

    /// Input file; reads stdin when omitted or `-`
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Pretty-print the output
    #[arg(long)]
    pub pretty: bool,
}

#[derive(Clone, Copy)]
enum Direction {
    Encrypt,
    Decrypt,
}

/// Handle the encrypt command
pub fn handle_encrypt_command(service: &SealService, args: SealArgs) -> FieldSealResult<()> {
    run(service, args, Direction::Encrypt)
}

/// Handle the decrypt command
pub fn handle_decrypt_command(service: &SealService, args: SealArgs) -> FieldSealResult<()> {
    run(service, args, Direction::Decrypt)
}

fn run(service: &SealService, args: SealArgs, direction: Direction) -> FieldSealResult<()> {
    let user_id = UserId::new(args.user)?;
    let adapter = service.registry().get(&args.entity)?;
    let input = read_input(args.input.as_ref())?;

    let output = match input {
        serde_json::Value::Array(items) => {
            let entities = items
                .into_iter()
                .map(|item| adapter.ingest_json(item))
                .collect::<FieldSealResult<Vec<Record>>>()?;
            let results = match direction {
                Direction::Encrypt => {
                    service.encrypt_batch_for_user(&user_id, &args.entity, &entities)?
                }
                Direction::Decrypt => {
                    service.decrypt_batch_for_user(&user_id, &args.entity, &entities)?
                }
            };
            serde_json::Value::Array(results.iter().map(Record::to_json).collect())
        }
        other => {
            let entity = adapter.ingest_json(other)?;
            let result = match direction {
                Direction::Encrypt => service.encrypt_for_user(&user_id, &args.entity, &entity)?,
                Direction::Decrypt => service.decrypt_for_user(&user_id, &args.entity, &entity)?,
            };
            result.to_json()
        }
    };

    let rendered = if args.pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };
    println!("{}", rendered);
    Ok(())
}

fn read_input(path: Option<&PathBuf>) -> FieldSealResult<serde_json::Value> {
    let contents = match path {
        Some(path) if path.as_os_str() != "-" => std::fs::read_to_string(path).map_err(|e| {
            FieldSealError::Io(format!("Failed to read {}: {}", path.display(), e))
        })?,
        _ => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };

    serde_json::from_str(&contents)
        .map_err(|e| FieldSealError::Validation(format!("Input is not valid JSON: {}", e)))
}
