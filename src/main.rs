use anyhow::Result;
use clap::{Parser, Subcommand};

use fieldseal::adapters::{AdapterRegistry, EntityAdapter};
use fieldseal::cli::{handle_decrypt_command, handle_encrypt_command, handle_key_command, SealArgs};
use fieldseal::config::{paths::FieldSealPaths, settings::Settings};
use fieldseal::logging::init_logging;
use fieldseal::services::SealService;

#[derive(Parser)]
#[command(
    name = "fieldseal",
    author = "Kaylee Beyene",
    version,
    about = "Field-level encryption for personal records",
    long_about = "fieldseal encrypts the sensitive text fields of finance and fitness \
                  records with a per-user AES-256-GCM key, leaving amounts, dates and \
                  IDs in plaintext so they can still be queried."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Key management commands
    #[command(subcommand)]
    Key(fieldseal::cli::KeyCommands),

    /// Encrypt an entity or array of entities
    #[command(alias = "seal")]
    Encrypt(SealArgs),

    /// Decrypt an entity or array of entities
    #[command(alias = "unseal")]
    Decrypt(SealArgs),

    /// List entity types and their sensitive fields
    Entities,

    /// Show current configuration and paths
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize paths and settings
    let paths = FieldSealPaths::new()?;
    let settings = Settings::load_or_create(&paths)?;
    init_logging(&settings);

    match cli.command {
        Some(Commands::Key(cmd)) => {
            let service = SealService::from_settings(&paths, &settings)?;
            handle_key_command(service.keys(), cmd)?;
        }
        Some(Commands::Encrypt(args)) => {
            let service = SealService::from_settings(&paths, &settings)?;
            handle_encrypt_command(&service, args)?;
        }
        Some(Commands::Decrypt(args)) => {
            let service = SealService::from_settings(&paths, &settings)?;
            handle_decrypt_command(&service, args)?;
        }
        Some(Commands::Entities) => {
            let registry = AdapterRegistry::standard(&settings);
            for adapter in registry.iter() {
                println!("{}", adapter.entity_type());
                for path in adapter.allowlist().paths() {
                    println!("  - {}", path);
                }
            }
        }
        Some(Commands::Config) => {
            println!("fieldseal Configuration");
            println!("=======================");
            println!("Base directory: {}", paths.base_dir().display());
            println!("Settings file:  {}", paths.settings_file().display());
            println!("Key file:       {}", paths.keys_file().display());
            println!();
            println!("Settings:");
            println!("  Key store:            {:?}", settings.key_store);
            println!("  Reference min length: {}", settings.reference_min_length);
            println!("  Log filter:           {}", settings.log_filter);
        }
        None => {
            println!("fieldseal - Field-level encryption for personal records");
            println!();
            println!("Run 'fieldseal --help' for usage information.");
        }
    }

    Ok(())
}
