//! Marketplace CLI - seeding and inspection tools.
//!
//! # Usage
//!
//! ```bash
//! # Load FAQ, catalog and order fixtures
//! mp-cli seed fixtures/catalog.yaml
//!
//! # Check a fixture file without writing anything
//! mp-cli seed fixtures/catalog.yaml --validate-only
//!
//! # Show a user's address book, default first
//! mp-cli addresses <uid> --search springfield
//!
//! # Show a user's wallet balance and recent ledger entries
//! mp-cli wallet <uid> --limit 10
//! ```
//!
//! The backend is selected like the server's: `MARKETPLACE_BACKEND` plus the
//! `FIREBASE_*` variables, loaded from `.env` when present.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "mp-cli")]
#[command(author, version, about = "Marketplace CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load fixtures (FAQ categories, FAQs, products, orders) from YAML
    Seed {
        /// Path to the YAML fixture file
        file: String,

        /// Only parse and validate the file
        #[arg(long)]
        validate_only: bool,
    },
    /// List a user's saved addresses
    Addresses {
        /// User ID (auth UID)
        user_id: String,

        /// Case-insensitive filter over name, lines, city, state, postal code and country
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Show a user's wallet
    Wallet {
        /// User ID (auth UID)
        user_id: String,

        /// Number of ledger entries to show
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    match cli.command {
        Commands::Seed {
            file,
            validate_only,
        } => commands::seed::run(&file, validate_only).await,
        Commands::Addresses { user_id, search } => {
            commands::inspect::addresses(&user_id, search).await
        }
        Commands::Wallet { user_id, limit } => commands::inspect::wallet(&user_id, limit).await,
    }
}
