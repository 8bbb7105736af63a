//! WENDY WOO CLI - database migrations and catalog seeding.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront and session-store migrations
//! ww-cli migrate
//!
//! # Load categories and products from YAML
//! ww-cli seed catalog --file catalog.yaml
//!
//! # Replace the whole catalog
//! ww-cli seed catalog --file catalog.yaml --clear
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "ww-cli")]
#[command(author, version, about = "WENDY WOO CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run storefront database and session-store migrations
    Migrate,
    /// Seed the database
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Load categories and products from a YAML file
    Catalog {
        /// Path to the catalog YAML file
        #[arg(short, long)]
        file: PathBuf,

        /// Delete the existing catalog (and its reviews) first
        #[arg(long)]
        clear: bool,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::storefront().await?,
        Commands::Seed { target } => match target {
            SeedTarget::Catalog { file, clear } => {
                commands::seed::catalog(&file, clear).await?;
            }
        },
    }
    Ok(())
}
