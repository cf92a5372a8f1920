//! Product bridge CLI - database migrations and catalog inspection.
//!
//! # Usage
//!
//! ```bash
//! # Run bridge database migrations
//! pb-cli migrate
//!
//! # Print a mirrored product
//! pb-cli product show 42
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `product show` - Print a mirrored product with variations and images

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "pb-cli")]
#[command(author, version, about = "Product bridge CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Inspect mirrored products
    Product {
        #[command(subcommand)]
        action: ProductAction,
    },
}

#[derive(Subcommand)]
enum ProductAction {
    /// Print a mirrored product by local ID
    Show {
        /// Local product ID
        id: i32,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
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
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Product { action } => match action {
            ProductAction::Show { id } => commands::product::show(id).await?,
        },
    }
    Ok(())
}
