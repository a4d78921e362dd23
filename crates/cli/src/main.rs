//! Shopseo CLI - Database migrations and maintenance tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! shopseo migrate
//!
//! # Create a user and print their API token
//! shopseo users create -e owner@example.com
//!
//! # Upgrade stored audits to the current payload schema
//! shopseo audits upgrade
//!
//! # Apply every pending optimization for a store
//! shopseo optimize bulk --store 4 --user 1
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use shopseo_core::{StoreId, UserId};

mod commands;

#[derive(Parser)]
#[command(name = "shopseo")]
#[command(author, version, about = "Shopseo CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage users
    Users {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Maintain stored website audits
    Audits {
        #[command(subcommand)]
        action: AuditAction,
    },
    /// Apply optimizations from the shell
    Optimize {
        #[command(subcommand)]
        action: OptimizeAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a user and print a new API token
    Create {
        /// Email address
        #[arg(short, long)]
        email: String,
    },
}

#[derive(Subcommand)]
enum AuditAction {
    /// Rewrite audits stored with an older payload schema
    Upgrade,
}

#[derive(Subcommand)]
enum OptimizeAction {
    /// Apply every pending optimization of every analyzed product
    Bulk {
        /// Store ID
        #[arg(short, long)]
        store: i32,

        /// ID of the user who owns the store
        #[arg(short, long)]
        user: i32,
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
        Commands::Users { action } => match action {
            UserAction::Create { email } => commands::users::create(&email).await?,
        },
        Commands::Audits { action } => match action {
            AuditAction::Upgrade => commands::audits::upgrade().await?,
        },
        Commands::Optimize { action } => match action {
            OptimizeAction::Bulk { store, user } => {
                commands::optimize::bulk(UserId::new(user), StoreId::new(store)).await?;
            }
        },
    }
    Ok(())
}
