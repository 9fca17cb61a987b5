//! Litus CLI - Schema evolution, seed data, and admin account tools.
//!
//! # Usage
//!
//! ```bash
//! # Apply migrations and add any missing optional columns
//! litus-cli migrate
//!
//! # Load the demo catalog (5 categories, 12 products); safe to re-run
//! litus-cli seed
//!
//! # Create an admin account
//! litus-cli admin create -u admin -p 'a-long-password'
//!
//! # Grant or revoke admin on an existing account
//! litus-cli admin promote -u deniz
//! litus-cli admin promote -u deniz --revoke
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "litus-cli")]
#[command(author, version, about = "Litus CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run migrations and evolve the schema
    Migrate,
    /// Seed the demo catalog
    Seed,
    /// Manage admin accounts
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new admin account
    Create {
        /// Login name
        #[arg(short, long)]
        username: String,

        /// Password (at least 8 characters)
        #[arg(short, long, env = "LITUS_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Set the admin flag on an existing account
    Promote {
        /// Login name
        #[arg(short, long)]
        username: String,

        /// Remove the admin flag instead
        #[arg(long)]
        revoke: bool,
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

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed => commands::seed::run().await?,
        Commands::Admin { action } => match action {
            AdminAction::Create { username, password } => {
                commands::admin::create(&username, &password).await?;
            }
            AdminAction::Promote { username, revoke } => {
                commands::admin::promote(&username, !revoke).await?;
            }
        },
    }
    Ok(())
}
