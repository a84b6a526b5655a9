//! Bodegón CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! bodegon-cli migrate
//!
//! # Create a staff user
//! bodegon-cli user create-superuser -e admin@bodegonasusalud.com -p 's3cret!' -n "Admin"
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `user create-superuser` - Create staff users

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "bodegon-cli")]
#[command(author, version, about = "Bodegón API management tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a staff user
    CreateSuperuser {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Password (at least 5 characters)
        #[arg(short, long)]
        password: String,

        /// Display name
        #[arg(short, long, default_value = "")]
        name: String,
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
        Commands::User { action } => match action {
            UserAction::CreateSuperuser {
                email,
                password,
                name,
            } => {
                commands::user::create_superuser(&email, &password, &name).await?;
            }
        },
    }
    Ok(())
}
