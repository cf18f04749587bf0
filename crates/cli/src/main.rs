//! Food delivery CLI - database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! fd-cli migrate
//!
//! # Load demo restaurants, products and users
//! fd-cli seed
//!
//! # Create a user and print its API token
//! fd-cli user create -e owner@example.com -n "Olga" -r owner
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed` - Insert demo data
//! - `user create` - Create a user with a fresh API token

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

use food_delivery_core::Role;

mod commands;

#[derive(Parser)]
#[command(name = "fd-cli")]
#[command(author, version, about = "Food delivery CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Insert demo users, restaurants and products
    Seed,
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new user and print its API token
    Create {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// First name
        #[arg(short, long)]
        name: String,

        /// Role (`customer` or `owner`)
        #[arg(short, long, default_value = "customer")]
        role: Role,
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
        Commands::User { action } => match action {
            UserAction::Create { email, name, role } => {
                commands::user::create(&email, &name, role).await?;
            }
        },
    }
    Ok(())
}
