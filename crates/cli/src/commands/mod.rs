//! CLI subcommands.

pub mod migrate;
pub mod seed;
pub mod user;

use rand::Rng;
use rand::distr::Alphanumeric;
use thiserror::Error;

use food_delivery_api::config::{ApiConfig, ConfigError};
use food_delivery_api::db::{self, PgStore, RepositoryError};

/// Length of generated API tokens.
const TOKEN_LENGTH: usize = 32;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("A user already exists with email: {0}")]
    UserExists(String),
}

/// Load configuration and connect to the database.
async fn connect() -> Result<(ApiConfig, PgStore), CommandError> {
    let config = ApiConfig::from_env()?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&config.database_url).await?;
    Ok((config, PgStore::new(pool)))
}

/// A random alphanumeric API token.
fn generate_token() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_token() {
        let token = generate_token();
        assert_eq!(token.len(), TOKEN_LENGTH);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(token, generate_token());
    }
}
