//! User management commands.
//!
//! # Usage
//!
//! ```bash
//! fd-cli user create -e carl@example.com -n "Carl" -r customer
//! ```
//!
//! The generated API token is printed once. It expires after
//! `FOOD_TOKEN_TTL_DAYS` days (default 30).

use chrono::Utc;

use food_delivery_api::db::RepositoryError;
use food_delivery_api::models::{NewUser, User};
use food_delivery_core::Role;

use super::{CommandError, connect, generate_token};

/// Create a user holding a fresh API token.
///
/// # Errors
///
/// Returns an error if the email is malformed or already registered, or the
/// database is unreachable.
pub async fn create(email: &str, first_name: &str, role: Role) -> Result<User, CommandError> {
    // Basic email validation
    if !email.contains('@') || !email.contains('.') {
        return Err(CommandError::InvalidEmail(email.to_owned()));
    }

    let (config, store) = connect().await?;

    let token = generate_token();
    let expires = Utc::now() + config.token_ttl();

    tracing::info!("Creating user: {} ({})", email, role);
    let user = store
        .create_user(&NewUser {
            email: email.to_owned(),
            first_name: first_name.to_owned(),
            role,
            token: token.clone(),
            token_expiration: Some(expires),
        })
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => CommandError::UserExists(email.to_owned()),
            other => CommandError::Repository(other),
        })?;

    tracing::info!(
        "User created successfully! ID: {}, Email: {}, Role: {}, token expires {}",
        user.id,
        user.email,
        user.role,
        expires.format("%Y-%m-%d")
    );

    #[allow(clippy::print_stdout)]
    {
        println!("{token}");
    }

    Ok(user)
}
