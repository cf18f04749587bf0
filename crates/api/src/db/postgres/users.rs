//! User queries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{PgStore, map_constraint};
use crate::db::{RepositoryError, UserRepository};
use crate::models::{NewUser, User};

#[async_trait]
impl UserRepository for PgStore {
    async fn find_by_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(
            r"
            SELECT id, email, first_name, role
            FROM users
            WHERE token = $1
              AND (token_expiration IS NULL OR token_expiration > $2)
            ",
        )
        .bind(token)
        .bind(now)
        .fetch_optional(self.pool())
        .await?;

        Ok(user)
    }
}

impl PgStore {
    /// Create a user holding an API token.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email or token already exists.
    pub async fn create_user(&self, user: &NewUser) -> Result<User, RepositoryError> {
        sqlx::query_as::<_, User>(
            r"
            INSERT INTO users (email, first_name, role, token, token_expiration)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, email, first_name, role
            ",
        )
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(user.role)
        .bind(&user.token)
        .bind(user.token_expiration)
        .fetch_one(self.pool())
        .await
        .map_err(map_constraint)
    }
}
