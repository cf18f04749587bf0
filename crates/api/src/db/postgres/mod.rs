//! `PostgreSQL` implementation of the repositories.
//!
//! Queries are checked at runtime with `sqlx::query_as::<_, T>`, so the
//! crate compiles without a live database. Optional filters are bound as
//! nullable parameters (`$n IS NULL OR ...`).

mod catalog;
mod orders;
mod users;

use async_trait::async_trait;
use sqlx::PgPool;

use super::{RepositoryError, Store};

/// Repository backed by a `PostgreSQL` pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wrap an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// SQLSTATE for a value that does not fit its column.
const NUMERIC_VALUE_OUT_OF_RANGE: &str = "22003";

/// Map constraint violations to [`RepositoryError::Conflict`].
fn map_constraint(err: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.is_unique_violation() {
            return RepositoryError::Conflict("duplicate value".to_owned());
        }
        if db_err.is_foreign_key_violation() {
            return RepositoryError::Conflict("referenced entity does not exist".to_owned());
        }
        if db_err.is_check_violation() {
            return RepositoryError::Conflict(db_err.message().to_owned());
        }
        if db_err.code().as_deref() == Some(NUMERIC_VALUE_OUT_OF_RANGE) {
            return RepositoryError::Conflict("value out of range".to_owned());
        }
    }
    RepositoryError::Database(err)
}
