//! Platform users.

use chrono::{DateTime, Utc};

use food_delivery_core::{Principal, Role, UserId};

/// A customer or restaurant owner.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub first_name: String,
    pub role: Role,
}

impl User {
    /// The identity used for authorization checks.
    #[must_use]
    pub const fn principal(&self) -> Principal {
        Principal::new(self.id, self.role)
    }
}

/// Parameters for creating a user with an API token.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub first_name: String,
    pub role: Role,
    pub token: String,
    pub token_expiration: Option<DateTime<Utc>>,
}
