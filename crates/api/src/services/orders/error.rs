//! Order service error types.

use thiserror::Error;

use food_delivery_core::{AccessDenied, OrderId, RestaurantId, TransitionError, ValidationErrors};

use crate::db::RepositoryError;

/// Errors that can occur during order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The request failed field validation.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// Order does not exist.
    #[error("order {0} not found")]
    NotFound(OrderId),

    /// Restaurant does not exist.
    #[error("restaurant {0} not found")]
    RestaurantNotFound(RestaurantId),

    /// Caller may not act on this order or restaurant.
    #[error(transparent)]
    Forbidden(#[from] AccessDenied),

    /// The order is not in a state that allows the transition.
    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// Another request changed the order first.
    #[error("order {0} was modified concurrently")]
    Conflict(OrderId),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}
