//! Catalog service error types.

use thiserror::Error;

use food_delivery_core::{AccessDenied, ProductId, RestaurantId, ValidationErrors};

use crate::db::RepositoryError;

/// Errors that can occur during catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("restaurant {0} not found")]
    RestaurantNotFound(RestaurantId),

    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    /// The request failed field validation.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// Caller does not manage the product's restaurant.
    #[error(transparent)]
    Forbidden(#[from] AccessDenied),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}
