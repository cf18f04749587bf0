//! Persistence for the food delivery API.
//!
//! # Repositories
//!
//! Storage is reached only through the traits in this module:
//!
//! - [`OrderRepository`] - order creation, lookup, filtering, lifecycle and analytics
//! - [`CatalogRepository`] - restaurants and products
//! - [`UserRepository`] - identity resolution from API tokens
//!
//! [`Store`] bundles the three behind one trait object so handlers can share a
//! single `Arc<dyn Store>`. Two implementations exist:
//!
//! - [`PgStore`] - `PostgreSQL` via sqlx (production)
//! - [`MemoryStore`] - process-local maps (tests and local demos)
//!
//! # Atomicity
//!
//! [`OrderRepository::create_order`] writes the order header and every line
//! item in one transaction. [`OrderRepository::record_transition`] is a single
//! conditional update that only succeeds while the stage is still unset.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p food-delivery-cli -- migrate
//! ```

pub mod memory;
pub mod postgres;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use food_delivery_core::analytics::{AnalyticsWindow, RestaurantAnalytics};
use food_delivery_core::filter::OrderFilter;
use food_delivery_core::{Money, OrderId, OrderOwnership, ProductId, RestaurantId, Transition, UserId};

use crate::models::{Order, OrderDetail, NewOrder, PopularProduct, Product, Restaurant, User};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email, missing foreign key).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Orders and their lifecycle.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Persist an order and all its line items atomically.
    async fn create_order(&self, order: NewOrder) -> Result<OrderId, RepositoryError>;

    /// An order with its line items.
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, RepositoryError>;

    /// Customer and restaurant owner of an order.
    async fn get_order_ownership(
        &self,
        id: OrderId,
    ) -> Result<Option<OrderOwnership>, RepositoryError>;

    /// An order with restaurant and customer summaries.
    async fn get_order_detail(&self, id: OrderId) -> Result<Option<OrderDetail>, RepositoryError>;

    /// Every order a customer placed, newest first.
    async fn list_customer_orders(&self, customer: UserId) -> Result<Vec<Order>, RepositoryError>;

    /// A restaurant's orders passing `filter`, newest first.
    async fn list_restaurant_orders(
        &self,
        restaurant: RestaurantId,
        filter: &OrderFilter,
    ) -> Result<Vec<Order>, RepositoryError>;

    /// Stamp the stage for `transition` at `at`.
    ///
    /// Returns `false` without writing when the stage is already set, the
    /// previous stage is missing, or `at` precedes the previous stage.
    /// Delivering recomputes the restaurant's average service time in the
    /// same write.
    async fn record_transition(
        &self,
        id: OrderId,
        transition: Transition,
        at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError>;

    /// Dashboard counters for a restaurant.
    async fn restaurant_analytics(
        &self,
        restaurant: RestaurantId,
        window: AnalyticsWindow,
    ) -> Result<RestaurantAnalytics, RepositoryError>;
}

/// Restaurants and products.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn get_restaurant(&self, id: RestaurantId) -> Result<Option<Restaurant>, RepositoryError>;

    /// All restaurants by name.
    async fn list_restaurants(&self) -> Result<Vec<Restaurant>, RepositoryError>;

    /// Restaurants owned by `owner`, by name.
    async fn list_owner_restaurants(&self, owner: UserId)
    -> Result<Vec<Restaurant>, RepositoryError>;

    /// The products among `ids` that exist. Order is unspecified.
    async fn get_products(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError>;

    /// A restaurant's menu by name.
    async fn list_restaurant_products(
        &self,
        restaurant: RestaurantId,
    ) -> Result<Vec<Product>, RepositoryError>;

    /// The most ordered products by total quantity.
    async fn popular_products(&self, limit: i64) -> Result<Vec<PopularProduct>, RepositoryError>;

    /// Change a product's catalog price. Existing order lines are untouched.
    async fn update_product_price(
        &self,
        id: ProductId,
        price: Money,
    ) -> Result<Option<Product>, RepositoryError>;
}

/// User lookup.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// The user holding `token`, if it has not expired at `now`.
    async fn find_by_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, RepositoryError>;
}

/// Every repository behind one object.
#[async_trait]
pub trait Store: OrderRepository + CatalogRepository + UserRepository {
    /// Check that the backing storage is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
