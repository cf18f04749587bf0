//! Business logic services for the API.
//!
//! # Services
//!
//! - `orders` - order placement, visibility, lifecycle transitions and analytics
//! - `catalog` - restaurants, menus, popular products and price updates
//!
//! Services borrow a [`Store`](crate::db::Store) and take the caller's
//! [`Principal`](food_delivery_core::Principal) explicitly, so every
//! authorization decision happens here rather than in handlers.

pub mod catalog;
pub mod orders;

pub use catalog::{CatalogError, CatalogService, UpdateProductPrice};
pub use orders::{OrderError, OrderLineRequest, OrderService, PlaceOrder};
