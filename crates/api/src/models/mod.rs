//! Domain models for the API.
//!
//! These are the shapes repositories return. HTTP bodies are built from them
//! in `routes`, so a model can change without breaking the wire format.

pub mod catalog;
pub mod order;
pub mod user;

pub use catalog::{NewProduct, NewRestaurant, PopularProduct, Product, Restaurant, RestaurantDetail};
pub use order::{CustomerSummary, LineItem, NewOrder, Order, OrderDetail, RestaurantSummary};
pub use user::{NewUser, User};
