//! Restaurants and products.

use food_delivery_core::{Money, ProductId, RestaurantId, UserId};

/// A restaurant.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Restaurant {
    pub id: RestaurantId,
    pub owner_id: UserId,
    pub name: String,
    pub description: Option<String>,
    pub address: String,
    /// Charged on orders whose subtotal does not exceed the shipping threshold.
    pub shipping_costs: Money,
    /// Mean start-to-delivery minutes, `None` until something is delivered.
    pub average_service_minutes: Option<f64>,
}

/// A product on a restaurant's menu.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
    pub restaurant_id: RestaurantId,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub available: bool,
}

/// A restaurant together with its menu.
#[derive(Debug, Clone, PartialEq)]
pub struct RestaurantDetail {
    pub restaurant: Restaurant,
    pub products: Vec<Product>,
}

/// A product ranked by how many units were ordered.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct PopularProduct {
    #[sqlx(flatten)]
    pub product: Product,
    pub total_quantity: i64,
}

/// Parameters for creating a restaurant.
#[derive(Debug, Clone)]
pub struct NewRestaurant {
    pub owner_id: UserId,
    pub name: String,
    pub description: Option<String>,
    pub address: String,
    pub shipping_costs: Money,
}

/// Parameters for creating a product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub restaurant_id: RestaurantId,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
}
