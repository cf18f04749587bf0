//! Orders and line items.

use chrono::{DateTime, Utc};

use food_delivery_core::pricing::{PriceBreakdown, PricedLine};
use food_delivery_core::{
    Money, OrderId, OrderStatus, OrderTimeline, ProductId, RestaurantId, UserId,
};

/// A product within an order, priced when the order was placed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItem {
    pub product_id: ProductId,
    /// Product name, as currently listed.
    pub name: String,
    pub quantity: u32,
    /// Captured at creation; never follows later price changes.
    pub unit_price: Money,
}

/// An order with its line items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub id: OrderId,
    pub customer_id: UserId,
    pub restaurant_id: RestaurantId,
    pub address: String,
    /// Total charged, shipping included.
    pub price: Money,
    pub shipping_costs: Money,
    pub created_at: DateTime<Utc>,
    pub timeline: OrderTimeline,
    pub lines: Vec<LineItem>,
}

impl Order {
    #[must_use]
    pub const fn status(&self) -> OrderStatus {
        self.timeline.status()
    }
}

/// Restaurant fields shown on an order's detail.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct RestaurantSummary {
    pub id: RestaurantId,
    pub name: String,
    pub address: String,
    pub shipping_costs: Money,
    pub average_service_minutes: Option<f64>,
}

/// Customer fields shown on an order's detail.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct CustomerSummary {
    pub id: UserId,
    pub first_name: String,
    pub email: String,
}

/// An order with the restaurant and customer it links.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderDetail {
    pub order: Order,
    pub restaurant: RestaurantSummary,
    pub customer: CustomerSummary,
}

/// A validated, priced order ready to be persisted.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer_id: UserId,
    pub restaurant_id: RestaurantId,
    pub address: String,
    pub lines: Vec<PricedLine>,
    pub price: PriceBreakdown,
    pub placed_at: DateTime<Utc>,
}
