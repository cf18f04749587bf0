//! Integration tests for the food delivery API.
//!
//! # Running Tests
//!
//! ```bash
//! # Router-level tests against the in-memory store
//! cargo test -p food-delivery-integration-tests
//!
//! # Also run the PostgreSQL-backed tests (needs a migrated database)
//! FOOD_DATABASE_URL=postgres://... cargo test -p food-delivery-integration-tests -- --ignored
//! ```
//!
//! [`TestContext`] builds the full router over a [`MemoryStore`] seeded with
//! two customers, two owners, one restaurant per owner and a small menu.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use serde_json::Value;
use tower::ServiceExt;

use chrono::{DateTime, Utc};

use food_delivery_api::db::{MemoryStore, OrderRepository};
use food_delivery_api::models::{NewOrder, NewProduct, NewRestaurant, NewUser};
use food_delivery_api::routes;
use food_delivery_api::state::AppState;
use food_delivery_core::pricing::{PricedLine, price_order};
use food_delivery_core::{Money, OrderId, ProductId, RestaurantId, Role, Transition, UserId};

pub const CUSTOMER: &str = "customer-token";
pub const OTHER_CUSTOMER: &str = "other-customer-token";
pub const OWNER: &str = "owner-token";
pub const OTHER_OWNER: &str = "other-owner-token";

/// A router over a seeded in-memory store.
pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub app: Router,
    /// The user behind [`CUSTOMER`].
    pub customer: UserId,
    /// Owned by [`OWNER`], ships for 2.50.
    pub restaurant: RestaurantId,
    /// Owned by [`OTHER_OWNER`].
    pub other_restaurant: RestaurantId,
    /// 3.00 at `restaurant`.
    pub croquetas: ProductId,
    /// 10.00 at `restaurant`.
    pub paella: ProductId,
    /// 5.00 at `other_restaurant`.
    pub burger: ProductId,
}

impl TestContext {
    pub async fn new() -> Self {
        let store = Arc::new(MemoryStore::new());

        let customer = user(&store, "carl", Role::Customer, CUSTOMER).await;
        let _other_customer = user(&store, "cora", Role::Customer, OTHER_CUSTOMER).await;
        let owner = user(&store, "olga", Role::Owner, OWNER).await;
        let other_owner = user(&store, "oscar", Role::Owner, OTHER_OWNER).await;

        let restaurant = store
            .add_restaurant(NewRestaurant {
                owner_id: owner,
                name: "Casa Felix".to_string(),
                description: Some("Tapas".to_string()),
                address: "Calle Larios 12".to_string(),
                shipping_costs: Money::from_cents(250),
            })
            .await
            .unwrap()
            .id;
        let other_restaurant = store
            .add_restaurant(NewRestaurant {
                owner_id: other_owner,
                name: "Burger Place".to_string(),
                description: None,
                address: "Avenida 3".to_string(),
                shipping_costs: Money::from_cents(150),
            })
            .await
            .unwrap()
            .id;

        let croquetas = product(&store, restaurant, "Croquetas", 300).await;
        let paella = product(&store, restaurant, "Paella", 1000).await;
        let burger = product(&store, other_restaurant, "Burger", 500).await;

        let app = routes::app(AppState::new(store.clone()));

        Self {
            store,
            app,
            customer,
            restaurant,
            other_restaurant,
            croquetas,
            paella,
            burger,
        }
    }

    /// Send a request and decode the JSON response, `Value::Null` if empty.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, token, Some(body)).await
    }

    pub async fn patch(
        &self,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        self.send(Method::PATCH, uri, token, body).await
    }

    /// Place an order as [`CUSTOMER`] and return its id.
    pub async fn place_order(&self, restaurant: RestaurantId, lines: &[(ProductId, i64)]) -> i64 {
        let products: Vec<Value> = lines
            .iter()
            .map(|(product, quantity)| {
                serde_json::json!({ "productId": product.as_i32(), "quantity": quantity })
            })
            .collect();
        let (status, body) = self
            .post(
                "/orders",
                Some(CUSTOMER),
                serde_json::json!({
                    "restaurantId": restaurant.as_i32(),
                    "address": "Plaza Mayor 1",
                    "products": products,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_i64().unwrap()
    }

    /// Store a [`CUSTOMER`] order at `restaurant` directly, placed at a chosen
    /// time. Lines are `(product, quantity, unit cents)`.
    pub async fn seed_order(
        &self,
        restaurant: RestaurantId,
        placed_at: DateTime<Utc>,
        lines: &[(ProductId, u32, i64)],
    ) -> OrderId {
        let lines: Vec<PricedLine> = lines
            .iter()
            .map(|&(product_id, quantity, cents)| PricedLine {
                product_id,
                quantity,
                unit_price: Money::from_cents(cents),
            })
            .collect();
        let price = price_order(&lines, Money::from_cents(250));
        self.store
            .create_order(NewOrder {
                customer_id: self.customer,
                restaurant_id: restaurant,
                address: "Plaza Mayor 1".to_string(),
                lines,
                price,
                placed_at,
            })
            .await
            .unwrap()
    }

    /// Apply lifecycle transitions to a stored order at the given times.
    pub async fn advance(&self, id: OrderId, steps: &[(Transition, DateTime<Utc>)]) {
        for &(transition, at) in steps {
            assert!(self.store.record_transition(id, transition, at).await.unwrap());
        }
    }
}

async fn user(store: &MemoryStore, name: &str, role: Role, token: &str) -> UserId {
    store
        .add_user(NewUser {
            email: format!("{name}@example.com"),
            first_name: name.to_string(),
            role,
            token: token.to_string(),
            token_expiration: None,
        })
        .await
        .unwrap()
        .id
}

async fn product(store: &MemoryStore, restaurant: RestaurantId, name: &str, cents: i64) -> ProductId {
    store
        .add_product(NewProduct {
            restaurant_id: restaurant,
            name: name.to_string(),
            description: None,
            price: Money::from_cents(cents),
        })
        .await
        .unwrap()
        .id
}
