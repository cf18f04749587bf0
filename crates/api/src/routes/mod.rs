//! HTTP route handlers for the API.
//!
//! # Route Structure
//!
//! ```text
//! GET   /health                      - Liveness
//! GET   /health/ready                - Store connectivity
//!
//! # Orders (bearer token)
//! GET   /orders                      - Caller's orders (customer)
//! POST  /orders                      - Place an order (customer)
//! GET   /orders/{id}                 - Order detail (customer or restaurant owner)
//! PATCH /orders/{id}/confirm         - Start preparing (owner)
//! PATCH /orders/{id}/send            - Hand to delivery (owner)
//! PATCH /orders/{id}/deliver         - Mark delivered (owner)
//!
//! # Restaurants
//! GET   /restaurants                 - All restaurants
//! GET   /restaurants/{id}            - Restaurant with menu
//! GET   /restaurants/{id}/orders     - Filtered orders (owner; ?status=&from=&to=)
//! GET   /restaurants/{id}/analytics  - Daily counters (owner)
//!
//! # Products
//! GET   /products/popular            - Top 3 by ordered quantity
//! PATCH /products/{id}               - Change price (owner)
//!
//! # Users
//! GET   /users/myrestaurants         - Caller's restaurants (owner)
//! ```

pub mod orders;
pub mod products;
pub mod restaurants;
pub mod users;

use axum::{
    Router,
    extract::State,
    http::{Request, StatusCode},
    middleware,
    routing::{get, patch},
};
use tower_http::trace::TraceLayer;

use crate::middleware::request_id_middleware;
use crate::state::AppState;

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index).post(orders::create))
        .route("/{id}", get(orders::show))
        .route("/{id}/confirm", patch(orders::confirm))
        .route("/{id}/send", patch(orders::send))
        .route("/{id}/deliver", patch(orders::deliver))
}

/// Create the restaurant routes router.
pub fn restaurant_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(restaurants::index))
        .route("/{id}", get(restaurants::show))
        .route("/{id}/orders", get(restaurants::orders))
        .route("/{id}/analytics", get(restaurants::analytics))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/popular", get(products::popular))
        .route("/{id}", patch(products::update_price))
}

/// Create all routes for the API.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/orders", order_routes())
        .nest("/restaurants", restaurant_routes())
        .nest("/products", product_routes())
        .route("/users/myrestaurants", get(users::my_restaurants))
}

/// The complete application: routes, health checks and tracing.
///
/// Sentry layers are added by the binary, outside this router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes())
        .layer(middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                    user_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the store is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.store().ping().await {
        Ok(()) => StatusCode::OK,
        Err(err) => {
            tracing::warn!(error = %err, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
