//! Order route handlers.

use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::instrument;

use food_delivery_core::{Money, OrderId, OrderStatus, ProductId, RestaurantId, Transition, UserId};

use crate::error::Result;
use crate::middleware::RequireUser;
use crate::models::{CustomerSummary, LineItem, Order, OrderDetail, RestaurantSummary};
use crate::services::{OrderService, PlaceOrder};
use crate::state::AppState;

/// An order as returned to clients.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderBody {
    pub id: OrderId,
    pub customer_id: UserId,
    pub restaurant_id: RestaurantId,
    pub address: String,
    pub price: Money,
    pub shipping_costs: Money,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub sent_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub status: OrderStatus,
    pub products: Vec<LineItemBody>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemBody {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Money,
}

/// An order with the restaurant and customer it links.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetailBody {
    #[serde(flatten)]
    pub order: OrderBody,
    pub restaurant: RestaurantSummaryBody,
    pub customer: CustomerBody,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantSummaryBody {
    pub id: RestaurantId,
    pub name: String,
    pub address: String,
    pub shipping_costs: Money,
    pub average_service_minutes: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerBody {
    pub id: UserId,
    pub first_name: String,
    pub email: String,
}

impl From<LineItem> for LineItemBody {
    fn from(line: LineItem) -> Self {
        Self {
            product_id: line.product_id,
            name: line.name,
            quantity: line.quantity,
            unit_price: line.unit_price,
        }
    }
}

impl From<Order> for OrderBody {
    fn from(order: Order) -> Self {
        Self {
            status: order.status(),
            id: order.id,
            customer_id: order.customer_id,
            restaurant_id: order.restaurant_id,
            address: order.address,
            price: order.price,
            shipping_costs: order.shipping_costs,
            created_at: order.created_at,
            started_at: order.timeline.started_at,
            sent_at: order.timeline.sent_at,
            delivered_at: order.timeline.delivered_at,
            products: order.lines.into_iter().map(LineItemBody::from).collect(),
        }
    }
}

impl From<RestaurantSummary> for RestaurantSummaryBody {
    fn from(r: RestaurantSummary) -> Self {
        Self {
            id: r.id,
            name: r.name,
            address: r.address,
            shipping_costs: r.shipping_costs,
            average_service_minutes: r.average_service_minutes,
        }
    }
}

impl From<CustomerSummary> for CustomerBody {
    fn from(c: CustomerSummary) -> Self {
        Self {
            id: c.id,
            first_name: c.first_name,
            email: c.email,
        }
    }
}

impl From<OrderDetail> for OrderDetailBody {
    fn from(detail: OrderDetail) -> Self {
        Self {
            order: detail.order.into(),
            restaurant: detail.restaurant.into(),
            customer: detail.customer.into(),
        }
    }
}

/// The caller's orders, newest first.
#[instrument(skip(state, caller))]
pub async fn index(
    State(state): State<AppState>,
    RequireUser(caller): RequireUser,
) -> Result<Json<Vec<OrderBody>>> {
    let orders = OrderService::new(state.store())
        .list_for_customer(caller)
        .await?;
    Ok(Json(orders.into_iter().map(OrderBody::from).collect()))
}

/// Place an order.
#[instrument(skip(state, caller, payload))]
pub async fn create(
    State(state): State<AppState>,
    RequireUser(caller): RequireUser,
    payload: std::result::Result<Json<PlaceOrder>, JsonRejection>,
) -> Result<(StatusCode, Json<OrderBody>)> {
    let Json(request) = payload?;
    let order = OrderService::new(state.store())
        .place(caller, request, Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(order.into())))
}

/// Order detail with restaurant and customer summaries.
#[instrument(skip(state, caller, id))]
pub async fn show(
    State(state): State<AppState>,
    RequireUser(caller): RequireUser,
    id: std::result::Result<Path<OrderId>, PathRejection>,
) -> Result<Json<OrderDetailBody>> {
    let Path(id) = id?;
    let detail = OrderService::new(state.store()).get(caller, id).await?;
    Ok(Json(detail.into()))
}

/// Start preparing an order.
pub async fn confirm(
    state: State<AppState>,
    caller: RequireUser,
    id: std::result::Result<Path<OrderId>, PathRejection>,
) -> Result<Json<OrderBody>> {
    advance(state, caller, id, Transition::Confirm).await
}

/// Hand an order to delivery.
pub async fn send(
    state: State<AppState>,
    caller: RequireUser,
    id: std::result::Result<Path<OrderId>, PathRejection>,
) -> Result<Json<OrderBody>> {
    advance(state, caller, id, Transition::Send).await
}

/// Mark an order delivered.
pub async fn deliver(
    state: State<AppState>,
    caller: RequireUser,
    id: std::result::Result<Path<OrderId>, PathRejection>,
) -> Result<Json<OrderBody>> {
    advance(state, caller, id, Transition::Deliver).await
}

#[instrument(skip(state, caller, id))]
async fn advance(
    State(state): State<AppState>,
    RequireUser(caller): RequireUser,
    id: std::result::Result<Path<OrderId>, PathRejection>,
    transition: Transition,
) -> Result<Json<OrderBody>> {
    let Path(id) = id?;
    let order = OrderService::new(state.store())
        .transition(caller, id, transition, Utc::now())
        .await?;
    Ok(Json(order.into()))
}
