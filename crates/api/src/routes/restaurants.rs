//! Restaurant route handlers.

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{PathRejection, QueryRejection},
    },
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use food_delivery_core::analytics::RestaurantAnalytics;
use food_delivery_core::filter::OrderFilter;
use food_delivery_core::{Money, ProductId, RestaurantId, UserId};

use super::orders::OrderBody;
use crate::error::Result;
use crate::middleware::RequireUser;
use crate::models::{Product, Restaurant, RestaurantDetail};
use crate::services::{CatalogService, OrderService};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantBody {
    pub id: RestaurantId,
    pub owner_id: UserId,
    pub name: String,
    pub description: Option<String>,
    pub address: String,
    pub shipping_costs: Money,
    pub average_service_minutes: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductBody {
    pub id: ProductId,
    pub restaurant_id: RestaurantId,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub available: bool,
}

/// A restaurant with its menu.
#[derive(Debug, Serialize)]
pub struct RestaurantDetailBody {
    #[serde(flatten)]
    pub restaurant: RestaurantBody,
    pub products: Vec<ProductBody>,
}

impl From<Restaurant> for RestaurantBody {
    fn from(r: Restaurant) -> Self {
        Self {
            id: r.id,
            owner_id: r.owner_id,
            name: r.name,
            description: r.description,
            address: r.address,
            shipping_costs: r.shipping_costs,
            average_service_minutes: r.average_service_minutes,
        }
    }
}

impl From<Product> for ProductBody {
    fn from(p: Product) -> Self {
        Self {
            id: p.id,
            restaurant_id: p.restaurant_id,
            name: p.name,
            description: p.description,
            price: p.price,
            available: p.available,
        }
    }
}

impl From<RestaurantDetail> for RestaurantDetailBody {
    fn from(detail: RestaurantDetail) -> Self {
        Self {
            restaurant: detail.restaurant.into(),
            products: detail.products.into_iter().map(ProductBody::from).collect(),
        }
    }
}

/// Raw `?status=&from=&to=` values, validated by [`OrderFilter::parse`].
#[derive(Debug, Default, Deserialize)]
pub struct OrderQuery {
    pub status: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

/// Every restaurant, by name.
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<RestaurantBody>>> {
    let restaurants = CatalogService::new(state.store()).list_restaurants().await?;
    Ok(Json(restaurants.into_iter().map(RestaurantBody::from).collect()))
}

/// A restaurant and its products.
pub async fn show(
    State(state): State<AppState>,
    id: std::result::Result<Path<RestaurantId>, PathRejection>,
) -> Result<Json<RestaurantDetailBody>> {
    let Path(id) = id?;
    let detail = CatalogService::new(state.store())
        .restaurant_detail(id)
        .await?;
    Ok(Json(detail.into()))
}

/// A restaurant's orders, filtered by status and creation date.
#[instrument(skip(state, caller, id, query))]
pub async fn orders(
    State(state): State<AppState>,
    RequireUser(caller): RequireUser,
    id: std::result::Result<Path<RestaurantId>, PathRejection>,
    query: std::result::Result<Query<OrderQuery>, QueryRejection>,
) -> Result<Json<Vec<OrderBody>>> {
    let Path(id) = id?;
    let Query(query) = query?;
    let filter = OrderFilter::parse(
        query.status.as_deref(),
        query.from.as_deref(),
        query.to.as_deref(),
    )?;

    let orders = OrderService::new(state.store())
        .list_for_restaurant(caller, id, &filter)
        .await?;
    Ok(Json(orders.into_iter().map(OrderBody::from).collect()))
}

/// Yesterday's, pending and today's counters for a restaurant.
#[instrument(skip(state, caller, id))]
pub async fn analytics(
    State(state): State<AppState>,
    RequireUser(caller): RequireUser,
    id: std::result::Result<Path<RestaurantId>, PathRejection>,
) -> Result<Json<RestaurantAnalytics>> {
    let Path(id) = id?;
    let analytics = OrderService::new(state.store())
        .analytics(caller, id, Utc::now())
        .await?;
    Ok(Json(analytics))
}
