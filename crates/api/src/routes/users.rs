//! User route handlers.

use axum::{Json, extract::State};

use super::restaurants::RestaurantBody;
use crate::error::Result;
use crate::middleware::RequireUser;
use crate::services::CatalogService;
use crate::state::AppState;

/// Restaurants owned by the caller.
pub async fn my_restaurants(
    State(state): State<AppState>,
    RequireUser(caller): RequireUser,
) -> Result<Json<Vec<RestaurantBody>>> {
    let restaurants = CatalogService::new(state.store())
        .owner_restaurants(caller)
        .await?;
    Ok(Json(restaurants.into_iter().map(RestaurantBody::from).collect()))
}
