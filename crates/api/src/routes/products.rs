//! Product route handlers.

use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
};
use serde::Serialize;
use tracing::instrument;

use food_delivery_core::ProductId;

use super::restaurants::ProductBody;
use crate::error::Result;
use crate::middleware::RequireUser;
use crate::models::PopularProduct;
use crate::services::{CatalogService, UpdateProductPrice};
use crate::state::AppState;

/// A product with the number of units ordered across all orders.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopularProductBody {
    #[serde(flatten)]
    pub product: ProductBody,
    pub total_quantity: i64,
}

impl From<PopularProduct> for PopularProductBody {
    fn from(popular: PopularProduct) -> Self {
        Self {
            product: popular.product.into(),
            total_quantity: popular.total_quantity,
        }
    }
}

/// The three most ordered products.
pub async fn popular(State(state): State<AppState>) -> Result<Json<Vec<PopularProductBody>>> {
    let products = CatalogService::new(state.store()).popular_products().await?;
    Ok(Json(products.into_iter().map(PopularProductBody::from).collect()))
}

/// Change a product's price. Existing orders keep their captured prices.
#[instrument(skip(state, caller, id, payload))]
pub async fn update_price(
    State(state): State<AppState>,
    RequireUser(caller): RequireUser,
    id: std::result::Result<Path<ProductId>, PathRejection>,
    payload: std::result::Result<Json<UpdateProductPrice>, JsonRejection>,
) -> Result<Json<ProductBody>> {
    let Path(id) = id?;
    let Json(update) = payload?;
    let product = CatalogService::new(state.store())
        .update_product_price(caller, id, update)
        .await?;
    Ok(Json(product.into()))
}
