//! Catalog service.
//!
//! Read access to restaurants and menus is public. Changing a product
//! requires owning its restaurant.

mod error;

pub use error::CatalogError;

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use food_delivery_core::{Capability, Money, Principal, ProductId, RestaurantId, ValidationErrors};

use crate::db::Store;
use crate::models::{PopularProduct, Product, Restaurant, RestaurantDetail};

/// Number of products returned by [`CatalogService::popular_products`].
pub const POPULAR_LIMIT: i64 = 3;

/// Body of a product price update.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct UpdateProductPrice {
    pub price: Decimal,
}

/// Restaurant and product operations.
pub struct CatalogService<'a> {
    store: &'a dyn Store,
}

impl<'a> CatalogService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Every restaurant, by name.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if the query fails.
    pub async fn list_restaurants(&self) -> Result<Vec<Restaurant>, CatalogError> {
        Ok(self.store.list_restaurants().await?)
    }

    /// A restaurant with its menu.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::RestaurantNotFound` if it does not exist.
    pub async fn restaurant_detail(
        &self,
        id: RestaurantId,
    ) -> Result<RestaurantDetail, CatalogError> {
        let restaurant = self
            .store
            .get_restaurant(id)
            .await?
            .ok_or(CatalogError::RestaurantNotFound(id))?;
        let products = self.store.list_restaurant_products(id).await?;

        Ok(RestaurantDetail {
            restaurant,
            products,
        })
    }

    /// Restaurants owned by the caller.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Forbidden` for callers who do not manage a
    /// catalog.
    pub async fn owner_restaurants(
        &self,
        caller: Principal,
    ) -> Result<Vec<Restaurant>, CatalogError> {
        caller.require(Capability::ManageCatalog)?;
        Ok(self.store.list_owner_restaurants(caller.user_id).await?)
    }

    /// The most ordered products.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if the query fails.
    pub async fn popular_products(&self) -> Result<Vec<PopularProduct>, CatalogError> {
        Ok(self.store.popular_products(POPULAR_LIMIT).await?)
    }

    /// Change a product's catalog price.
    ///
    /// Orders already placed keep the unit price they captured.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::ProductNotFound`, `CatalogError::Forbidden`
    /// unless the caller owns the product's restaurant, or
    /// `CatalogError::Validation` for a negative or oversized price.
    #[instrument(skip(self), fields(user_id = %caller.user_id))]
    pub async fn update_product_price(
        &self,
        caller: Principal,
        id: ProductId,
        update: UpdateProductPrice,
    ) -> Result<Product, CatalogError> {
        let product = self
            .store
            .get_products(&[id])
            .await?
            .into_iter()
            .next()
            .ok_or(CatalogError::ProductNotFound(id))?;
        let restaurant = self
            .store
            .get_restaurant(product.restaurant_id)
            .await?
            .ok_or(CatalogError::RestaurantNotFound(product.restaurant_id))?;
        caller.require_restaurant(Capability::ManageCatalog, restaurant.owner_id)?;

        let price = Money::new(update.price);
        if price.is_negative() {
            return Err(ValidationErrors::single("price", "The price must be zero or greater").into());
        }
        if price > Money::MAX {
            return Err(ValidationErrors::single(
                "price",
                format!("The price must not exceed {}", Money::MAX),
            )
            .into());
        }

        let updated = self
            .store
            .update_product_price(id, price)
            .await?
            .ok_or(CatalogError::ProductNotFound(id))?;

        tracing::info!(
            product_id = %id,
            old_price = %product.price,
            new_price = %updated.price,
            "Product price updated"
        );
        Ok(updated)
    }
}
