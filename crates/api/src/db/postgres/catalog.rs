//! Restaurant and product queries.

use async_trait::async_trait;

use food_delivery_core::{Money, ProductId, RestaurantId, UserId};

use super::{PgStore, map_constraint};
use crate::db::{CatalogRepository, RepositoryError};
use crate::models::{NewProduct, NewRestaurant, PopularProduct, Product, Restaurant};

#[async_trait]
impl CatalogRepository for PgStore {
    async fn get_restaurant(&self, id: RestaurantId) -> Result<Option<Restaurant>, RepositoryError> {
        let restaurant = sqlx::query_as::<_, Restaurant>(
            r"
            SELECT id, owner_id, name, description, address,
                   shipping_costs, average_service_minutes
            FROM restaurants
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        Ok(restaurant)
    }

    async fn list_restaurants(&self) -> Result<Vec<Restaurant>, RepositoryError> {
        let restaurants = sqlx::query_as::<_, Restaurant>(
            r"
            SELECT id, owner_id, name, description, address,
                   shipping_costs, average_service_minutes
            FROM restaurants
            ORDER BY name, id
            ",
        )
        .fetch_all(self.pool())
        .await?;

        Ok(restaurants)
    }

    async fn list_owner_restaurants(
        &self,
        owner: UserId,
    ) -> Result<Vec<Restaurant>, RepositoryError> {
        let restaurants = sqlx::query_as::<_, Restaurant>(
            r"
            SELECT id, owner_id, name, description, address,
                   shipping_costs, average_service_minutes
            FROM restaurants
            WHERE owner_id = $1
            ORDER BY name, id
            ",
        )
        .bind(owner)
        .fetch_all(self.pool())
        .await?;

        Ok(restaurants)
    }

    async fn get_products(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let raw: Vec<i32> = ids.iter().map(ProductId::as_i32).collect();

        let products = sqlx::query_as::<_, Product>(
            r"
            SELECT id, restaurant_id, name, description, price, available
            FROM products
            WHERE id = ANY($1)
            ",
        )
        .bind(raw)
        .fetch_all(self.pool())
        .await?;

        Ok(products)
    }

    async fn list_restaurant_products(
        &self,
        restaurant: RestaurantId,
    ) -> Result<Vec<Product>, RepositoryError> {
        let products = sqlx::query_as::<_, Product>(
            r"
            SELECT id, restaurant_id, name, description, price, available
            FROM products
            WHERE restaurant_id = $1
            ORDER BY name, id
            ",
        )
        .bind(restaurant)
        .fetch_all(self.pool())
        .await?;

        Ok(products)
    }

    async fn popular_products(&self, limit: i64) -> Result<Vec<PopularProduct>, RepositoryError> {
        let products = sqlx::query_as::<_, PopularProduct>(
            r"
            SELECT p.id, p.restaurant_id, p.name, p.description, p.price, p.available,
                   SUM(l.quantity)::BIGINT AS total_quantity
            FROM products p
            JOIN order_lines l ON l.product_id = p.id
            GROUP BY p.id
            ORDER BY total_quantity DESC, p.id
            LIMIT $1
            ",
        )
        .bind(limit)
        .fetch_all(self.pool())
        .await?;

        Ok(products)
    }

    async fn update_product_price(
        &self,
        id: ProductId,
        price: Money,
    ) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(
            r"
            UPDATE products
            SET price = $2
            WHERE id = $1
            RETURNING id, restaurant_id, name, description, price, available
            ",
        )
        .bind(id)
        .bind(price)
        .fetch_optional(self.pool())
        .await
        .map_err(map_constraint)?;

        Ok(product)
    }
}

impl PgStore {
    /// Create a restaurant.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the owner does not exist.
    pub async fn create_restaurant(
        &self,
        restaurant: &NewRestaurant,
    ) -> Result<Restaurant, RepositoryError> {
        sqlx::query_as::<_, Restaurant>(
            r"
            INSERT INTO restaurants (owner_id, name, description, address, shipping_costs)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, owner_id, name, description, address,
                      shipping_costs, average_service_minutes
            ",
        )
        .bind(restaurant.owner_id)
        .bind(&restaurant.name)
        .bind(restaurant.description.as_deref())
        .bind(&restaurant.address)
        .bind(restaurant.shipping_costs)
        .fetch_one(self.pool())
        .await
        .map_err(map_constraint)
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the restaurant does not exist.
    pub async fn create_product(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        sqlx::query_as::<_, Product>(
            r"
            INSERT INTO products (restaurant_id, name, description, price)
            VALUES ($1, $2, $3, $4)
            RETURNING id, restaurant_id, name, description, price, available
            ",
        )
        .bind(product.restaurant_id)
        .bind(&product.name)
        .bind(product.description.as_deref())
        .bind(product.price)
        .fetch_one(self.pool())
        .await
        .map_err(map_constraint)
    }
}
