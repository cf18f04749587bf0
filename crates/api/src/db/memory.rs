//! In-process implementation of the repositories.
//!
//! Everything lives in maps behind a `tokio::sync::RwLock`. Constraint checks
//! mirror the database schema so services behave the same against either
//! store.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use food_delivery_core::analytics::{
    AnalyticsWindow, RestaurantAnalytics, average_service_minutes,
};
use food_delivery_core::filter::OrderFilter;
use food_delivery_core::pricing::{MAX_QUANTITY, PricedLine};
use food_delivery_core::{
    Money, OrderId, OrderOwnership, OrderTimeline, ProductId, RestaurantId, Transition, UserId,
};

use super::{CatalogRepository, OrderRepository, RepositoryError, Store, UserRepository};
use crate::models::{
    CustomerSummary, LineItem, NewOrder, NewProduct, NewRestaurant, NewUser, Order, OrderDetail,
    PopularProduct, Product, Restaurant, RestaurantSummary, User,
};

/// Repository held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    users: BTreeMap<UserId, StoredUser>,
    restaurants: BTreeMap<RestaurantId, Restaurant>,
    products: BTreeMap<ProductId, Product>,
    orders: BTreeMap<OrderId, StoredOrder>,
    last_user: i32,
    last_restaurant: i32,
    last_product: i32,
    last_order: i32,
}

#[derive(Debug)]
struct StoredUser {
    user: User,
    token: String,
    token_expiration: Option<DateTime<Utc>>,
}

#[derive(Debug)]
struct StoredOrder {
    id: OrderId,
    customer_id: UserId,
    restaurant_id: RestaurantId,
    address: String,
    price: Money,
    shipping_costs: Money,
    created_at: DateTime<Utc>,
    timeline: OrderTimeline,
    lines: Vec<PricedLine>,
}

impl Inner {
    fn order(&self, stored: &StoredOrder) -> Order {
        let lines = stored
            .lines
            .iter()
            .map(|line| LineItem {
                product_id: line.product_id,
                name: self
                    .products
                    .get(&line.product_id)
                    .map(|p| p.name.clone())
                    .unwrap_or_default(),
                quantity: line.quantity,
                unit_price: line.unit_price,
            })
            .collect();

        Order {
            id: stored.id,
            customer_id: stored.customer_id,
            restaurant_id: stored.restaurant_id,
            address: stored.address.clone(),
            price: stored.price,
            shipping_costs: stored.shipping_costs,
            created_at: stored.created_at,
            timeline: stored.timeline,
            lines,
        }
    }

    /// Orders passing `keep`, newest first.
    fn orders_where(&self, keep: impl Fn(&StoredOrder) -> bool) -> Vec<Order> {
        let mut orders: Vec<&StoredOrder> = self.orders.values().filter(|o| keep(o)).collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        orders.into_iter().map(|o| self.order(o)).collect()
    }

    /// Recompute a restaurant's mean start-to-delivery time.
    fn refresh_average_service_time(
        &mut self,
        restaurant: RestaurantId,
    ) -> Result<(), RepositoryError> {
        let average = average_service_minutes(
            self.orders
                .values()
                .filter(|o| o.restaurant_id == restaurant)
                .filter_map(|o| o.timeline.service_time()),
        );
        self.restaurants
            .get_mut(&restaurant)
            .ok_or(RepositoryError::NotFound)?
            .average_service_minutes = average;
        Ok(())
    }

    fn sorted_restaurants(&self, keep: impl Fn(&Restaurant) -> bool) -> Vec<Restaurant> {
        let mut restaurants: Vec<Restaurant> = self
            .restaurants
            .values()
            .filter(|r| keep(r))
            .cloned()
            .collect();
        restaurants.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        restaurants
    }

    fn check_new_order(&self, order: &NewOrder) -> Result<(), RepositoryError> {
        if !self.users.contains_key(&order.customer_id) {
            return Err(RepositoryError::Conflict(
                "referenced entity does not exist".to_owned(),
            ));
        }
        if !self.restaurants.contains_key(&order.restaurant_id) {
            return Err(RepositoryError::Conflict(
                "referenced entity does not exist".to_owned(),
            ));
        }

        if order.price.total > Money::MAX {
            return Err(RepositoryError::Conflict("value out of range".to_owned()));
        }

        let mut seen = Vec::with_capacity(order.lines.len());
        for line in &order.lines {
            if !self.products.contains_key(&line.product_id) {
                return Err(RepositoryError::Conflict(
                    "referenced entity does not exist".to_owned(),
                ));
            }
            if line.quantity == 0 {
                return Err(RepositoryError::Conflict(
                    "quantity must be positive".to_owned(),
                ));
            }
            if line.quantity > MAX_QUANTITY || line.unit_price > Money::MAX {
                return Err(RepositoryError::Conflict("value out of range".to_owned()));
            }
            if seen.contains(&line.product_id) {
                return Err(RepositoryError::Conflict("duplicate value".to_owned()));
            }
            seen.push(line.product_id);
        }
        Ok(())
    }
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a user holding an API token.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email or token already exists.
    pub async fn add_user(&self, user: NewUser) -> Result<User, RepositoryError> {
        let mut inner = self.inner.write().await;
        if inner
            .users
            .values()
            .any(|u| u.user.email == user.email || u.token == user.token)
        {
            return Err(RepositoryError::Conflict("duplicate value".to_owned()));
        }

        inner.last_user += 1;
        let created = User {
            id: UserId::new(inner.last_user),
            email: user.email,
            first_name: user.first_name,
            role: user.role,
        };
        inner.users.insert(
            created.id,
            StoredUser {
                user: created.clone(),
                token: user.token,
                token_expiration: user.token_expiration,
            },
        );
        Ok(created)
    }

    /// Create a restaurant.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the owner does not exist.
    pub async fn add_restaurant(
        &self,
        restaurant: NewRestaurant,
    ) -> Result<Restaurant, RepositoryError> {
        let mut inner = self.inner.write().await;
        if !inner.users.contains_key(&restaurant.owner_id) {
            return Err(RepositoryError::Conflict(
                "referenced entity does not exist".to_owned(),
            ));
        }

        inner.last_restaurant += 1;
        let created = Restaurant {
            id: RestaurantId::new(inner.last_restaurant),
            owner_id: restaurant.owner_id,
            name: restaurant.name,
            description: restaurant.description,
            address: restaurant.address,
            shipping_costs: restaurant.shipping_costs,
            average_service_minutes: None,
        };
        inner.restaurants.insert(created.id, created.clone());
        Ok(created)
    }

    /// Add a product to a restaurant's menu.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the restaurant does not exist.
    pub async fn add_product(&self, product: NewProduct) -> Result<Product, RepositoryError> {
        let mut inner = self.inner.write().await;
        if !inner.restaurants.contains_key(&product.restaurant_id) {
            return Err(RepositoryError::Conflict(
                "referenced entity does not exist".to_owned(),
            ));
        }

        inner.last_product += 1;
        let created = Product {
            id: ProductId::new(inner.last_product),
            restaurant_id: product.restaurant_id,
            name: product.name,
            description: product.description,
            price: product.price,
            available: true,
        };
        inner.products.insert(created.id, created.clone());
        Ok(created)
    }

    /// Mark a product as (un)available.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn set_product_available(
        &self,
        id: ProductId,
        available: bool,
    ) -> Result<(), RepositoryError> {
        let mut inner = self.inner.write().await;
        let product = inner
            .products
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound)?;
        product.available = available;
        Ok(())
    }
}

#[async_trait]
impl OrderRepository for MemoryStore {
    async fn create_order(&self, order: NewOrder) -> Result<OrderId, RepositoryError> {
        let mut inner = self.inner.write().await;
        inner.check_new_order(&order)?;

        inner.last_order += 1;
        let id = OrderId::new(inner.last_order);
        inner.orders.insert(
            id,
            StoredOrder {
                id,
                customer_id: order.customer_id,
                restaurant_id: order.restaurant_id,
                address: order.address,
                price: order.price.total,
                shipping_costs: order.price.shipping_costs,
                created_at: order.placed_at,
                timeline: OrderTimeline::default(),
                lines: order.lines,
            },
        );
        Ok(id)
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let inner = self.inner.read().await;
        Ok(inner.orders.get(&id).map(|o| inner.order(o)))
    }

    async fn get_order_ownership(
        &self,
        id: OrderId,
    ) -> Result<Option<OrderOwnership>, RepositoryError> {
        let inner = self.inner.read().await;
        Ok(inner.orders.get(&id).and_then(|order| {
            inner
                .restaurants
                .get(&order.restaurant_id)
                .map(|restaurant| OrderOwnership {
                    customer_id: order.customer_id,
                    restaurant_id: order.restaurant_id,
                    restaurant_owner_id: restaurant.owner_id,
                })
        }))
    }

    async fn get_order_detail(&self, id: OrderId) -> Result<Option<OrderDetail>, RepositoryError> {
        let inner = self.inner.read().await;
        let Some(stored) = inner.orders.get(&id) else {
            return Ok(None);
        };

        let restaurant = inner
            .restaurants
            .get(&stored.restaurant_id)
            .ok_or_else(|| {
                RepositoryError::DataCorruption(format!("order {id} has no restaurant"))
            })?;
        let customer = inner
            .users
            .get(&stored.customer_id)
            .ok_or_else(|| RepositoryError::DataCorruption(format!("order {id} has no customer")))?;

        Ok(Some(OrderDetail {
            order: inner.order(stored),
            restaurant: RestaurantSummary {
                id: restaurant.id,
                name: restaurant.name.clone(),
                address: restaurant.address.clone(),
                shipping_costs: restaurant.shipping_costs,
                average_service_minutes: restaurant.average_service_minutes,
            },
            customer: CustomerSummary {
                id: customer.user.id,
                first_name: customer.user.first_name.clone(),
                email: customer.user.email.clone(),
            },
        }))
    }

    async fn list_customer_orders(&self, customer: UserId) -> Result<Vec<Order>, RepositoryError> {
        let inner = self.inner.read().await;
        Ok(inner.orders_where(|o| o.customer_id == customer))
    }

    async fn list_restaurant_orders(
        &self,
        restaurant: RestaurantId,
        filter: &OrderFilter,
    ) -> Result<Vec<Order>, RepositoryError> {
        let inner = self.inner.read().await;
        Ok(inner.orders_where(|o| {
            o.restaurant_id == restaurant && filter.matches(o.created_at, &o.timeline)
        }))
    }

    async fn record_transition(
        &self,
        id: OrderId,
        transition: Transition,
        at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let mut inner = self.inner.write().await;
        let Some(order) = inner.orders.get_mut(&id) else {
            return Ok(false);
        };
        let Ok(timeline) = order.timeline.apply(transition, at) else {
            return Ok(false);
        };
        order.timeline = timeline;
        let restaurant = order.restaurant_id;

        if transition == Transition::Deliver {
            inner.refresh_average_service_time(restaurant)?;
        }
        Ok(true)
    }

    async fn restaurant_analytics(
        &self,
        restaurant: RestaurantId,
        window: AnalyticsWindow,
    ) -> Result<RestaurantAnalytics, RepositoryError> {
        let inner = self.inner.read().await;
        let orders: Vec<&StoredOrder> = inner
            .orders
            .values()
            .filter(|o| o.restaurant_id == restaurant)
            .collect();

        let count = |keep: &dyn Fn(&StoredOrder) -> bool| -> i64 {
            orders
                .iter()
                .filter(|o| keep(o))
                .count()
                .try_into()
                .unwrap_or(i64::MAX)
        };

        Ok(RestaurantAnalytics {
            restaurant_id: restaurant,
            num_yesterday_orders: count(&|o| {
                o.created_at >= window.yesterday_start && o.created_at < window.today_start
            }),
            num_pending_orders: count(&|o| o.timeline.started_at.is_none()),
            num_delivered_today_orders: count(&|o| {
                o.timeline
                    .delivered_at
                    .is_some_and(|at| at >= window.today_start)
            }),
            invoiced_today: orders
                .iter()
                .filter(|o| o.created_at >= window.today_start)
                .map(|o| o.price)
                .sum(),
        })
    }
}

#[async_trait]
impl CatalogRepository for MemoryStore {
    async fn get_restaurant(&self, id: RestaurantId) -> Result<Option<Restaurant>, RepositoryError> {
        Ok(self.inner.read().await.restaurants.get(&id).cloned())
    }

    async fn list_restaurants(&self) -> Result<Vec<Restaurant>, RepositoryError> {
        Ok(self.inner.read().await.sorted_restaurants(|_| true))
    }

    async fn list_owner_restaurants(
        &self,
        owner: UserId,
    ) -> Result<Vec<Restaurant>, RepositoryError> {
        Ok(self
            .inner
            .read()
            .await
            .sorted_restaurants(|r| r.owner_id == owner))
    }

    async fn get_products(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        let inner = self.inner.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| inner.products.get(id).cloned())
            .collect())
    }

    async fn list_restaurant_products(
        &self,
        restaurant: RestaurantId,
    ) -> Result<Vec<Product>, RepositoryError> {
        let inner = self.inner.read().await;
        let mut products: Vec<Product> = inner
            .products
            .values()
            .filter(|p| p.restaurant_id == restaurant)
            .cloned()
            .collect();
        products.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(products)
    }

    async fn popular_products(&self, limit: i64) -> Result<Vec<PopularProduct>, RepositoryError> {
        let inner = self.inner.read().await;

        let mut totals: HashMap<ProductId, i64> = HashMap::new();
        for line in inner.orders.values().flat_map(|o| &o.lines) {
            *totals.entry(line.product_id).or_default() += i64::from(line.quantity);
        }

        let mut ranked: Vec<PopularProduct> = totals
            .into_iter()
            .filter_map(|(id, total_quantity)| {
                inner.products.get(&id).map(|product| PopularProduct {
                    product: product.clone(),
                    total_quantity,
                })
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.total_quantity
                .cmp(&a.total_quantity)
                .then(a.product.id.cmp(&b.product.id))
        });
        ranked.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(ranked)
    }

    async fn update_product_price(
        &self,
        id: ProductId,
        price: Money,
    ) -> Result<Option<Product>, RepositoryError> {
        let mut inner = self.inner.write().await;
        Ok(inner.products.get_mut(&id).map(|product| {
            product.price = price;
            product.clone()
        }))
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, RepositoryError> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .values()
            .find(|u| u.token == token && u.token_expiration.is_none_or(|exp| exp > now))
            .map(|u| u.user.clone()))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}
