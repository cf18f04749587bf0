//! Order service.
//!
//! Places orders with computed pricing, enforces who may see or advance an
//! order, and drives the confirm/send/deliver lifecycle.

mod error;

pub use error::OrderError;

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::instrument;

use food_delivery_core::analytics::{AnalyticsWindow, RestaurantAnalytics};
use food_delivery_core::filter::OrderFilter;
use food_delivery_core::pricing::{MAX_QUANTITY, PricedLine, price_order};
use food_delivery_core::{
    Capability, Money, OrderId, OrderOwnership, Principal, ProductId, RestaurantId, Transition,
    ValidationErrors,
};

use crate::db::Store;
use crate::models::{NewOrder, Order, OrderDetail, Product, Restaurant};

const PRODUCTS_REQUIRED: &str =
    "Order should have products, and all of them with quantity greater than zero";

/// Body of an order placement request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrder {
    pub restaurant_id: RestaurantId,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub products: Vec<OrderLineRequest>,
}

/// One requested product.
///
/// The quantity is signed so that zero and negative values reach validation
/// instead of failing deserialization.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineRequest {
    pub product_id: ProductId,
    pub quantity: i64,
}

/// Order operations on behalf of an authenticated caller.
pub struct OrderService<'a> {
    store: &'a dyn Store,
}

impl<'a> OrderService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Validate, price and persist a new order.
    ///
    /// Every validation failure is collected before anything is written.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Forbidden` if the caller cannot place orders and
    /// `OrderError::Validation` listing every rejected field.
    #[instrument(skip(self, request), fields(customer_id = %caller.user_id, restaurant_id = %request.restaurant_id))]
    pub async fn place(
        &self,
        caller: Principal,
        request: PlaceOrder,
        now: DateTime<Utc>,
    ) -> Result<Order, OrderError> {
        caller.require(Capability::PlaceOrders)?;

        let restaurant = self.store.get_restaurant(request.restaurant_id).await?;
        let ids: Vec<ProductId> = request.products.iter().map(|l| l.product_id).collect();
        let products: HashMap<ProductId, Product> = self
            .store
            .get_products(&ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let lines = validate_order(&request, restaurant.as_ref(), &products)?;
        let restaurant = restaurant.ok_or(OrderError::RestaurantNotFound(request.restaurant_id))?;

        let price = price_order(&lines, restaurant.shipping_costs);
        if price.total > Money::MAX {
            return Err(ValidationErrors::single(
                "products",
                format!("The order total must not exceed {}", Money::MAX),
            )
            .into());
        }
        let id = self
            .store
            .create_order(NewOrder {
                customer_id: caller.user_id,
                restaurant_id: restaurant.id,
                address: request.address.trim().to_owned(),
                lines,
                price,
                placed_at: now,
            })
            .await?;

        tracing::info!(
            order_id = %id,
            subtotal = %price.subtotal,
            shipping_costs = %price.shipping_costs,
            total = %price.total,
            "Order placed"
        );

        self.store
            .get_order(id)
            .await?
            .ok_or(OrderError::NotFound(id))
    }

    /// An order with its restaurant and customer, if the caller may see it.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::NotFound` or `OrderError::Forbidden`.
    #[instrument(skip(self), fields(user_id = %caller.user_id))]
    pub async fn get(&self, caller: Principal, id: OrderId) -> Result<OrderDetail, OrderError> {
        let ownership = self.ownership(id).await?;
        caller.authorize_order(&ownership)?;

        self.store
            .get_order_detail(id)
            .await?
            .ok_or(OrderError::NotFound(id))
    }

    /// The caller's own orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Forbidden` for callers who do not place orders.
    pub async fn list_for_customer(&self, caller: Principal) -> Result<Vec<Order>, OrderError> {
        caller.require(Capability::ViewOwnOrders)?;
        Ok(self.store.list_customer_orders(caller.user_id).await?)
    }

    /// A restaurant's orders matching `filter`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::RestaurantNotFound` or `OrderError::Forbidden`
    /// unless the caller owns the restaurant.
    #[instrument(skip(self), fields(user_id = %caller.user_id))]
    pub async fn list_for_restaurant(
        &self,
        caller: Principal,
        restaurant_id: RestaurantId,
        filter: &OrderFilter,
    ) -> Result<Vec<Order>, OrderError> {
        let restaurant = self.managed_restaurant(caller, restaurant_id).await?;
        Ok(self
            .store
            .list_restaurant_orders(restaurant.id, filter)
            .await?)
    }

    /// Advance an order one stage, stamped at `now`.
    ///
    /// Delivering also refreshes the restaurant's average service time, in
    /// the same write as the delivery stamp.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Transition` when the order is not in the stage
    /// the transition expects and `OrderError::Conflict` when a concurrent
    /// request stamped the stage first.
    #[instrument(skip(self), fields(user_id = %caller.user_id))]
    pub async fn transition(
        &self,
        caller: Principal,
        id: OrderId,
        transition: Transition,
        now: DateTime<Utc>,
    ) -> Result<Order, OrderError> {
        let ownership = self.ownership(id).await?;
        caller.authorize_order_management(&ownership)?;

        let order = self
            .store
            .get_order(id)
            .await?
            .ok_or(OrderError::NotFound(id))?;
        order.timeline.apply(transition, now)?;

        if !self.store.record_transition(id, transition, now).await? {
            tracing::warn!(order_id = %id, %transition, "Order changed before transition was stored");
            return Err(OrderError::Conflict(id));
        }

        tracing::info!(
            order_id = %id,
            %transition,
            status = %transition.target(),
            "Order advanced"
        );

        self.store
            .get_order(id)
            .await?
            .ok_or(OrderError::NotFound(id))
    }

    /// Daily counters for a restaurant the caller owns.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::RestaurantNotFound` or `OrderError::Forbidden`.
    pub async fn analytics(
        &self,
        caller: Principal,
        restaurant_id: RestaurantId,
        now: DateTime<Utc>,
    ) -> Result<RestaurantAnalytics, OrderError> {
        let restaurant = self.managed_restaurant(caller, restaurant_id).await?;
        Ok(self
            .store
            .restaurant_analytics(restaurant.id, AnalyticsWindow::at(now))
            .await?)
    }

    async fn ownership(&self, id: OrderId) -> Result<OrderOwnership, OrderError> {
        self.store
            .get_order_ownership(id)
            .await?
            .ok_or(OrderError::NotFound(id))
    }

    async fn managed_restaurant(
        &self,
        caller: Principal,
        restaurant_id: RestaurantId,
    ) -> Result<Restaurant, OrderError> {
        let restaurant = self
            .store
            .get_restaurant(restaurant_id)
            .await?
            .ok_or(OrderError::RestaurantNotFound(restaurant_id))?;
        caller.require_restaurant(Capability::ManageRestaurantOrders, restaurant.owner_id)?;
        Ok(restaurant)
    }
}

/// Check a placement request against the catalog and capture unit prices.
fn validate_order(
    request: &PlaceOrder,
    restaurant: Option<&Restaurant>,
    products: &HashMap<ProductId, Product>,
) -> Result<Vec<PricedLine>, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if request.address.trim().is_empty() {
        errors.push("address", "The address is required");
    }
    if restaurant.is_none() {
        errors.push("restaurantId", "The restaurant does not exist");
    }
    if request.products.is_empty() {
        errors.push("products", PRODUCTS_REQUIRED);
    }

    let mut seen = HashSet::new();
    let mut lines = Vec::with_capacity(request.products.len());

    for (index, line) in request.products.iter().enumerate() {
        let field = |name: &str| format!("products[{index}].{name}");

        let quantity = u32::try_from(line.quantity).ok().filter(|q| *q > 0);
        match quantity {
            None => errors.push(field("quantity"), PRODUCTS_REQUIRED),
            Some(q) if q > MAX_QUANTITY => errors.push(
                field("quantity"),
                format!("The quantity must not exceed {MAX_QUANTITY}"),
            ),
            Some(_) => {}
        }

        if !seen.insert(line.product_id) {
            errors.push(
                field("productId"),
                "The product appears more than once in the order",
            );
            continue;
        }
        let Some(product) = products.get(&line.product_id) else {
            errors.push(field("productId"), "The product does not exist in the database");
            continue;
        };
        if restaurant.is_some_and(|r| r.id != product.restaurant_id) {
            errors.push(field("productId"), "The product does not belong to the restaurant");
            continue;
        }
        if !product.available {
            errors.push(field("productId"), "The product is not available");
            continue;
        }

        if let Some(quantity) = quantity.filter(|q| *q <= MAX_QUANTITY) {
            lines.push(PricedLine {
                product_id: product.id,
                quantity,
                unit_price: product.price,
            });
        }
    }

    errors.into_result()?;
    Ok(lines)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{Duration, TimeZone};
    use food_delivery_core::{AccessDenied, Money, OrderStatus, Role, TransitionError};

    use super::*;
    use crate::db::{CatalogRepository, MemoryStore};
    use crate::models::{NewProduct, NewRestaurant, NewUser};

    struct Fixture {
        store: MemoryStore,
        customer: Principal,
        other_customer: Principal,
        owner: Principal,
        other_owner: Principal,
        restaurant: RestaurantId,
        foreign_restaurant: RestaurantId,
        croquetas: ProductId,
        tortilla: ProductId,
        foreign_product: ProductId,
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 5, 12, 0, 0).unwrap()
    }

    async fn user(store: &MemoryStore, name: &str, role: Role) -> Principal {
        store
            .add_user(NewUser {
                email: format!("{name}@example.com"),
                first_name: name.to_owned(),
                role,
                token: format!("{name}-token"),
                token_expiration: None,
            })
            .await
            .unwrap()
            .principal()
    }

    async fn restaurant(store: &MemoryStore, owner: Principal, name: &str) -> RestaurantId {
        store
            .add_restaurant(NewRestaurant {
                owner_id: owner.user_id,
                name: name.to_owned(),
                description: None,
                address: "Calle Mayor 1".to_owned(),
                shipping_costs: Money::from_cents(250),
            })
            .await
            .unwrap()
            .id
    }

    async fn product(store: &MemoryStore, restaurant: RestaurantId, cents: i64) -> ProductId {
        store
            .add_product(NewProduct {
                restaurant_id: restaurant,
                name: format!("Dish {cents}"),
                description: None,
                price: Money::from_cents(cents),
            })
            .await
            .unwrap()
            .id
    }

    async fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let customer = user(&store, "carl", Role::Customer).await;
        let other_customer = user(&store, "cora", Role::Customer).await;
        let owner = user(&store, "olga", Role::Owner).await;
        let other_owner = user(&store, "oscar", Role::Owner).await;
        let restaurant_id = restaurant(&store, owner, "Casa Pepe").await;
        let foreign_restaurant = restaurant(&store, other_owner, "Burger Place").await;
        let croquetas = product(&store, restaurant_id, 300).await;
        let tortilla = product(&store, restaurant_id, 1001).await;
        let foreign_product = product(&store, foreign_restaurant, 500).await;

        Fixture {
            store,
            customer,
            other_customer,
            owner,
            other_owner,
            restaurant: restaurant_id,
            foreign_restaurant,
            croquetas,
            tortilla,
            foreign_product,
        }
    }

    fn request(restaurant_id: RestaurantId, lines: &[(ProductId, i64)]) -> PlaceOrder {
        PlaceOrder {
            restaurant_id,
            address: "Avenida 2".to_owned(),
            products: lines
                .iter()
                .map(|&(product_id, quantity)| OrderLineRequest {
                    product_id,
                    quantity,
                })
                .collect(),
        }
    }

    async fn place(f: &Fixture, lines: &[(ProductId, i64)]) -> Order {
        OrderService::new(&f.store)
            .place(f.customer, request(f.restaurant, lines), now())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_small_order_pays_shipping() {
        let f = fixture().await;
        let order = place(&f, &[(f.croquetas, 2)]).await;

        assert_eq!(order.price, Money::from_cents(850));
        assert_eq!(order.shipping_costs, Money::from_cents(250));
        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(order.customer_id, f.customer.user_id);
    }

    #[tokio::test]
    async fn test_large_order_ships_free() {
        let f = fixture().await;
        let order = place(&f, &[(f.tortilla, 1)]).await;

        assert_eq!(order.price, Money::from_cents(1001));
        assert_eq!(order.shipping_costs, Money::ZERO);
    }

    #[tokio::test]
    async fn test_lines_keep_request_order() {
        let f = fixture().await;
        let order = place(&f, &[(f.tortilla, 1), (f.croquetas, 3)]).await;

        let ids: Vec<ProductId> = order.lines.iter().map(|l| l.product_id).collect();
        assert_eq!(ids, vec![f.tortilla, f.croquetas]);
        assert_eq!(order.price, Money::from_cents(1901));
    }

    #[tokio::test]
    async fn test_place_collects_every_validation_error() {
        let f = fixture().await;
        let mut body = request(
            f.restaurant,
            &[(f.croquetas, 0), (f.foreign_product, 1), (ProductId::new(999), 1)],
        );
        body.address = "   ".to_owned();

        let err = OrderService::new(&f.store)
            .place(f.customer, body, now())
            .await
            .unwrap_err();

        let OrderError::Validation(errors) = err else {
            panic!("expected validation error, got {err:?}");
        };
        assert!(errors.has_field("address"));
        assert!(errors.has_field("products[0].quantity"));
        assert!(errors.has_field("products[1].productId"));
        assert!(errors.has_field("products[2].productId"));
        assert_eq!(errors.errors().len(), 4);
    }

    #[tokio::test]
    async fn test_place_rejects_empty_and_duplicate_products() {
        let f = fixture().await;
        let service = OrderService::new(&f.store);

        let err = service
            .place(f.customer, request(f.restaurant, &[]), now())
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::Validation(ref e) if e.has_field("products")));

        let err = service
            .place(
                f.customer,
                request(f.restaurant, &[(f.croquetas, 1), (f.croquetas, 2)]),
                now(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::Validation(ref e) if e.has_field("products[1].productId")));
    }

    #[tokio::test]
    async fn test_place_rejects_unknown_restaurant_and_unavailable_product() {
        let f = fixture().await;
        let service = OrderService::new(&f.store);

        let err = service
            .place(f.customer, request(RestaurantId::new(404), &[(f.croquetas, 1)]), now())
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::Validation(ref e) if e.has_field("restaurantId")));

        f.store.set_product_available(f.croquetas, false).await.unwrap();
        let err = service
            .place(f.customer, request(f.restaurant, &[(f.croquetas, 1)]), now())
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::Validation(ref e) if e.has_field("products[0].productId")));
    }

    #[tokio::test]
    async fn test_place_rejects_quantity_beyond_storage() {
        let f = fixture().await;
        let err = OrderService::new(&f.store)
            .place(f.customer, request(f.restaurant, &[(f.croquetas, 3_000_000_000)]), now())
            .await
            .unwrap_err();

        let OrderError::Validation(errors) = err else {
            panic!("expected validation error, got {err:?}");
        };
        assert!(errors.has_field("products[0].quantity"));
        assert_eq!(errors.errors().len(), 1);
    }

    #[tokio::test]
    async fn test_place_rejects_total_beyond_storage() {
        let f = fixture().await;
        let service = OrderService::new(&f.store);

        // 100,000,000 x 3.00 overflows NUMERIC(10, 2).
        let err = service
            .place(f.customer, request(f.restaurant, &[(f.croquetas, 100_000_000)]), now())
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::Validation(ref e) if e.has_field("products")));
        assert!(
            service
                .list_for_customer(f.customer)
                .await
                .unwrap()
                .is_empty()
        );

        // 33,333,333 x 3.00 = 99,999,999.00 still fits.
        let order = place(&f, &[(f.croquetas, 33_333_333)]).await;
        assert_eq!(order.price, Money::from_cents(9_999_999_900));
    }

    #[tokio::test]
    async fn test_owner_cannot_place_orders() {
        let f = fixture().await;
        let err = OrderService::new(&f.store)
            .place(f.owner, request(f.restaurant, &[(f.croquetas, 1)]), now())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            OrderError::Forbidden(AccessDenied::MissingCapability(Capability::PlaceOrders))
        ));
    }

    #[tokio::test]
    async fn test_order_visibility() {
        let f = fixture().await;
        let order = place(&f, &[(f.croquetas, 1)]).await;
        let service = OrderService::new(&f.store);

        let detail = service.get(f.customer, order.id).await.unwrap();
        assert_eq!(detail.customer.id, f.customer.user_id);
        assert_eq!(detail.restaurant.id, f.restaurant);
        assert!(service.get(f.owner, order.id).await.is_ok());

        assert!(matches!(
            service.get(f.other_customer, order.id).await,
            Err(OrderError::Forbidden(_))
        ));
        assert!(matches!(
            service.get(f.other_owner, order.id).await,
            Err(OrderError::Forbidden(_))
        ));
        assert!(matches!(
            service.get(f.customer, OrderId::new(404)).await,
            Err(OrderError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_transitions_follow_lifecycle() {
        let f = fixture().await;
        let order = place(&f, &[(f.croquetas, 1)]).await;
        let service = OrderService::new(&f.store);
        let t0 = now();

        let err = service
            .transition(f.owner, order.id, Transition::Send, t0)
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::Transition(TransitionError::NotStarted)));

        let confirmed = service
            .transition(f.owner, order.id, Transition::Confirm, t0)
            .await
            .unwrap();
        assert_eq!(confirmed.status(), OrderStatus::InProcess);

        let err = service
            .transition(f.owner, order.id, Transition::Confirm, t0)
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::Transition(TransitionError::AlreadyStarted)));

        let err = service
            .transition(f.owner, order.id, Transition::Deliver, t0)
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::Transition(TransitionError::NotSent)));

        service
            .transition(f.owner, order.id, Transition::Send, t0 + Duration::minutes(10))
            .await
            .unwrap();
        let delivered = service
            .transition(f.owner, order.id, Transition::Deliver, t0 + Duration::minutes(40))
            .await
            .unwrap();
        assert_eq!(delivered.status(), OrderStatus::Delivered);

        let restaurant = f.store.get_restaurant(f.restaurant).await.unwrap().unwrap();
        assert_eq!(restaurant.average_service_minutes, Some(40.0));
    }

    #[tokio::test]
    async fn test_only_restaurant_owner_transitions() {
        let f = fixture().await;
        let order = place(&f, &[(f.croquetas, 1)]).await;
        let service = OrderService::new(&f.store);

        for caller in [f.customer, f.other_owner] {
            let err = service
                .transition(caller, order.id, Transition::Confirm, now())
                .await
                .unwrap_err();
            assert!(matches!(err, OrderError::Forbidden(_)));
        }

        let err = service
            .transition(f.owner, OrderId::new(404), Transition::Confirm, now())
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_price_change_leaves_orders_untouched() {
        let f = fixture().await;
        let order = place(&f, &[(f.croquetas, 2)]).await;

        f.store
            .update_product_price(f.croquetas, Money::from_cents(900))
            .await
            .unwrap();

        let reloaded = OrderService::new(&f.store)
            .get(f.customer, order.id)
            .await
            .unwrap()
            .order;
        assert_eq!(reloaded.lines, order.lines);
        assert_eq!(reloaded.price, Money::from_cents(850));
    }

    #[tokio::test]
    async fn test_restaurant_listing_requires_ownership() {
        let f = fixture().await;
        place(&f, &[(f.croquetas, 1)]).await;
        let service = OrderService::new(&f.store);

        let orders = service
            .list_for_restaurant(f.owner, f.restaurant, &OrderFilter::default())
            .await
            .unwrap();
        assert_eq!(orders.len(), 1);

        assert!(matches!(
            service
                .list_for_restaurant(f.owner, f.foreign_restaurant, &OrderFilter::default())
                .await,
            Err(OrderError::Forbidden(_))
        ));
        assert!(matches!(
            service
                .list_for_restaurant(f.owner, RestaurantId::new(404), &OrderFilter::default())
                .await,
            Err(OrderError::RestaurantNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_customer_listing_is_newest_first() {
        let f = fixture().await;
        let service = OrderService::new(&f.store);
        let first = service
            .place(f.customer, request(f.restaurant, &[(f.croquetas, 1)]), now())
            .await
            .unwrap();
        let second = service
            .place(
                f.customer,
                request(f.restaurant, &[(f.croquetas, 1)]),
                now() + Duration::hours(1),
            )
            .await
            .unwrap();

        let orders = service.list_for_customer(f.customer).await.unwrap();
        let ids: Vec<OrderId> = orders.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);

        assert!(service.list_for_customer(f.other_customer).await.unwrap().is_empty());
        assert!(matches!(
            service.list_for_customer(f.owner).await,
            Err(OrderError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_analytics_for_owner_only() {
        let f = fixture().await;
        place(&f, &[(f.croquetas, 2)]).await;
        let service = OrderService::new(&f.store);

        let analytics = service.analytics(f.owner, f.restaurant, now()).await.unwrap();
        assert_eq!(analytics.num_pending_orders, 1);
        assert_eq!(analytics.invoiced_today, Money::from_cents(850));

        assert!(matches!(
            service.analytics(f.customer, f.restaurant, now()).await,
            Err(OrderError::Forbidden(_))
        ));
    }
}
