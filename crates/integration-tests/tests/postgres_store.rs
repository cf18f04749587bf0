//! `PgStore` against a real database.
//!
//! These tests need a `PostgreSQL` server reachable through
//! `FOOD_DATABASE_URL`. Migrations are applied on connect.

#![allow(clippy::unwrap_used)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use secrecy::SecretString;

use food_delivery_api::db::{
    CatalogRepository, OrderRepository, PgStore, RepositoryError, UserRepository, create_pool,
};
use food_delivery_api::models::{NewOrder, NewProduct, NewRestaurant, NewUser, Restaurant};
use food_delivery_core::filter::OrderFilter;
use food_delivery_core::pricing::{PricedLine, price_order};
use food_delivery_core::{Money, OrderId, OrderStatus, ProductId, Role, Transition, UserId};

async fn store() -> PgStore {
    let url = std::env::var("FOOD_DATABASE_URL").expect("FOOD_DATABASE_URL must be set");
    let pool = create_pool(&SecretString::from(url)).await.unwrap();
    sqlx::migrate!("../api/migrations").run(&pool).await.unwrap();
    PgStore::new(pool)
}

async fn user(store: &PgStore, role: Role) -> (UserId, String) {
    let token = uuid::Uuid::new_v4().simple().to_string();
    let user = store
        .create_user(&NewUser {
            email: format!("{token}@example.com"),
            first_name: "Test".to_string(),
            role,
            token: token.clone(),
            token_expiration: None,
        })
        .await
        .unwrap();
    (user.id, token)
}

async fn restaurant_with_menu(store: &PgStore, owner: UserId) -> (Restaurant, ProductId) {
    let restaurant = store
        .create_restaurant(&NewRestaurant {
            owner_id: owner,
            name: format!("Test {}", uuid::Uuid::new_v4().simple()),
            description: None,
            address: "Calle Test 1".to_string(),
            shipping_costs: Money::from_cents(250),
        })
        .await
        .unwrap();
    let product = store
        .create_product(&NewProduct {
            restaurant_id: restaurant.id,
            name: "Croquetas".to_string(),
            description: None,
            price: Money::from_cents(300),
        })
        .await
        .unwrap();
    (restaurant, product.id)
}

async fn place(
    store: &PgStore,
    customer: UserId,
    restaurant: &Restaurant,
    product: ProductId,
    placed_at: DateTime<Utc>,
) -> OrderId {
    let lines = vec![PricedLine {
        product_id: product,
        quantity: 1,
        unit_price: Money::from_cents(300),
    }];
    let price = price_order(&lines, restaurant.shipping_costs);
    store
        .create_order(NewOrder {
            customer_id: customer,
            restaurant_id: restaurant.id,
            address: "Plaza Mayor 1".to_string(),
            lines,
            price,
            placed_at,
        })
        .await
        .unwrap()
}

#[tokio::test]
#[ignore = "Requires a migrated PostgreSQL database"]
async fn test_token_lookup() {
    let store = store().await;
    let (id, token) = user(&store, Role::Customer).await;

    let found = store.find_by_token(&token, Utc::now()).await.unwrap().unwrap();
    assert_eq!(found.id, id);
    assert!(store.find_by_token("nope", Utc::now()).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "Requires a migrated PostgreSQL database"]
async fn test_order_round_trip_and_lifecycle() {
    let store = store().await;
    let (customer, _) = user(&store, Role::Customer).await;
    let (owner, _) = user(&store, Role::Owner).await;
    let (restaurant, croquetas) = restaurant_with_menu(&store, owner).await;

    let placed_at = Utc.with_ymd_and_hms(2024, 1, 5, 12, 0, 0).unwrap();
    let lines = vec![PricedLine {
        product_id: croquetas,
        quantity: 2,
        unit_price: Money::from_cents(300),
    }];
    let price = price_order(&lines, restaurant.shipping_costs);
    let id = store
        .create_order(NewOrder {
            customer_id: customer,
            restaurant_id: restaurant.id,
            address: "Plaza Mayor 1".to_string(),
            lines,
            price,
            placed_at,
        })
        .await
        .unwrap();

    let order = store.get_order(id).await.unwrap().unwrap();
    assert_eq!(order.price, Money::from_cents(850));
    assert_eq!(order.shipping_costs, Money::from_cents(250));
    assert_eq!(order.status(), OrderStatus::Pending);
    assert_eq!(order.lines.len(), 1);

    // Sending before confirming is refused by the conditional update.
    assert!(
        !store
            .record_transition(id, Transition::Send, placed_at)
            .await
            .unwrap()
    );

    let step = |minutes| placed_at + Duration::minutes(minutes);
    assert!(store.record_transition(id, Transition::Confirm, step(5)).await.unwrap());
    assert!(!store.record_transition(id, Transition::Confirm, step(6)).await.unwrap());
    assert!(store.record_transition(id, Transition::Send, step(20)).await.unwrap());
    assert!(store.record_transition(id, Transition::Deliver, step(35)).await.unwrap());

    let restaurant = store.get_restaurant(restaurant.id).await.unwrap().unwrap();
    let average = restaurant.average_service_minutes.unwrap();
    assert!((average - 30.0).abs() < 1e-9);

    let filter = OrderFilter::parse(Some("delivered"), Some("2024-01-05"), Some("2024-01-05"))
        .unwrap();
    let delivered = store
        .list_restaurant_orders(restaurant.id, &filter)
        .await
        .unwrap();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].id, id);
}

#[tokio::test]
#[ignore = "Requires a migrated PostgreSQL database"]
async fn test_restaurant_orders_filter_by_status() {
    let store = store().await;
    let (customer, _) = user(&store, Role::Customer).await;
    let (owner, _) = user(&store, Role::Owner).await;
    let (restaurant, croquetas) = restaurant_with_menu(&store, owner).await;

    let t = |hour| Utc.with_ymd_and_hms(2024, 3, 1, hour, 0, 0).unwrap();
    let pending = place(&store, customer, &restaurant, croquetas, t(8)).await;
    let in_process = place(&store, customer, &restaurant, croquetas, t(9)).await;
    let sent = place(&store, customer, &restaurant, croquetas, t(10)).await;
    let delivered = place(&store, customer, &restaurant, croquetas, t(11)).await;

    let steps = [Transition::Confirm, Transition::Send, Transition::Deliver];
    for (id, count) in [(in_process, 1), (sent, 2), (delivered, 3)] {
        for &transition in steps.iter().take(count) {
            assert!(store.record_transition(id, transition, t(12)).await.unwrap());
        }
    }

    for (status, expected) in [
        ("pending", pending),
        ("in process", in_process),
        ("sent", sent),
        ("delivered", delivered),
    ] {
        let filter = OrderFilter::parse(Some(status), None, None).unwrap();
        let orders = store
            .list_restaurant_orders(restaurant.id, &filter)
            .await
            .unwrap();
        let ids: Vec<OrderId> = orders.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![expected], "{status}");
        assert_eq!(orders[0].status().as_str(), status);
    }

    let all = store
        .list_restaurant_orders(restaurant.id, &OrderFilter::default())
        .await
        .unwrap();
    let ids: Vec<OrderId> = all.iter().map(|o| o.id).collect();
    assert_eq!(ids, vec![delivered, sent, in_process, pending]);
}

#[tokio::test]
#[ignore = "Requires a migrated PostgreSQL database"]
async fn test_restaurant_orders_filter_by_day() {
    let store = store().await;
    let (customer, _) = user(&store, Role::Customer).await;
    let (owner, _) = user(&store, Role::Owner).await;
    let (restaurant, croquetas) = restaurant_with_menu(&store, owner).await;

    let at = |d, h, m, s| Utc.with_ymd_and_hms(2024, 1, d, h, m, s).unwrap();
    let fourth = place(&store, customer, &restaurant, croquetas, at(4, 10, 0, 0)).await;
    let fifth_late = place(&store, customer, &restaurant, croquetas, at(5, 23, 59, 59)).await;
    let sixth = place(&store, customer, &restaurant, croquetas, at(6, 0, 0, 0)).await;

    for (from, to, expected) in [
        (None, Some("2024-01-05"), vec![fifth_late, fourth]),
        (Some("2024-01-05"), Some("2024-01-05"), vec![fifth_late]),
        (Some("2024-01-06"), None, vec![sixth]),
    ] {
        let filter = OrderFilter::parse(None, from, to).unwrap();
        let ids: Vec<OrderId> = store
            .list_restaurant_orders(restaurant.id, &filter)
            .await
            .unwrap()
            .iter()
            .map(|o| o.id)
            .collect();
        assert_eq!(ids, expected, "from={from:?} to={to:?}");
    }
}

#[tokio::test]
#[ignore = "Requires a migrated PostgreSQL database"]
async fn test_out_of_range_order_is_a_conflict() {
    let store = store().await;
    let (customer, _) = user(&store, Role::Customer).await;
    let (owner, _) = user(&store, Role::Owner).await;
    let (restaurant, croquetas) = restaurant_with_menu(&store, owner).await;

    let lines = vec![PricedLine {
        product_id: croquetas,
        quantity: 100_000_000,
        unit_price: Money::from_cents(300),
    }];
    let price = price_order(&lines, restaurant.shipping_costs);
    let err = store
        .create_order(NewOrder {
            customer_id: customer,
            restaurant_id: restaurant.id,
            address: "Plaza Mayor 1".to_string(),
            lines,
            price,
            placed_at: Utc::now(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Conflict(_)), "{err:?}");
}
