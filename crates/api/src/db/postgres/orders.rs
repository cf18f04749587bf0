//! Order queries.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use food_delivery_core::analytics::{AnalyticsWindow, RestaurantAnalytics};
use food_delivery_core::filter::OrderFilter;
use food_delivery_core::{
    Money, OrderId, OrderOwnership, OrderTimeline, ProductId, RestaurantId, Transition, UserId,
};

use super::{PgStore, map_constraint};
use crate::db::{OrderRepository, RepositoryError};
use crate::models::{
    CustomerSummary, LineItem, NewOrder, Order, OrderDetail, RestaurantSummary,
};

const ORDER_COLUMNS: &str = "id, customer_id, restaurant_id, address, price, shipping_costs, \
                             created_at, started_at, sent_at, delivered_at";

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    customer_id: UserId,
    restaurant_id: RestaurantId,
    address: String,
    price: Money,
    shipping_costs: Money,
    created_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    sent_at: Option<DateTime<Utc>>,
    delivered_at: Option<DateTime<Utc>>,
}

impl OrderRow {
    fn into_order(self, lines: Vec<LineItem>) -> Result<Order, RepositoryError> {
        let timeline = OrderTimeline {
            started_at: self.started_at,
            sent_at: self.sent_at,
            delivered_at: self.delivered_at,
        };
        if !timeline.is_consistent() {
            return Err(RepositoryError::DataCorruption(format!(
                "order {} has stage timestamps out of order",
                self.id
            )));
        }

        Ok(Order {
            id: self.id,
            customer_id: self.customer_id,
            restaurant_id: self.restaurant_id,
            address: self.address,
            price: self.price,
            shipping_costs: self.shipping_costs,
            created_at: self.created_at,
            timeline,
            lines,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct LineRow {
    order_id: OrderId,
    product_id: ProductId,
    name: String,
    quantity: i32,
    unit_price: Money,
}

#[derive(Debug, sqlx::FromRow)]
struct AnalyticsRow {
    num_yesterday_orders: i64,
    num_pending_orders: i64,
    num_delivered_today_orders: i64,
    invoiced_today: Money,
}

/// Restaurant orders with optional status and creation-time bounds.
///
/// `$2` is the status wire name, matched against which stage timestamps are
/// set.
const RESTAURANT_ORDERS_QUERY: &str = r"
    WHERE restaurant_id = $1
      AND (
        $2::text IS NULL
        OR ($2 = 'pending' AND started_at IS NULL)
        OR ($2 = 'in process' AND started_at IS NOT NULL AND sent_at IS NULL AND delivered_at IS NULL)
        OR ($2 = 'sent' AND sent_at IS NOT NULL AND delivered_at IS NULL)
        OR ($2 = 'delivered' AND delivered_at IS NOT NULL)
      )
      AND ($3::timestamptz IS NULL OR created_at >= $3)
      AND ($4::timestamptz IS NULL OR created_at < $4)
    ORDER BY created_at DESC, id DESC
";

impl PgStore {
    /// Line items of the given orders, grouped by order.
    async fn load_lines(
        &self,
        ids: &[OrderId],
    ) -> Result<HashMap<OrderId, Vec<LineItem>>, RepositoryError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let raw: Vec<i32> = ids.iter().map(OrderId::as_i32).collect();

        let rows = sqlx::query_as::<_, LineRow>(
            r"
            SELECT l.order_id, l.product_id, p.name, l.quantity, l.unit_price
            FROM order_lines l
            JOIN products p ON p.id = l.product_id
            WHERE l.order_id = ANY($1)
            ORDER BY l.order_id, l.position
            ",
        )
        .bind(raw)
        .fetch_all(self.pool())
        .await?;

        let mut grouped: HashMap<OrderId, Vec<LineItem>> = HashMap::new();
        for row in rows {
            let quantity = u32::try_from(row.quantity).map_err(|_| {
                RepositoryError::DataCorruption(format!(
                    "order {} has a negative quantity for product {}",
                    row.order_id, row.product_id
                ))
            })?;
            grouped.entry(row.order_id).or_default().push(LineItem {
                product_id: row.product_id,
                name: row.name,
                quantity,
                unit_price: row.unit_price,
            });
        }
        Ok(grouped)
    }

    /// Attach line items to order rows, keeping row order.
    async fn hydrate(&self, rows: Vec<OrderRow>) -> Result<Vec<Order>, RepositoryError> {
        let ids: Vec<OrderId> = rows.iter().map(|r| r.id).collect();
        let mut lines = self.load_lines(&ids).await?;

        rows.into_iter()
            .map(|row| {
                let items = lines.remove(&row.id).unwrap_or_default();
                row.into_order(items)
            })
            .collect()
    }
}

#[async_trait]
impl OrderRepository for PgStore {
    async fn create_order(&self, order: NewOrder) -> Result<OrderId, RepositoryError> {
        let mut tx = self.pool().begin().await?;

        let id: OrderId = sqlx::query_scalar(
            r"
            INSERT INTO orders (customer_id, restaurant_id, address, price, shipping_costs, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            ",
        )
        .bind(order.customer_id)
        .bind(order.restaurant_id)
        .bind(&order.address)
        .bind(order.price.total)
        .bind(order.price.shipping_costs)
        .bind(order.placed_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_constraint)?;

        for (position, line) in order.lines.iter().enumerate() {
            let position = i32::try_from(position)
                .map_err(|_| RepositoryError::Conflict("too many order lines".to_owned()))?;
            let quantity = i32::try_from(line.quantity)
                .map_err(|_| RepositoryError::Conflict("value out of range".to_owned()))?;

            sqlx::query(
                r"
                INSERT INTO order_lines (order_id, product_id, position, quantity, unit_price)
                VALUES ($1, $2, $3, $4, $5)
                ",
            )
            .bind(id)
            .bind(line.product_id)
            .bind(position)
            .bind(quantity)
            .bind(line.unit_price)
            .execute(&mut *tx)
            .await
            .map_err(map_constraint)?;
        }

        // Dropping `tx` on any early return rolls everything back.
        tx.commit().await?;
        Ok(id)
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn get_order_ownership(
        &self,
        id: OrderId,
    ) -> Result<Option<OrderOwnership>, RepositoryError> {
        let row = sqlx::query_as::<_, (UserId, RestaurantId, UserId)>(
            r"
            SELECT o.customer_id, o.restaurant_id, r.owner_id
            FROM orders o
            JOIN restaurants r ON r.id = o.restaurant_id
            WHERE o.id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(
            |(customer_id, restaurant_id, restaurant_owner_id)| OrderOwnership {
                customer_id,
                restaurant_id,
                restaurant_owner_id,
            },
        ))
    }

    async fn get_order_detail(&self, id: OrderId) -> Result<Option<OrderDetail>, RepositoryError> {
        let Some(order) = self.get_order(id).await? else {
            return Ok(None);
        };

        let restaurant = sqlx::query_as::<_, RestaurantSummary>(
            r"
            SELECT id, name, address, shipping_costs, average_service_minutes
            FROM restaurants
            WHERE id = $1
            ",
        )
        .bind(order.restaurant_id)
        .fetch_one(self.pool())
        .await?;

        let customer = sqlx::query_as::<_, CustomerSummary>(
            r"
            SELECT id, first_name, email
            FROM users
            WHERE id = $1
            ",
        )
        .bind(order.customer_id)
        .fetch_one(self.pool())
        .await?;

        Ok(Some(OrderDetail {
            order,
            restaurant,
            customer,
        }))
    }

    async fn list_customer_orders(&self, customer: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE customer_id = $1 \
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(customer)
        .fetch_all(self.pool())
        .await?;

        self.hydrate(rows).await
    }

    async fn list_restaurant_orders(
        &self,
        restaurant: RestaurantId,
        filter: &OrderFilter,
    ) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders {RESTAURANT_ORDERS_QUERY}"
        ))
        .bind(restaurant)
        .bind(filter.status.map(|status| status.as_str()))
        .bind(filter.created_from())
        .bind(filter.created_before())
        .fetch_all(self.pool())
        .await?;

        self.hydrate(rows).await
    }

    async fn record_transition(
        &self,
        id: OrderId,
        transition: Transition,
        at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let sql = match transition {
            Transition::Confirm => {
                r"
                UPDATE orders SET started_at = $2
                WHERE id = $1 AND started_at IS NULL
                "
            }
            Transition::Send => {
                r"
                UPDATE orders SET sent_at = $2
                WHERE id = $1
                  AND started_at IS NOT NULL AND started_at <= $2
                  AND sent_at IS NULL
                "
            }
            Transition::Deliver => {
                r"
                UPDATE orders SET delivered_at = $2
                WHERE id = $1
                  AND sent_at IS NOT NULL AND sent_at <= $2
                  AND delivered_at IS NULL
                "
            }
        };

        let mut tx = self.pool().begin().await?;
        let result = sqlx::query(sql)
            .bind(id)
            .bind(at)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() != 1 {
            return Ok(false);
        }

        if transition == Transition::Deliver {
            sqlx::query(
                r"
                UPDATE restaurants r
                SET average_service_minutes = (
                    SELECT (EXTRACT(EPOCH FROM AVG(o.delivered_at - o.started_at)) / 60)::DOUBLE PRECISION
                    FROM orders o
                    WHERE o.restaurant_id = r.id
                      AND o.started_at IS NOT NULL
                      AND o.delivered_at IS NOT NULL
                )
                WHERE r.id = (SELECT restaurant_id FROM orders WHERE id = $1)
                ",
            )
            .bind(id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(true)
    }

    async fn restaurant_analytics(
        &self,
        restaurant: RestaurantId,
        window: AnalyticsWindow,
    ) -> Result<RestaurantAnalytics, RepositoryError> {
        let row = sqlx::query_as::<_, AnalyticsRow>(
            r"
            SELECT
                COUNT(*) FILTER (WHERE created_at >= $2 AND created_at < $3) AS num_yesterday_orders,
                COUNT(*) FILTER (WHERE started_at IS NULL) AS num_pending_orders,
                COUNT(*) FILTER (WHERE delivered_at >= $3) AS num_delivered_today_orders,
                COALESCE(SUM(price) FILTER (WHERE created_at >= $3), 0) AS invoiced_today
            FROM orders
            WHERE restaurant_id = $1
            ",
        )
        .bind(restaurant)
        .bind(window.yesterday_start)
        .bind(window.today_start)
        .fetch_one(self.pool())
        .await?;

        Ok(RestaurantAnalytics {
            restaurant_id: restaurant,
            num_yesterday_orders: row.num_yesterday_orders,
            num_pending_orders: row.num_pending_orders,
            num_delivered_today_orders: row.num_delivered_today_orders,
            invoiced_today: Money::new(row.invoiced_today.amount()),
        })
    }
}
