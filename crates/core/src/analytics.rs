//! Per-restaurant daily analytics.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::filter::start_of_day;
use crate::types::{Money, RestaurantId};

/// Day boundaries used by the analytics counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalyticsWindow {
    /// 00:00 UTC yesterday.
    pub yesterday_start: DateTime<Utc>,
    /// 00:00 UTC today.
    pub today_start: DateTime<Utc>,
}

impl AnalyticsWindow {
    /// Window for the UTC day containing `now`.
    #[must_use]
    pub fn at(now: DateTime<Utc>) -> Self {
        let today_start = start_of_day(now.date_naive());
        Self {
            yesterday_start: today_start - Duration::days(1),
            today_start,
        }
    }
}

/// Dashboard counters for one restaurant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantAnalytics {
    pub restaurant_id: RestaurantId,
    /// Orders created yesterday.
    pub num_yesterday_orders: i64,
    /// Orders not yet confirmed, regardless of age.
    pub num_pending_orders: i64,
    /// Orders delivered since 00:00 today.
    pub num_delivered_today_orders: i64,
    /// Sum of prices of orders created today, whatever their status.
    pub invoiced_today: Money,
}

/// Mean service time in minutes, `None` when nothing was delivered.
#[must_use]
pub fn average_service_minutes(intervals: impl IntoIterator<Item = Duration>) -> Option<f64> {
    let (count, total_ms) = intervals
        .into_iter()
        .fold((0_u32, 0_i64), |(count, total), d| {
            (count + 1, total + d.num_milliseconds())
        });

    if count == 0 {
        return None;
    }

    #[allow(clippy::cast_precision_loss)] // service times are far below 2^52 ms
    let mean_ms = total_ms as f64 / f64::from(count);
    Some(mean_ms / 60_000.0)
}
