//! Order list filters.
//!
//! Query strings arrive as loose text (`?status=sent&from=2024-01-01`). They
//! are parsed once into an [`OrderFilter`], which storage backends translate
//! into predicates. Days are UTC days.

use chrono::{DateTime, NaiveDate, Utc};

use crate::types::{OrderStatus, OrderTimeline, ValidationErrors};

/// Date format accepted for `from` and `to`.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parsed order filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    /// First day included.
    pub from: Option<NaiveDate>,
    /// Last day included.
    pub to: Option<NaiveDate>,
}

impl OrderFilter {
    /// Parse raw query values. Empty strings count as absent.
    ///
    /// # Errors
    ///
    /// Returns one field error per unparseable value, plus one if the range
    /// is reversed.
    pub fn parse(
        status: Option<&str>,
        from: Option<&str>,
        to: Option<&str>,
    ) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let status = present(status).and_then(|s| match s.parse::<OrderStatus>() {
            Ok(status) => Some(status),
            Err(_) => {
                errors.push(
                    "status",
                    "status must be one of: pending, in process, sent, delivered",
                );
                None
            }
        });

        let mut parse_date = |field: &str, value: Option<&str>| {
            present(value).and_then(|s| match NaiveDate::parse_from_str(s, DATE_FORMAT) {
                Ok(date) => Some(date),
                Err(_) => {
                    errors.push(field, format!("{field} must be a date formatted as YYYY-MM-DD"));
                    None
                }
            })
        };
        let from = parse_date("from", from);
        let to = parse_date("to", to);

        if matches!((from, to), (Some(from), Some(to)) if from > to) {
            errors.push("to", "to must not be earlier than from");
        }

        errors.into_result()?;
        Ok(Self { status, from, to })
    }

    /// Inclusive lower bound on creation time.
    #[must_use]
    pub fn created_from(&self) -> Option<DateTime<Utc>> {
        self.from.map(start_of_day)
    }

    /// Exclusive upper bound on creation time: midnight after the `to` day.
    #[must_use]
    pub fn created_before(&self) -> Option<DateTime<Utc>> {
        self.to
            .map(|to| to.succ_opt().map_or(DateTime::<Utc>::MAX_UTC, start_of_day))
    }

    /// Whether an order passes the filter.
    #[must_use]
    pub fn matches(&self, created_at: DateTime<Utc>, timeline: &OrderTimeline) -> bool {
        self.status.is_none_or(|status| timeline.status() == status)
            && self.created_from().is_none_or(|from| created_at >= from)
            && self.created_before().is_none_or(|before| created_at < before)
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// 00:00 UTC of `date`.
#[must_use]
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}
