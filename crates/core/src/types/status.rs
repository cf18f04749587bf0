//! Order lifecycle.
//!
//! An order moves through four states, each entered by stamping one timestamp:
//!
//! ```text
//! Pending --confirm--> InProcess --send--> Sent --deliver--> Delivered
//!          startedAt             sentAt         deliveredAt
//! ```
//!
//! The timestamps are the persisted representation; [`OrderStatus`] is always
//! derived from them through [`OrderTimeline::status`], and the only way to
//! advance a timeline is [`OrderTimeline::apply`].

use core::fmt;
use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Where an order currently is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Placed by the customer, not yet accepted by the restaurant.
    #[serde(rename = "pending")]
    Pending,
    /// Accepted and being prepared.
    #[serde(rename = "in process")]
    InProcess,
    /// Handed to delivery.
    #[serde(rename = "sent")]
    Sent,
    /// Received by the customer.
    #[serde(rename = "delivered")]
    Delivered,
}

impl OrderStatus {
    /// Wire name, as used in query strings and JSON bodies.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProcess => "in process",
            Self::Sent => "sent",
            Self::Delivered => "delivered",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown status name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown order status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "in process" | "in_process" | "in-process" => Ok(Self::InProcess),
            "sent" => Ok(Self::Sent),
            "delivered" => Ok(Self::Delivered),
            _ => Err(UnknownStatus(s.to_owned())),
        }
    }
}

/// A restaurant-side action that advances an order by one stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transition {
    /// Accept the order; stamps `startedAt`.
    Confirm,
    /// Hand the order to delivery; stamps `sentAt`.
    Send,
    /// Mark the order as received; stamps `deliveredAt`.
    Deliver,
}

impl Transition {
    /// The JSON field this transition stamps.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::Confirm => "startedAt",
            Self::Send => "sentAt",
            Self::Deliver => "deliveredAt",
        }
    }

    /// The status an order is in after this transition.
    #[must_use]
    pub const fn target(&self) -> OrderStatus {
        match self {
            Self::Confirm => OrderStatus::InProcess,
            Self::Send => OrderStatus::Sent,
            Self::Deliver => OrderStatus::Delivered,
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Confirm => "confirm",
            Self::Send => "send",
            Self::Deliver => "deliver",
        })
    }
}

/// Why a transition was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("The order has already been started")]
    AlreadyStarted,
    #[error("The order is not started")]
    NotStarted,
    #[error("The order has already been sent")]
    AlreadySent,
    #[error("The order is not sent")]
    NotSent,
    #[error("The order has already been delivered")]
    AlreadyDelivered,
    /// The clock reads earlier than the previous stage's timestamp.
    #[error("{field} cannot be earlier than the previous stage")]
    BeforePreviousStage { field: &'static str },
}

impl TransitionError {
    /// The field the error should be reported against.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::AlreadyStarted | Self::NotStarted => "startedAt",
            Self::AlreadySent | Self::NotSent => "sentAt",
            Self::AlreadyDelivered => "deliveredAt",
            Self::BeforePreviousStage { field } => *field,
        }
    }
}

/// Stage timestamps of an order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderTimeline {
    pub started_at: Option<DateTime<Utc>>,
    pub sent_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
}

impl OrderTimeline {
    /// Derive the lifecycle status.
    ///
    /// The most advanced stamped stage wins.
    #[must_use]
    pub const fn status(&self) -> OrderStatus {
        if self.delivered_at.is_some() {
            OrderStatus::Delivered
        } else if self.sent_at.is_some() {
            OrderStatus::Sent
        } else if self.started_at.is_some() {
            OrderStatus::InProcess
        } else {
            OrderStatus::Pending
        }
    }

    /// Check that a transition is allowed, without applying it.
    ///
    /// # Errors
    ///
    /// Returns the [`TransitionError`] naming the missing or already-set
    /// stage.
    pub const fn check(&self, transition: Transition) -> Result<(), TransitionError> {
        match transition {
            Transition::Confirm => {
                if self.started_at.is_some() {
                    return Err(TransitionError::AlreadyStarted);
                }
            }
            Transition::Send => {
                if self.started_at.is_none() {
                    return Err(TransitionError::NotStarted);
                }
                if self.sent_at.is_some() {
                    return Err(TransitionError::AlreadySent);
                }
            }
            Transition::Deliver => {
                if self.started_at.is_none() {
                    return Err(TransitionError::NotStarted);
                }
                if self.sent_at.is_none() {
                    return Err(TransitionError::NotSent);
                }
                if self.delivered_at.is_some() {
                    return Err(TransitionError::AlreadyDelivered);
                }
            }
        }
        Ok(())
    }

    /// Stamp the stage for `transition` at `at`.
    ///
    /// # Errors
    ///
    /// Returns an error if the preconditions of the transition do not hold,
    /// or if `at` is earlier than the previous stage's timestamp.
    pub fn apply(self, transition: Transition, at: DateTime<Utc>) -> Result<Self, TransitionError> {
        self.check(transition)?;

        let previous = match transition {
            Transition::Confirm => None,
            Transition::Send => self.started_at,
            Transition::Deliver => self.sent_at,
        };
        if previous.is_some_and(|prev| at < prev) {
            return Err(TransitionError::BeforePreviousStage {
                field: transition.field(),
            });
        }

        let mut next = self;
        match transition {
            Transition::Confirm => next.started_at = Some(at),
            Transition::Send => next.sent_at = Some(at),
            Transition::Deliver => next.delivered_at = Some(at),
        }
        Ok(next)
    }

    /// Whether the stored timestamps respect stage order.
    ///
    /// A later stage may only be set when every earlier one is, and never
    /// with an earlier time.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        fn ordered(earlier: Option<DateTime<Utc>>, later: Option<DateTime<Utc>>) -> bool {
            match (earlier, later) {
                (_, None) => true,
                (None, Some(_)) => false,
                (Some(e), Some(l)) => e <= l,
            }
        }

        ordered(self.started_at, self.sent_at) && ordered(self.sent_at, self.delivered_at)
    }

    /// Start-to-delivery duration, for delivered orders.
    #[must_use]
    pub fn service_time(&self) -> Option<chrono::Duration> {
        Some(self.delivered_at? - self.started_at?)
    }
}
