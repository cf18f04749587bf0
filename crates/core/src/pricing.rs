//! Order price computation.
//!
//! The price of an order is fixed once, when it is placed. Unit prices are
//! captured from the catalog at that moment and small orders pay the
//! restaurant's shipping cost.

use rust_decimal::Decimal;

use crate::types::{Money, ProductId};

/// Subtotal at or below which the restaurant's shipping cost is charged.
pub const SHIPPING_THRESHOLD: Money = Money::from_decimal_const(Decimal::from_parts(
    1000, 0, 0, false, 2,
));

/// Largest quantity a single order line can carry.
pub const MAX_QUANTITY: u32 = i32::MAX.unsigned_abs();

/// One line of an order being placed, with the unit price captured from the
/// catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricedLine {
    pub product_id: ProductId,
    pub quantity: u32,
    pub unit_price: Money,
}

impl PricedLine {
    /// Unit price times quantity.
    #[must_use]
    pub fn total(&self) -> Money {
        self.unit_price.times(self.quantity)
    }
}

/// Result of pricing an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceBreakdown {
    /// Sum of line totals.
    pub subtotal: Money,
    /// Shipping charged, zero above the threshold.
    pub shipping_costs: Money,
    /// What the customer pays.
    pub total: Money,
}

/// Price a set of lines for a restaurant charging `restaurant_shipping`.
#[must_use]
pub fn price_order(lines: &[PricedLine], restaurant_shipping: Money) -> PriceBreakdown {
    let subtotal: Money = lines.iter().map(PricedLine::total).sum();
    let shipping_costs = if subtotal <= SHIPPING_THRESHOLD {
        restaurant_shipping
    } else {
        Money::ZERO
    };

    PriceBreakdown {
        subtotal,
        shipping_costs,
        total: subtotal + shipping_costs,
    }
}
