use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::value_objects::OrderItem;

// ============================================================================
// Pricing
// ============================================================================

/// Money breakdown fixed at placement. `total` never changes afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub delivery_fee: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricingPolicy {
    /// Subtotal at or above which delivery is free
    pub free_delivery_threshold: Decimal,
    pub delivery_fee: Decimal,
    /// Fraction of the subtotal, e.g. 0.05
    pub tax_rate: Decimal,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            free_delivery_threshold: Decimal::from(50),
            delivery_fee: Decimal::from(10),
            tax_rate: Decimal::new(5, 2),
        }
    }
}

impl PricingPolicy {
    pub fn quote(&self, items: &[OrderItem]) -> OrderTotals {
        let subtotal: Decimal = items.iter().map(OrderItem::line_total).sum();
        let delivery_fee = if subtotal >= self.free_delivery_threshold {
            Decimal::ZERO
        } else {
            self.delivery_fee
        };
        let tax = (subtotal * self.tax_rate).round_dp(2);

        OrderTotals {
            subtotal,
            delivery_fee,
            tax,
            total: subtotal + delivery_fee + tax,
        }
    }
}
