use super::value_objects::{OrderItem, OrderStatus};

// ============================================================================
// Stock Reconciliation
// ============================================================================
//
// Stock follows the cancelled / not-cancelled class of an order, so the delta
// is a function of the transition edge, never of the absolute status.
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockAdjustment {
    Unchanged,
    /// Give reserved units back (entering `cancelled`)
    Restore,
    /// Take units again (leaving `cancelled`)
    Reserve,
}

impl StockAdjustment {
    pub fn for_transition(from: OrderStatus, to: OrderStatus) -> Self {
        match (from == OrderStatus::Cancelled, to == OrderStatus::Cancelled) {
            (false, true) => StockAdjustment::Restore,
            (true, false) => StockAdjustment::Reserve,
            _ => StockAdjustment::Unchanged,
        }
    }

    pub fn direction(self) -> &'static str {
        match self {
            StockAdjustment::Unchanged => "unchanged",
            StockAdjustment::Restore => "restore",
            StockAdjustment::Reserve => "reserve",
        }
    }

    /// Signed per-product deltas for the given order lines.
    pub fn deltas(self, items: &[OrderItem]) -> Vec<(uuid::Uuid, i64)> {
        let sign = match self {
            StockAdjustment::Unchanged => return Vec::new(),
            StockAdjustment::Restore => 1,
            StockAdjustment::Reserve => -1,
        };
        items
            .iter()
            .map(|item| (item.product_id, sign * i64::from(item.quantity)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    #[test]
    fn test_edges() {
        use OrderStatus::*;
        assert_eq!(StockAdjustment::for_transition(Pending, Cancelled), StockAdjustment::Restore);
        assert_eq!(StockAdjustment::for_transition(OutForDelivery, Cancelled), StockAdjustment::Restore);
        assert_eq!(StockAdjustment::for_transition(Cancelled, Confirmed), StockAdjustment::Reserve);
        assert_eq!(StockAdjustment::for_transition(Cancelled, Cancelled), StockAdjustment::Unchanged);
        assert_eq!(StockAdjustment::for_transition(Pending, Delivered), StockAdjustment::Unchanged);
    }

    #[test]
    fn test_deltas_sum_to_zero_when_class_is_unchanged() {
        let product = Uuid::new_v4();
        let items = vec![OrderItem { product_id: product, quantity: 2, price: Decimal::ONE }];

        let path = [
            OrderStatus::Pending,
            OrderStatus::Cancelled,
            OrderStatus::Confirmed,
            OrderStatus::Cancelled,
            OrderStatus::Cancelled,
            OrderStatus::Pending,
            OrderStatus::OutForDelivery,
        ];

        let net: i64 = path
            .windows(2)
            .flat_map(|edge| StockAdjustment::for_transition(edge[0], edge[1]).deltas(&items))
            .map(|(_, delta)| delta)
            .sum();

        assert_eq!(net, 0);
    }

    #[test]
    fn test_restore_is_positive_per_item() {
        let items = vec![
            OrderItem { product_id: Uuid::new_v4(), quantity: 2, price: Decimal::ONE },
            OrderItem { product_id: Uuid::new_v4(), quantity: 5, price: Decimal::ONE },
        ];
        let deltas = StockAdjustment::Restore.deltas(&items);
        assert_eq!(deltas.iter().map(|(_, d)| *d).collect::<Vec<_>>(), vec![2, 5]);
        assert!(StockAdjustment::Unchanged.deltas(&items).is_empty());
    }
}
