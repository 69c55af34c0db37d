use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::event_sourcing::Aggregate;
use super::{DeliveryAddress, Order, OrderEvent, OrderItem, OrderPlaced, PricingPolicy};

pub(crate) fn address() -> DeliveryAddress {
    DeliveryAddress {
        full_name: "Ana Reyes".into(),
        email: "ana@example.com".into(),
        phone: "0917".into(),
        ..Default::default()
    }
}

/// A pending order for one line of 2 x 25.00.
pub(crate) fn placed_order() -> Order {
    let now = Utc::now();
    let items = vec![OrderItem {
        product_id: Uuid::new_v4(),
        quantity: 2,
        price: Decimal::new(2500, 2),
    }];
    let event = OrderEvent::Placed(OrderPlaced {
        customer_id: Uuid::new_v4(),
        totals: PricingPolicy::default().quote(&items),
        items,
        delivery_address: address(),
        note: None,
        payment_method: None,
        placed_at: now,
        estimated_delivery: now + Duration::minutes(45),
    });
    // apply_first_event only fails for non-Placed events
    Order::apply_first_event(Uuid::now_v7(), &event).unwrap()
}
