use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};

use crate::domain::access::Role;
use crate::event_sourcing::DomainEvent;
use super::pricing::OrderTotals;
use super::value_objects::{DeliveryAddress, OrderItem, OrderStatus};

// ============================================================================
// Order Events - one per lifecycle transition
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OrderEvent {
    Placed(OrderPlaced),
    DeliveryRequested(DeliveryRequested),
    DeliveryAssigned(DeliveryAssigned),
    StatusChanged(OrderStatusChanged),
    Cancelled(OrderCancelled),
}

impl DomainEvent for OrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::Placed(_) => "OrderPlaced",
            OrderEvent::DeliveryRequested(_) => "DeliveryRequested",
            OrderEvent::DeliveryAssigned(_) => "DeliveryAssigned",
            OrderEvent::StatusChanged(_) => "OrderStatusChanged",
            OrderEvent::Cancelled(_) => "OrderCancelled",
        }
    }
}

/// Order Placed - initial event in the order lifecycle
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct OrderPlaced {
    pub customer_id: Uuid,
    pub items: Vec<OrderItem>,
    pub delivery_address: DeliveryAddress,
    pub note: Option<String>,
    pub payment_method: Option<String>,
    pub totals: OrderTotals,
    pub placed_at: DateTime<Utc>,
    pub estimated_delivery: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct DeliveryRequested {
    pub agent_id: Uuid,
    pub requested_at: DateTime<Utc>,
}

/// The winning bid; every other bidder is listed in `rejected_agents`.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct DeliveryAssigned {
    pub agent_id: Uuid,
    pub rejected_agents: Vec<Uuid>,
    pub previous_status: OrderStatus,
    pub assigned_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct OrderStatusChanged {
    pub from: OrderStatus,
    pub to: OrderStatus,
    pub changed_by: Role,
    pub customer_id: Uuid,
    pub assigned_agent: Option<Uuid>,
    pub changed_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct OrderCancelled {
    pub cancelled_by: Uuid,
    pub previous_status: OrderStatus,
    pub cancelled_at: DateTime<Utc>,
}
