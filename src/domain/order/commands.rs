use serde::Deserialize;
use uuid::Uuid;

use crate::domain::access::{Operation, Role};
use super::errors::OrderError;
use super::value_objects::{DeliveryAddress, OrderStatus};

// ============================================================================
// Order Commands - Represent user intent
// ============================================================================

/// Commands against an existing order.
#[derive(Debug, Clone)]
pub enum OrderCommand {
    RequestDelivery {
        agent_id: Uuid,
    },
    AssignDelivery {
        agent_id: Uuid,
    },
    UpdateStatus {
        status: OrderStatus,
        role: Role,
    },
    CancelOrder {
        requested_by: Uuid,
    },
}

impl OrderCommand {
    pub fn operation(&self) -> Operation {
        match self {
            OrderCommand::RequestDelivery { .. } => Operation::RequestDelivery,
            OrderCommand::AssignDelivery { .. } => Operation::AssignDelivery,
            OrderCommand::UpdateStatus { .. } => Operation::UpdateStatus,
            OrderCommand::CancelOrder { .. } => Operation::CancelOrder,
        }
    }
}

/// Requested line; the price is looked up from the catalog, not trusted from the client.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderLine {
    #[serde(rename = "product")]
    pub product_id: Uuid,
    pub quantity: u32,
}

/// Creates a new order. Not an `OrderCommand` because there is no aggregate yet.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrder {
    pub items: Vec<OrderLine>,
    pub delivery_address: DeliveryAddress,
    #[serde(default)]
    pub note: Option<String>,
    /// Recorded on the order as given; no payment is taken.
    #[serde(default)]
    pub payment_method: Option<String>,
}

impl PlaceOrder {
    pub fn validate(&self) -> Result<(), OrderError> {
        if self.items.is_empty() {
            return Err(OrderError::EmptyItems);
        }
        if let Some(line) = self.items.iter().find(|line| line.quantity == 0) {
            return Err(OrderError::InvalidQuantity(line.quantity));
        }
        self.delivery_address.validate()
    }

    /// The payment method with surrounding whitespace removed; blank means none.
    pub fn payment_method(&self) -> Option<String> {
        self.payment_method
            .as_deref()
            .map(str::trim)
            .filter(|method| !method.is_empty())
            .map(str::to_string)
    }
}
