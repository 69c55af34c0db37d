use uuid::Uuid;

use crate::domain::access::{Operation, Role};
use crate::store::StoreError;
use super::value_objects::OrderStatus;

// ============================================================================
// Order Business Rule Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Order not found: {0}")]
    NotFound(Uuid),

    #[error("Operation not allowed while order is {0}")]
    InvalidState(OrderStatus),

    #[error("Order is already assigned to a delivery person")]
    AlreadyAssigned,

    #[error("Delivery already requested by this agent")]
    DuplicateRequest,

    #[error("Delivery person has not requested this order")]
    NotRequested,

    #[error("Only the customer who placed the order may do this")]
    NotOwner,

    #[error("Invalid status: {0:?}")]
    InvalidStatus(String),

    #[error("Insufficient stock for product {0}")]
    InsufficientStock(Uuid),

    #[error("Order items cannot be empty")]
    EmptyItems,

    #[error("Invalid item quantity: {0}")]
    InvalidQuantity(u32),

    #[error("Delivery address field is required: {0}")]
    MissingAddressField(&'static str),

    #[error("Product not found: {0}")]
    ProductNotFound(Uuid),

    #[error("Product is not available: {0}")]
    ProductUnavailable(Uuid),

    #[error("Role {role} may not perform {operation:?}")]
    Forbidden { role: Role, operation: Operation },

    #[error("Order was modified concurrently")]
    Conflict,

    #[error("Store failure: {0}")]
    Store(String),
}

impl OrderError {
    /// Stable label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            OrderError::NotFound(_) => "not_found",
            OrderError::InvalidState(_) => "invalid_state",
            OrderError::AlreadyAssigned => "already_assigned",
            OrderError::DuplicateRequest => "duplicate_request",
            OrderError::NotRequested => "not_requested",
            OrderError::NotOwner => "not_owner",
            OrderError::InvalidStatus(_) => "invalid_status",
            OrderError::InsufficientStock(_) => "insufficient_stock",
            OrderError::EmptyItems
            | OrderError::InvalidQuantity(_)
            | OrderError::MissingAddressField(_) => "validation",
            OrderError::ProductNotFound(_) | OrderError::ProductUnavailable(_) => "product",
            OrderError::Forbidden { .. } => "forbidden",
            OrderError::Conflict => "conflict",
            OrderError::Store(_) => "store",
        }
    }
}

impl From<StoreError> for OrderError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => OrderError::NotFound(id),
            StoreError::InsufficientStock(id) => OrderError::InsufficientStock(id),
            other => OrderError::Store(other.to_string()),
        }
    }
}
