// ============================================================================
// Order Domain - Business Logic for the Order Aggregate
// ============================================================================
//
// - Value objects (OrderItem, OrderStatus, DeliveryRequest)
// - Events (OrderPlaced, DeliveryAssigned, etc.)
// - Commands (RequestDelivery, AssignDelivery, etc.)
// - Errors (OrderError enum)
// - Aggregate (Order with the transition rules)
// - Pricing and stock reconciliation
// - Command Handler (the lifecycle engine) and read-side queries
//
// ============================================================================

pub mod value_objects;
pub mod events;
pub mod commands;
pub mod errors;
pub mod aggregate;
pub mod pricing;
pub mod stock;
pub mod command_handler;
pub mod queries;

pub use value_objects::*;
pub use events::*;
pub use commands::*;
pub use errors::*;
pub use aggregate::*;
pub use pricing::*;
pub use stock::*;
pub use command_handler::*;
pub use queries::*;

#[cfg(test)]
pub(crate) mod fixtures;
