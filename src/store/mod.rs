// ============================================================================
// Persistence Layer
// ============================================================================
//
// Abstract stores consumed by the lifecycle engine, each with an in-memory
// implementation. Every write that must be atomic is atomic inside the store
// (guarded order swap, per-product stock arithmetic, agent availability).
// Carts are owned by one customer and saved whole.
//
// ============================================================================

pub mod carts;
pub mod catalog;
pub mod notifications;
pub mod orders;
pub mod users;

pub use carts::{CartStore, InMemoryCartStore};
pub use catalog::{InMemoryProductCatalog, ProductCatalog};
pub use notifications::{InMemoryNotificationStore, NotificationInbox};
pub use orders::{InMemoryOrderStore, OrderFilter, OrderStore, Swapped, WriteGuard};
pub use users::{InMemoryUserDirectory, UserDirectory};

use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    #[error("Record not found: {0}")]
    NotFound(Uuid),

    #[error("Insufficient stock for product {0}")]
    InsufficientStock(Uuid),

    #[error("Duplicate record: {0}")]
    Duplicate(Uuid),

    #[error("Backend failure: {0}")]
    Backend(String),
}
