use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::cart::Cart;
use super::StoreError;

/// One active cart per customer.
#[async_trait]
pub trait CartStore: Send + Sync {
    async fn get(&self, user_id: Uuid) -> Result<Option<Cart>, StoreError>;

    /// Insert or replace the customer's cart.
    async fn save(&self, cart: Cart) -> Result<Cart, StoreError>;
}

#[derive(Default)]
pub struct InMemoryCartStore {
    carts: RwLock<HashMap<Uuid, Cart>>,
}

impl InMemoryCartStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CartStore for InMemoryCartStore {
    async fn get(&self, user_id: Uuid) -> Result<Option<Cart>, StoreError> {
        Ok(self.carts.read().await.get(&user_id).cloned())
    }

    async fn save(&self, cart: Cart) -> Result<Cart, StoreError> {
        self.carts.write().await.insert(cart.user_id, cart.clone());
        Ok(cart)
    }
}
