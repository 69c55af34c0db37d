use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::catalog::Product;
use super::StoreError;

// ============================================================================
// Product Catalog - per-product stock ledger
// ============================================================================

#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn get_product(&self, id: Uuid) -> Result<Product, StoreError>;

    /// Atomically add `delta` to the product's stock and return the new level.
    /// Only a negative delta can fail (`InsufficientStock`); restoring never does.
    async fn adjust_stock(&self, id: Uuid, delta: i64) -> Result<u32, StoreError>;

    async fn list_active(&self) -> Result<Vec<Product>, StoreError>;

    /// Every product, active or not.
    async fn count_products(&self) -> Result<usize, StoreError>;

    async fn upsert(&self, product: Product) -> Result<(), StoreError>;
}

#[derive(Default)]
pub struct InMemoryProductCatalog {
    products: RwLock<HashMap<Uuid, Product>>,
}

impl InMemoryProductCatalog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProductCatalog for InMemoryProductCatalog {
    async fn get_product(&self, id: Uuid) -> Result<Product, StoreError> {
        self.products
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    async fn adjust_stock(&self, id: Uuid, delta: i64) -> Result<u32, StoreError> {
        let mut products = self.products.write().await;
        let product = products.get_mut(&id).ok_or(StoreError::NotFound(id))?;

        let next = i64::from(product.stock) + delta;
        if next < 0 {
            return Err(StoreError::InsufficientStock(id));
        }
        product.stock = u32::try_from(next)
            .map_err(|_| StoreError::Backend(format!("stock overflow for product {id}")))?;

        tracing::debug!(product_id = %id, delta, stock = product.stock, "Stock adjusted");
        Ok(product.stock)
    }

    async fn list_active(&self) -> Result<Vec<Product>, StoreError> {
        let mut active: Vec<Product> = self
            .products
            .read()
            .await
            .values()
            .filter(|product| product.is_active)
            .cloned()
            .collect();
        active.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(active)
    }

    async fn count_products(&self) -> Result<usize, StoreError> {
        Ok(self.products.read().await.len())
    }

    async fn upsert(&self, product: Product) -> Result<(), StoreError> {
        self.products.write().await.insert(product.id, product);
        Ok(())
    }
}
