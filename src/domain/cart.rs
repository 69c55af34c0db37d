use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::access::{can_perform, Actor, Operation, ResourceOwners, Role};
use crate::domain::catalog::Product;
use crate::store::{CartStore, ProductCatalog, StoreError};

// ============================================================================
// Shopping Cart - per-customer basket ahead of placement
// ============================================================================
//
// A cart holds a price snapshot per line and is checked against stock when a
// line changes, but never reserves stock; that happens only at placement.
// Carts are created lazily, so a missing cart behaves like an empty one.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum CartError {
    #[error("Product not found: {0}")]
    ProductNotFound(Uuid),

    #[error("Product is not available: {0}")]
    ProductUnavailable(Uuid),

    #[error("Insufficient stock for product {0}")]
    InsufficientStock(Uuid),

    #[error("Invalid item quantity: {0}")]
    InvalidQuantity(u32),

    #[error("Product is not in the cart: {0}")]
    ItemNotFound(Uuid),

    #[error("Role {0} has no cart")]
    Forbidden(Role),

    #[error("Store failure: {0}")]
    Store(String),
}

impl From<StoreError> for CartError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => CartError::ProductNotFound(id),
            other => CartError::Store(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    #[serde(rename = "product")]
    pub product_id: Uuid,
    pub quantity: u32,
    pub price: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSummary {
    pub total_items: u32,
    pub total_amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    #[serde(rename = "user")]
    pub user_id: Uuid,
    pub items: Vec<CartItem>,
    pub total_items: u32,
    pub total_amount: Decimal,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    pub fn new(user_id: Uuid) -> Self {
        Self {
            user_id,
            items: Vec::new(),
            total_items: 0,
            total_amount: Decimal::ZERO,
            updated_at: Utc::now(),
        }
    }

    pub fn quantity_of(&self, product_id: Uuid) -> u32 {
        self.items
            .iter()
            .find(|item| item.product_id == product_id)
            .map_or(0, |item| item.quantity)
    }

    /// Adds to an existing line or starts a new one; the line takes the
    /// product's current price either way.
    pub fn add_item(&mut self, product: &Product, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity(quantity));
        }
        let wanted = self.quantity_of(product.id) + quantity;
        ensure_orderable(product, wanted)?;

        match self.items.iter_mut().find(|item| item.product_id == product.id) {
            Some(item) => {
                item.quantity = wanted;
                item.price = product.price;
            }
            None => self.items.push(CartItem {
                product_id: product.id,
                quantity,
                price: product.price,
            }),
        }
        self.recalculate();
        Ok(())
    }

    /// Sets a line's quantity; zero removes the line.
    pub fn update_quantity(&mut self, product: &Product, quantity: u32) -> Result<(), CartError> {
        let position = self
            .items
            .iter()
            .position(|item| item.product_id == product.id)
            .ok_or(CartError::ItemNotFound(product.id))?;

        if quantity == 0 {
            self.items.remove(position);
        } else {
            if quantity > product.stock {
                return Err(CartError::InsufficientStock(product.id));
            }
            self.items[position].quantity = quantity;
        }
        self.recalculate();
        Ok(())
    }

    /// Removing a product that is not in the cart is not an error.
    pub fn remove_item(&mut self, product_id: Uuid) {
        self.items.retain(|item| item.product_id != product_id);
        self.recalculate();
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.recalculate();
    }

    pub fn summary(&self) -> CartSummary {
        CartSummary {
            total_items: self.total_items,
            total_amount: self.total_amount,
        }
    }

    fn recalculate(&mut self) {
        self.total_items = self.items.iter().map(|item| item.quantity).sum();
        self.total_amount = self
            .items
            .iter()
            .map(|item| item.price * Decimal::from(item.quantity))
            .sum();
        self.updated_at = Utc::now();
    }
}

fn ensure_orderable(product: &Product, quantity: u32) -> Result<(), CartError> {
    if !product.is_active {
        return Err(CartError::ProductUnavailable(product.id));
    }
    if quantity > product.stock {
        return Err(CartError::InsufficientStock(product.id));
    }
    Ok(())
}

// ============================================================================
// Cart Service
// ============================================================================

pub struct CartService {
    carts: Arc<dyn CartStore>,
    catalog: Arc<dyn ProductCatalog>,
}

impl CartService {
    pub fn new(carts: Arc<dyn CartStore>, catalog: Arc<dyn ProductCatalog>) -> Self {
        Self { carts, catalog }
    }

    pub async fn get_cart(&self, actor: &Actor) -> Result<Cart, CartError> {
        ensure_shopper(actor)?;
        Ok(self
            .carts
            .get(actor.id)
            .await?
            .unwrap_or_else(|| Cart::new(actor.id)))
    }

    pub async fn add_item(&self, actor: &Actor, product_id: Uuid, quantity: u32) -> Result<Cart, CartError> {
        let mut cart = self.get_cart(actor).await?;
        let product = self.catalog.get_product(product_id).await?;
        cart.add_item(&product, quantity)?;

        tracing::debug!(user_id = %actor.id, product_id = %product_id, quantity, "Cart line added");
        Ok(self.carts.save(cart).await?)
    }

    pub async fn update_item(&self, actor: &Actor, product_id: Uuid, quantity: u32) -> Result<Cart, CartError> {
        let mut cart = self.get_cart(actor).await?;
        let product = self.catalog.get_product(product_id).await?;
        cart.update_quantity(&product, quantity)?;
        Ok(self.carts.save(cart).await?)
    }

    pub async fn remove_item(&self, actor: &Actor, product_id: Uuid) -> Result<Cart, CartError> {
        let mut cart = self.get_cart(actor).await?;
        cart.remove_item(product_id);
        Ok(self.carts.save(cart).await?)
    }

    pub async fn clear(&self, actor: &Actor) -> Result<Cart, CartError> {
        let mut cart = self.get_cart(actor).await?;
        cart.clear();
        Ok(self.carts.save(cart).await?)
    }

    pub async fn summary(&self, actor: &Actor) -> Result<CartSummary, CartError> {
        Ok(self.get_cart(actor).await?.summary())
    }
}

fn ensure_shopper(actor: &Actor) -> Result<(), CartError> {
    if can_perform(actor, Operation::ManageCart, &ResourceOwners::none()) {
        Ok(())
    } else {
        Err(CartError::Forbidden(actor.role))
    }
}
