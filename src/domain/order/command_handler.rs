use std::sync::Arc;
use std::time::Instant;

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::domain::access::{authorize, Actor, Operation, ResourceOwners};
use crate::event_sourcing::{Aggregate, EventEnvelope};
use crate::metrics::Metrics;
use crate::store::{OrderStore, ProductCatalog, StoreError, Swapped, WriteGuard};

use super::aggregate::Order;
use super::commands::{OrderCommand, PlaceOrder};
use super::errors::OrderError;
use super::events::{OrderEvent, OrderPlaced};
use super::pricing::PricingPolicy;
use super::stock::StockAdjustment;
use super::value_objects::{OrderItem, OrderStatus};

// ============================================================================
// Order Command Handler - the lifecycle engine
// ============================================================================
//
// Orchestrates: Load → Authorize → Aggregate → Stock → CAS → Publish
//
// The aggregate first runs against the loaded copy, which rejects early and
// fixes the stock edge. The store then re-runs the command against the stored
// document under a guard on `status` and `assignedDeliveryBoy`, so concurrent
// bids all land and an assignment never overwrites another one.
//
// Stock taken back when leaving `cancelled` is reserved before the swap and
// released if the swap loses; stock given back when entering `cancelled` is
// restored only after the swap wins, so a lost race never adjusts stock twice.
//
// ============================================================================

/// Minutes between placement and the estimated delivery time.
const ESTIMATED_DELIVERY_MINUTES: i64 = 45;

/// Outbound port for domain events. Publishing never blocks and never fails
/// the transition that produced the event.
pub trait EventPublisher: Send + Sync {
    fn publish(&self, envelope: EventEnvelope<OrderEvent>);
}

pub struct OrderCommandHandler {
    orders: Arc<dyn OrderStore>,
    catalog: Arc<dyn ProductCatalog>,
    pricing: PricingPolicy,
    publisher: Arc<dyn EventPublisher>,
    metrics: Arc<Metrics>,
}

fn stock_error(e: StoreError) -> OrderError {
    match e {
        StoreError::NotFound(product_id) => OrderError::ProductNotFound(product_id),
        other => other.into(),
    }
}

impl OrderCommandHandler {
    pub fn new(
        orders: Arc<dyn OrderStore>,
        catalog: Arc<dyn ProductCatalog>,
        pricing: PricingPolicy,
        publisher: Arc<dyn EventPublisher>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            orders,
            catalog,
            pricing,
            publisher,
            metrics,
        }
    }

    // ========================================================================
    // Public operations
    // ========================================================================

    pub async fn place_order(&self, actor: &Actor, command: PlaceOrder) -> Result<Order, OrderError> {
        let started = Instant::now();
        let result = self.try_place_order(actor, command).await;
        self.finish(Operation::PlaceOrder, actor, None, started, result)
    }

    pub async fn request_delivery(&self, actor: &Actor, order_id: Uuid) -> Result<Order, OrderError> {
        self.handle(actor, order_id, OrderCommand::RequestDelivery { agent_id: actor.id })
            .await
    }

    pub async fn assign_delivery(&self, actor: &Actor, order_id: Uuid, agent_id: Uuid) -> Result<Order, OrderError> {
        self.handle(actor, order_id, OrderCommand::AssignDelivery { agent_id })
            .await
    }

    /// Parses the raw status first so unknown names fail with `InvalidStatus`.
    pub async fn update_status(&self, actor: &Actor, order_id: Uuid, status: &str) -> Result<Order, OrderError> {
        let status = match status.parse::<OrderStatus>() {
            Ok(status) => status,
            Err(e) => {
                self.metrics.record_rejection(e.kind());
                return Err(e);
            }
        };
        self.handle(actor, order_id, OrderCommand::UpdateStatus { status, role: actor.role })
            .await
    }

    pub async fn cancel_order(&self, actor: &Actor, order_id: Uuid) -> Result<Order, OrderError> {
        self.handle(actor, order_id, OrderCommand::CancelOrder { requested_by: actor.id })
            .await
    }

    /// Run one command against an existing order.
    pub async fn handle(&self, actor: &Actor, order_id: Uuid, command: OrderCommand) -> Result<Order, OrderError> {
        let started = Instant::now();
        let operation = command.operation();
        let result = self.execute(actor, order_id, command).await;
        self.finish(operation, actor, Some(order_id), started, result)
    }

    // ========================================================================
    // Placement
    // ========================================================================

    async fn try_place_order(&self, actor: &Actor, command: PlaceOrder) -> Result<Order, OrderError> {
        authorize(actor, Operation::PlaceOrder, &ResourceOwners::none())?;
        command.validate()?;

        let mut items = Vec::with_capacity(command.items.len());
        for line in &command.items {
            let product = self
                .catalog
                .get_product(line.product_id)
                .await
                .map_err(stock_error)?;
            if !product.is_active {
                return Err(OrderError::ProductUnavailable(product.id));
            }
            items.push(OrderItem {
                product_id: product.id,
                quantity: line.quantity,
                price: product.price,
            });
        }

        let placed_at = Utc::now();
        let payment_method = command.payment_method();
        let event = OrderEvent::Placed(OrderPlaced {
            customer_id: actor.id,
            totals: self.pricing.quote(&items),
            items,
            delivery_address: command.delivery_address,
            note: command.note,
            payment_method,
            placed_at,
            estimated_delivery: placed_at + Duration::minutes(ESTIMATED_DELIVERY_MINUTES),
        });
        let order = Order::apply_first_event(Uuid::now_v7(), &event)?;

        let reserved_items = order.items.clone();
        self.reserve_stock(&reserved_items).await?;
        let saved = match self.orders.insert(order).await {
            Ok(saved) => saved,
            Err(e) => {
                self.release_stock(&reserved_items).await;
                return Err(e.into());
            }
        };

        tracing::info!(
            order_id = %saved.id,
            customer_id = %saved.customer_id,
            total = %saved.totals.total,
            "Order placed"
        );
        self.metrics.record_order_placed();
        self.publish(actor, saved.id, 0, vec![event]);

        Ok(saved)
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    async fn execute(&self, actor: &Actor, order_id: Uuid, command: OrderCommand) -> Result<Order, OrderError> {
        let current = self.orders.get(order_id).await?;
        authorize(actor, command.operation(), &current.owners())?;

        let planned = current.handle_command(&command)?;
        if planned.is_empty() {
            tracing::debug!(order_id = %order_id, status = %current.status, "No change");
            return Ok(current);
        }

        let mut next = current.clone();
        next.apply_all(&planned)?;
        let adjustment = StockAdjustment::for_transition(current.status, next.status);

        if adjustment == StockAdjustment::Reserve {
            self.reserve_stock(&current.items).await?;
        }

        let guard = WriteGuard::of(&current);
        let Swapped { order: saved, events } =
            match self.orders.compare_and_swap(order_id, guard, &command).await {
                Ok(swapped) => swapped,
                Err(e) => {
                    if adjustment == StockAdjustment::Reserve {
                        self.release_stock(&current.items).await;
                    }
                    return Err(e);
                }
            };

        if adjustment == StockAdjustment::Restore {
            self.restore_stock(order_id, &saved.items).await;
        }

        if current.status != saved.status {
            self.metrics
                .record_transition(current.status.as_str(), saved.status.as_str());
            tracing::info!(
                order_id = %order_id,
                from = %current.status,
                to = %saved.status,
                actor_id = %actor.id,
                role = %actor.role,
                "Order status changed"
            );
        }
        for event in &events {
            match event {
                OrderEvent::DeliveryRequested(_) => self.metrics.record_delivery_request(),
                OrderEvent::DeliveryAssigned(_) => self.metrics.record_assignment(),
                _ => {}
            }
        }

        let base_version = saved.version - events.len() as i64;
        self.publish(actor, order_id, base_version, events);
        Ok(saved)
    }

    // ========================================================================
    // Stock
    // ========================================================================

    /// All-or-nothing: a failed line releases the lines reserved before it.
    async fn reserve_stock(&self, items: &[OrderItem]) -> Result<(), OrderError> {
        let mut reserved = Vec::with_capacity(items.len());
        for (product_id, delta) in StockAdjustment::Reserve.deltas(items) {
            if let Err(e) = self.catalog.adjust_stock(product_id, delta).await {
                self.undo(&reserved).await;
                return Err(stock_error(e));
            }
            reserved.push((product_id, delta));
        }
        self.metrics
            .record_stock_adjustment(StockAdjustment::Reserve.direction(), reserved.len());
        Ok(())
    }

    /// Compensates a reservation whose order write did not happen.
    async fn release_stock(&self, items: &[OrderItem]) {
        self.undo(&StockAdjustment::Reserve.deltas(items)).await;
    }

    /// Runs after the cancellation is committed. A line that cannot be
    /// restored is logged and counted; the transition itself stands.
    async fn restore_stock(&self, order_id: Uuid, items: &[OrderItem]) {
        let deltas = StockAdjustment::Restore.deltas(items);
        let mut failed = 0;
        for (product_id, delta) in &deltas {
            if let Err(e) = self.catalog.adjust_stock(*product_id, *delta).await {
                failed += 1;
                tracing::error!(
                    order_id = %order_id,
                    product_id = %product_id,
                    delta = *delta,
                    error = %e,
                    "Failed to restore stock for cancelled order"
                );
            }
        }
        self.metrics
            .record_stock_adjustment(StockAdjustment::Restore.direction(), deltas.len() - failed);
        if failed > 0 {
            self.metrics.record_stock_restore_failure(failed);
        }
    }

    async fn undo(&self, applied: &[(Uuid, i64)]) {
        for (product_id, delta) in applied {
            if let Err(e) = self.catalog.adjust_stock(*product_id, -delta).await {
                tracing::error!(
                    product_id = %product_id,
                    delta = -delta,
                    error = %e,
                    "Failed to roll back stock reservation"
                );
            }
        }
    }

    // ========================================================================
    // Bookkeeping
    // ========================================================================

    fn publish(&self, actor: &Actor, order_id: Uuid, base_version: i64, events: Vec<OrderEvent>) {
        let correlation_id = Uuid::new_v4();
        for (offset, event) in (1..).zip(events) {
            let envelope = EventEnvelope::new(order_id, base_version + offset, event, correlation_id)
                .with_user(actor.id);
            self.publisher.publish(envelope);
        }
    }

    fn finish(
        &self,
        operation: Operation,
        actor: &Actor,
        order_id: Option<Uuid>,
        started: Instant,
        result: Result<Order, OrderError>,
    ) -> Result<Order, OrderError> {
        self.metrics
            .observe_command(operation.as_str(), started.elapsed().as_secs_f64());

        if let Err(e) = &result {
            self.metrics.record_rejection(e.kind());
            match e {
                OrderError::Store(_) => tracing::error!(
                    operation = operation.as_str(),
                    order_id = ?order_id,
                    actor_id = %actor.id,
                    error = %e,
                    "Lifecycle command failed"
                ),
                _ => tracing::warn!(
                    operation = operation.as_str(),
                    order_id = ?order_id,
                    actor_id = %actor.id,
                    error = %e,
                    "Lifecycle command rejected"
                ),
            }
        }
        result
    }
}
