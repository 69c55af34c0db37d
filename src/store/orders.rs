use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::order::{Order, OrderCommand, OrderError, OrderEvent, OrderStatus};
use crate::event_sourcing::Aggregate;
use super::StoreError;

// ============================================================================
// Order Store - conditionally updated document store
// ============================================================================

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Insert a new order; the stored copy gets version 1.
    async fn insert(&self, order: Order) -> Result<Order, StoreError>;

    async fn get(&self, id: Uuid) -> Result<Order, StoreError>;

    /// Run `command` against the stored order and persist the events it emits,
    /// as one atomic step.
    ///
    /// Fails with the command's own rejection when the stored order no longer
    /// allows it, and with `Conflict` when the command is still legal but
    /// `guard` no longer holds. Each event bumps the version by one.
    async fn compare_and_swap(
        &self,
        id: Uuid,
        guard: WriteGuard,
        command: &OrderCommand,
    ) -> Result<Swapped, OrderError>;

    /// Matching orders, newest first.
    async fn find(&self, filter: &OrderFilter) -> Result<Vec<Order>, StoreError>;
}

/// The fields a conditional write expects to find unchanged. Stock moved for
/// a transition edge was computed from exactly these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteGuard {
    pub status: OrderStatus,
    pub assigned_delivery_boy: Option<Uuid>,
}

impl WriteGuard {
    pub fn of(order: &Order) -> Self {
        Self {
            status: order.status,
            assigned_delivery_boy: order.assigned_delivery_boy,
        }
    }

    pub fn holds(&self, order: &Order) -> bool {
        order.status == self.status && order.assigned_delivery_boy == self.assigned_delivery_boy
    }
}

/// Outcome of a successful conditional write.
#[derive(Debug, Clone)]
pub struct Swapped {
    pub order: Order,
    /// Events as emitted against the stored document; empty for a no-op.
    pub events: Vec<OrderEvent>,
}

#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub customer_id: Option<Uuid>,
    pub statuses: Option<Vec<OrderStatus>>,
    pub assigned_to: Option<Uuid>,
    pub unassigned_only: bool,
    pub with_pending_requests: bool,
    /// Inclusive lower bound on `created_at`.
    pub created_from: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `created_at`.
    pub created_until: Option<DateTime<Utc>>,
}

impl OrderFilter {
    pub fn matches(&self, order: &Order) -> bool {
        if self.customer_id.is_some_and(|id| id != order.customer_id) {
            return false;
        }
        if let Some(statuses) = &self.statuses {
            if !statuses.contains(&order.status) {
                return false;
            }
        }
        if self.assigned_to.is_some() && self.assigned_to != order.assigned_delivery_boy {
            return false;
        }
        if self.unassigned_only && order.assigned_delivery_boy.is_some() {
            return false;
        }
        if self.with_pending_requests && !order.has_pending_requests() {
            return false;
        }
        if self.created_from.is_some_and(|from| order.created_at < from) {
            return false;
        }
        if self.created_until.is_some_and(|until| order.created_at >= until) {
            return false;
        }
        true
    }
}

#[derive(Default)]
pub struct InMemoryOrderStore {
    orders: RwLock<HashMap<Uuid, Order>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert(&self, mut order: Order) -> Result<Order, StoreError> {
        let mut orders = self.orders.write().await;
        if orders.contains_key(&order.id) {
            return Err(StoreError::Duplicate(order.id));
        }
        order.version = 1;
        orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn get(&self, id: Uuid) -> Result<Order, StoreError> {
        self.orders
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    async fn compare_and_swap(
        &self,
        id: Uuid,
        guard: WriteGuard,
        command: &OrderCommand,
    ) -> Result<Swapped, OrderError> {
        let mut orders = self.orders.write().await;
        let current = orders.get_mut(&id).ok_or(OrderError::NotFound(id))?;

        // Rejections against the stored state win over a plain guard mismatch
        let events = current.handle_command(command)?;
        if !guard.holds(current) {
            tracing::debug!(
                order_id = %id,
                expected = %guard.status,
                actual = %current.status,
                "Order changed under a conditional write"
            );
            return Err(OrderError::Conflict);
        }
        if events.is_empty() {
            return Ok(Swapped { order: current.clone(), events });
        }

        let mut next = current.clone();
        next.apply_all(&events)?;
        next.version = current.version + events.len() as i64;
        *current = next.clone();

        tracing::debug!(order_id = %id, version = next.version, "Order document swapped");
        Ok(Swapped { order: next, events })
    }

    async fn find(&self, filter: &OrderFilter) -> Result<Vec<Order>, StoreError> {
        let mut matching: Vec<Order> = self
            .orders
            .read()
            .await
            .values()
            .filter(|order| filter.matches(order))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matching)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::access::Role;
    use crate::domain::order::fixtures::placed_order;

    fn set_status(status: OrderStatus) -> OrderCommand {
        OrderCommand::UpdateStatus { status, role: Role::Admin }
    }

    #[tokio::test]
    async fn test_insert_sets_first_version() {
        let store = InMemoryOrderStore::new();
        let stored = store.insert(placed_order()).await.unwrap();

        assert_eq!(stored.version, 1);
        assert_eq!(store.get(stored.id).await.unwrap().version, 1);
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_id() {
        let store = InMemoryOrderStore::new();
        let order = placed_order();
        store.insert(order.clone()).await.unwrap();

        assert_eq!(store.insert(order.clone()).await.unwrap_err(), StoreError::Duplicate(order.id));
    }

    #[tokio::test]
    async fn test_compare_and_swap_detects_moved_status() {
        let store = InMemoryOrderStore::new();
        let stored = store.insert(placed_order()).await.unwrap();
        let guard = WriteGuard::of(&stored);

        let swapped = store
            .compare_and_swap(stored.id, guard, &set_status(OrderStatus::Confirmed))
            .await
            .unwrap();
        assert_eq!(swapped.order.version, 2);
        assert_eq!(swapped.events.len(), 1);

        // still legal for an admin, but the edge it was planned on is gone
        let err = store
            .compare_and_swap(stored.id, guard, &set_status(OrderStatus::Cancelled))
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::Conflict));
        assert_eq!(store.get(stored.id).await.unwrap().status, OrderStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_bids_from_a_stale_read_both_land() {
        let store = InMemoryOrderStore::new();
        let stored = store.insert(placed_order()).await.unwrap();
        let guard = WriteGuard::of(&stored);
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

        store
            .compare_and_swap(stored.id, guard, &OrderCommand::RequestDelivery { agent_id: a })
            .await
            .unwrap();
        let second = store
            .compare_and_swap(stored.id, guard, &OrderCommand::RequestDelivery { agent_id: b })
            .await
            .unwrap();

        assert_eq!(second.order.version, 3);
        assert_eq!(second.order.delivery_requests.len(), 2);
        assert!(matches!(
            store
                .compare_and_swap(stored.id, guard, &OrderCommand::RequestDelivery { agent_id: a })
                .await,
            Err(OrderError::DuplicateRequest)
        ));
    }

    #[tokio::test]
    async fn test_assignment_events_are_built_from_the_stored_bids() {
        let store = InMemoryOrderStore::new();
        let stored = store.insert(placed_order()).await.unwrap();
        let guard = WriteGuard::of(&stored);
        let (a, late) = (Uuid::new_v4(), Uuid::new_v4());

        store
            .compare_and_swap(stored.id, guard, &OrderCommand::RequestDelivery { agent_id: a })
            .await
            .unwrap();
        store
            .compare_and_swap(stored.id, guard, &OrderCommand::RequestDelivery { agent_id: late })
            .await
            .unwrap();
        let swapped = store
            .compare_and_swap(stored.id, guard, &OrderCommand::AssignDelivery { agent_id: a })
            .await
            .unwrap();

        match &swapped.events[0] {
            OrderEvent::DeliveryAssigned(e) => assert_eq!(e.rejected_agents, vec![late]),
            other => panic!("unexpected event {other:?}"),
        }
        assert!(matches!(
            store
                .compare_and_swap(stored.id, guard, &OrderCommand::AssignDelivery { agent_id: late })
                .await,
            Err(OrderError::AlreadyAssigned)
        ));
    }

    #[tokio::test]
    async fn test_missing_order() {
        let store = InMemoryOrderStore::new();
        let id = Uuid::new_v4();
        assert_eq!(store.get(id).await.unwrap_err(), StoreError::NotFound(id));
        assert!(matches!(
            store
                .compare_and_swap(id, WriteGuard::of(&placed_order()), &set_status(OrderStatus::Served))
                .await,
            Err(OrderError::NotFound(missing)) if missing == id
        ));
    }

    #[tokio::test]
    async fn test_find_filters_and_sorts_newest_first() {
        let store = InMemoryOrderStore::new();
        let older = placed_order();
        let mut newer = placed_order();
        newer.created_at = older.created_at + chrono::Duration::seconds(5);
        newer.customer_id = older.customer_id;
        let mut other = placed_order();
        other.status = OrderStatus::Delivered;

        store.insert(older.clone()).await.unwrap();
        store.insert(newer.clone()).await.unwrap();
        store.insert(other.clone()).await.unwrap();

        let mine = store
            .find(&OrderFilter { customer_id: Some(older.customer_id), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(mine.iter().map(|o| o.id).collect::<Vec<_>>(), vec![newer.id, older.id]);

        let delivered = store
            .find(&OrderFilter { statuses: Some(vec![OrderStatus::Delivered]), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].id, other.id);
    }

    #[tokio::test]
    async fn test_find_by_creation_window() {
        let store = InMemoryOrderStore::new();
        let inside = placed_order();
        let mut before = placed_order();
        before.created_at = inside.created_at - chrono::Duration::days(1);
        store.insert(inside.clone()).await.unwrap();
        store.insert(before).await.unwrap();

        let window = OrderFilter {
            created_from: Some(inside.created_at - chrono::Duration::hours(1)),
            created_until: Some(inside.created_at + chrono::Duration::hours(1)),
            ..Default::default()
        };
        let found = store.find(&window).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, inside.id);
    }
}
