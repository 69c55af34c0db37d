use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::access::{ResourceOwners, Role};
use crate::event_sourcing::Aggregate;
use super::commands::OrderCommand;
use super::errors::OrderError;
use super::events::*;
use super::pricing::OrderTotals;
use super::value_objects::{
    DeliveryAddress, DeliveryRequest, DeliveryRequestStatus, OrderItem, OrderStatus,
};

// ============================================================================
// Order Aggregate - the persisted order document
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    // Identity
    pub id: Uuid,
    pub version: i64,
    #[serde(rename = "user")]
    pub customer_id: Uuid,

    // Contents, fixed at placement
    pub items: Vec<OrderItem>,
    pub delivery_address: DeliveryAddress,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(flatten)]
    pub totals: OrderTotals,

    // Lifecycle
    pub status: OrderStatus,
    pub delivery_requests: Vec<DeliveryRequest>,
    pub assigned_delivery_boy: Option<Uuid>,

    // Audit Trail
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub estimated_delivery: Option<DateTime<Utc>>,
    pub actual_delivery: Option<DateTime<Utc>>,
}

impl Order {
    pub fn owners(&self) -> ResourceOwners {
        ResourceOwners {
            customer: Some(self.customer_id),
            assignee: self.assigned_delivery_boy,
        }
    }

    pub fn request_from(&self, agent_id: Uuid) -> Option<&DeliveryRequest> {
        self.delivery_requests
            .iter()
            .find(|request| request.delivery_boy_id == agent_id)
    }

    pub fn has_pending_requests(&self) -> bool {
        self.delivery_requests
            .iter()
            .any(|request| request.status == DeliveryRequestStatus::Pending)
    }

    /// Request and assignment are only legal while the order is open and unassigned.
    /// An existing assignee is reported before the status, so the loser of an
    /// assignment race always sees `AlreadyAssigned`.
    fn ensure_open_for_dispatch(&self) -> Result<(), OrderError> {
        if self.assigned_delivery_boy.is_some() {
            return Err(OrderError::AlreadyAssigned);
        }
        if !self.status.is_open_for_dispatch() {
            return Err(OrderError::InvalidState(self.status));
        }
        Ok(())
    }

    fn validate_status_change(&self, to: OrderStatus, role: Role) -> Result<(), OrderError> {
        match role {
            Role::Admin => Ok(()),
            // An assigned agent can only close out an order that is on its way
            Role::Delivery if self.status == OrderStatus::OutForDelivery && to.is_completed() => Ok(()),
            _ => Err(OrderError::InvalidState(self.status)),
        }
    }
}

// ============================================================================
// Aggregate Trait Implementation
// ============================================================================

impl Aggregate for Order {
    type Event = OrderEvent;
    type Command = OrderCommand;
    type Error = OrderError;

    fn apply_first_event(id: Uuid, event: &Self::Event) -> Result<Self, Self::Error> {
        match event {
            OrderEvent::Placed(e) => Ok(Self {
                id,
                version: 0,
                customer_id: e.customer_id,
                items: e.items.clone(),
                delivery_address: e.delivery_address.clone(),
                note: e.note.clone(),
                payment_method: e.payment_method.clone(),
                totals: e.totals,
                status: OrderStatus::Pending,
                delivery_requests: Vec::new(),
                assigned_delivery_boy: None,
                created_at: e.placed_at,
                updated_at: e.placed_at,
                estimated_delivery: Some(e.estimated_delivery),
                actual_delivery: None,
            }),
            _ => Err(OrderError::NotFound(id)),
        }
    }

    fn apply_event(&mut self, event: &Self::Event) -> Result<(), Self::Error> {
        match event {
            OrderEvent::Placed(_) => {
                // First event already applied
            }
            OrderEvent::DeliveryRequested(e) => {
                self.delivery_requests.push(DeliveryRequest {
                    delivery_boy_id: e.agent_id,
                    requested_at: e.requested_at,
                    status: DeliveryRequestStatus::Pending,
                });
                self.updated_at = e.requested_at;
            }
            OrderEvent::DeliveryAssigned(e) => {
                self.assigned_delivery_boy = Some(e.agent_id);
                self.status = OrderStatus::OutForDelivery;
                for request in &mut self.delivery_requests {
                    request.status = if request.delivery_boy_id == e.agent_id {
                        DeliveryRequestStatus::Accepted
                    } else {
                        DeliveryRequestStatus::Rejected
                    };
                }
                self.updated_at = e.assigned_at;
            }
            OrderEvent::StatusChanged(e) => {
                self.status = e.to;
                if e.to.is_completed() {
                    self.actual_delivery = Some(e.changed_at);
                }
                self.updated_at = e.changed_at;
            }
            OrderEvent::Cancelled(e) => {
                self.status = OrderStatus::Cancelled;
                self.updated_at = e.cancelled_at;
            }
        }
        Ok(())
    }

    fn handle_command(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            OrderCommand::RequestDelivery { agent_id } => {
                self.ensure_open_for_dispatch()?;
                if self.request_from(*agent_id).is_some() {
                    return Err(OrderError::DuplicateRequest);
                }

                Ok(vec![OrderEvent::DeliveryRequested(DeliveryRequested {
                    agent_id: *agent_id,
                    requested_at: Utc::now(),
                })])
            }

            OrderCommand::AssignDelivery { agent_id } => {
                self.ensure_open_for_dispatch()?;
                match self.request_from(*agent_id) {
                    Some(request) if request.status == DeliveryRequestStatus::Pending => {}
                    _ => return Err(OrderError::NotRequested),
                }

                let rejected_agents = self
                    .delivery_requests
                    .iter()
                    .map(|request| request.delivery_boy_id)
                    .filter(|id| id != agent_id)
                    .collect();

                Ok(vec![OrderEvent::DeliveryAssigned(DeliveryAssigned {
                    agent_id: *agent_id,
                    rejected_agents,
                    previous_status: self.status,
                    assigned_at: Utc::now(),
                })])
            }

            OrderCommand::UpdateStatus { status, role } => {
                if *status == self.status {
                    return Ok(vec![]); // No change
                }
                self.validate_status_change(*status, *role)?;

                Ok(vec![OrderEvent::StatusChanged(OrderStatusChanged {
                    from: self.status,
                    to: *status,
                    changed_by: *role,
                    customer_id: self.customer_id,
                    assigned_agent: self.assigned_delivery_boy,
                    changed_at: Utc::now(),
                })])
            }

            OrderCommand::CancelOrder { requested_by } => {
                if !self.status.is_open_for_dispatch() {
                    return Err(OrderError::InvalidState(self.status));
                }

                Ok(vec![OrderEvent::Cancelled(OrderCancelled {
                    cancelled_by: *requested_by,
                    previous_status: self.status,
                    cancelled_at: Utc::now(),
                })])
            }
        }
    }

    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::fixtures::placed_order;
    use rust_decimal::Decimal;

    fn run(order: &mut Order, command: OrderCommand) -> Result<Vec<OrderEvent>, OrderError> {
        let events = order.handle_command(&command)?;
        order.apply_all(&events)?;
        Ok(events)
    }

    #[test]
    fn test_placed_order_starts_pending() {
        let order = placed_order();
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(order.delivery_requests.is_empty());
        assert!(order.assigned_delivery_boy.is_none());
        assert_eq!(order.totals.total, Decimal::new(5250, 2));
        assert_eq!(order.created_at, order.updated_at);
    }

    #[test]
    fn test_first_event_must_be_placed() {
        let event = OrderEvent::Cancelled(OrderCancelled {
            cancelled_by: Uuid::new_v4(),
            previous_status: OrderStatus::Pending,
            cancelled_at: Utc::now(),
        });
        assert!(Order::apply_first_event(Uuid::new_v4(), &event).is_err());
    }

    #[test]
    fn test_duplicate_delivery_request_is_rejected() {
        let mut order = placed_order();
        let agent = Uuid::new_v4();

        run(&mut order, OrderCommand::RequestDelivery { agent_id: agent }).unwrap();
        let err = run(&mut order, OrderCommand::RequestDelivery { agent_id: agent }).unwrap_err();

        assert!(matches!(err, OrderError::DuplicateRequest));
        assert_eq!(order.delivery_requests.len(), 1);
    }

    #[test]
    fn test_assignment_accepts_one_and_rejects_the_rest() {
        let mut order = placed_order();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

        run(&mut order, OrderCommand::RequestDelivery { agent_id: a }).unwrap();
        run(&mut order, OrderCommand::RequestDelivery { agent_id: b }).unwrap();
        let events = run(&mut order, OrderCommand::AssignDelivery { agent_id: a }).unwrap();

        match &events[0] {
            OrderEvent::DeliveryAssigned(e) => assert_eq!(e.rejected_agents, vec![b]),
            other => panic!("unexpected event {other:?}"),
        }
        assert_eq!(order.status, OrderStatus::OutForDelivery);
        assert_eq!(order.assigned_delivery_boy, Some(a));
        assert_eq!(order.request_from(a).unwrap().status, DeliveryRequestStatus::Accepted);
        assert_eq!(order.request_from(b).unwrap().status, DeliveryRequestStatus::Rejected);

        let err = run(&mut order, OrderCommand::AssignDelivery { agent_id: b }).unwrap_err();
        assert!(matches!(err, OrderError::AlreadyAssigned));
    }

    #[test]
    fn test_dispatch_on_unassigned_closed_order_is_invalid_state() {
        let mut order = placed_order();
        run(&mut order, OrderCommand::UpdateStatus { status: OrderStatus::Served, role: Role::Admin }).unwrap();

        let err = run(&mut order, OrderCommand::RequestDelivery { agent_id: Uuid::new_v4() }).unwrap_err();
        assert!(matches!(err, OrderError::InvalidState(OrderStatus::Served)));
    }

    #[test]
    fn test_assignment_requires_a_bid() {
        let mut order = placed_order();
        let err = run(&mut order, OrderCommand::AssignDelivery { agent_id: Uuid::new_v4() }).unwrap_err();
        assert!(matches!(err, OrderError::NotRequested));
    }

    #[test]
    fn test_request_after_admin_reopens_assigned_order() {
        let mut order = placed_order();
        let a = Uuid::new_v4();
        run(&mut order, OrderCommand::RequestDelivery { agent_id: a }).unwrap();
        run(&mut order, OrderCommand::AssignDelivery { agent_id: a }).unwrap();
        run(&mut order, OrderCommand::UpdateStatus { status: OrderStatus::Confirmed, role: Role::Admin }).unwrap();

        let err = run(&mut order, OrderCommand::RequestDelivery { agent_id: Uuid::new_v4() }).unwrap_err();
        assert!(matches!(err, OrderError::AlreadyAssigned));
    }

    #[test]
    fn test_same_status_is_a_no_op() {
        let order = placed_order();
        let events = order
            .handle_command(&OrderCommand::UpdateStatus { status: OrderStatus::Pending, role: Role::Admin })
            .unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn test_delivered_stamps_actual_delivery() {
        let mut order = placed_order();
        run(&mut order, OrderCommand::UpdateStatus { status: OrderStatus::Served, role: Role::Admin }).unwrap();
        assert_eq!(order.status, OrderStatus::Served);
        assert!(order.actual_delivery.is_some());
    }

    #[test]
    fn test_agent_may_only_complete_orders_in_transit() {
        let mut order = placed_order();
        let err = run(
            &mut order,
            OrderCommand::UpdateStatus { status: OrderStatus::Delivered, role: Role::Delivery },
        )
        .unwrap_err();
        assert!(matches!(err, OrderError::InvalidState(OrderStatus::Pending)));

        let a = Uuid::new_v4();
        run(&mut order, OrderCommand::RequestDelivery { agent_id: a }).unwrap();
        run(&mut order, OrderCommand::AssignDelivery { agent_id: a }).unwrap();

        let err = run(
            &mut order,
            OrderCommand::UpdateStatus { status: OrderStatus::Cancelled, role: Role::Delivery },
        )
        .unwrap_err();
        assert!(matches!(err, OrderError::InvalidState(OrderStatus::OutForDelivery)));

        run(&mut order, OrderCommand::UpdateStatus { status: OrderStatus::Delivered, role: Role::Delivery }).unwrap();
        assert_eq!(order.status, OrderStatus::Delivered);
    }

    #[test]
    fn test_cancel_only_before_dispatch() {
        let mut order = placed_order();
        let customer = order.customer_id;
        run(&mut order, OrderCommand::UpdateStatus { status: OrderStatus::OutForDelivery, role: Role::Admin }).unwrap();

        let err = run(&mut order, OrderCommand::CancelOrder { requested_by: customer }).unwrap_err();
        assert!(matches!(err, OrderError::InvalidState(OrderStatus::OutForDelivery)));

        let mut fresh = placed_order();
        let owner = fresh.customer_id;
        run(&mut fresh, OrderCommand::CancelOrder { requested_by: owner }).unwrap();
        assert_eq!(fresh.status, OrderStatus::Cancelled);
    }

    #[test]
    fn test_total_is_stable_across_transitions() {
        let mut order = placed_order();
        let total = order.totals.total;
        for status in [
            OrderStatus::Confirmed,
            OrderStatus::Cancelled,
            OrderStatus::Pending,
            OrderStatus::OutForDelivery,
            OrderStatus::Delivered,
        ] {
            run(&mut order, OrderCommand::UpdateStatus { status, role: Role::Admin }).unwrap();
            assert_eq!(order.totals.total, total);
        }
        assert_eq!(
            order.totals.total,
            order.totals.subtotal + order.totals.delivery_fee + order.totals.tax
        );
    }

    #[test]
    fn test_order_serializes_in_document_shape() {
        let order = placed_order();
        let json = serde_json::to_value(&order).unwrap();

        assert_eq!(json["status"], "pending");
        assert_eq!(json["user"], serde_json::json!(order.customer_id));
        assert!(json.get("deliveryAddress").is_some());
        assert!(json.get("total").is_some());
        assert!(json["assignedDeliveryBoy"].is_null());
    }
}
