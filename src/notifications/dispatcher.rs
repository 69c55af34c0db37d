use actix::prelude::*;
use futures_util::future::join_all;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::order::{order_ref, EventPublisher, OrderEvent, OrderStatus};
use crate::event_sourcing::EventEnvelope;
use crate::metrics::Metrics;
use crate::store::UserDirectory;
use super::{NewNotification, NotificationKind, NotificationSink};

// ============================================================================
// Notification Dispatcher Actor
// ============================================================================
//
// Receives one envelope per order transition and fans it out:
// - resolves admins (and the agent's display name) from the user directory
// - plans one message per recipient
// - delivers each message independently; failures are logged and counted,
//   never retried and never reported back to the engine
//
// ============================================================================

pub struct NotificationDispatcher {
    sink: Arc<dyn NotificationSink>,
    users: Arc<dyn UserDirectory>,
    metrics: Arc<Metrics>,
    stats: DispatchStats,
}

impl NotificationDispatcher {
    pub fn new(
        sink: Arc<dyn NotificationSink>,
        users: Arc<dyn UserDirectory>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            sink,
            users,
            metrics,
            stats: DispatchStats::default(),
        }
    }
}

impl Actor for NotificationDispatcher {
    type Context = Context<Self>;

    fn started(&mut self, _ctx: &mut Self::Context) {
        tracing::info!("NotificationDispatcher started");
    }
}

// ============================================================================
// Messages
// ============================================================================

#[derive(Message, Debug, Clone)]
#[rtype(result = "()")]
pub struct OrderEventPublished(pub EventEnvelope<OrderEvent>);

#[derive(Message)]
#[rtype(result = "DispatchStats")]
pub struct GetDispatchStats;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub events: u64,
    pub sent: u64,
    pub failed: u64,
}

impl EventPublisher for Recipient<OrderEventPublished> {
    fn publish(&self, envelope: EventEnvelope<OrderEvent>) {
        self.do_send(OrderEventPublished(envelope));
    }
}

// ============================================================================
// Recipient Planning
// ============================================================================

/// Directory lookups the plan depends on.
#[derive(Debug, Clone, Default)]
pub struct PlanContext {
    pub admins: Vec<Uuid>,
    pub agent_name: Option<String>,
}

fn to_each(recipients: &[Uuid], title: &str, message: &str, kind: NotificationKind, order_id: Uuid) -> Vec<NewNotification> {
    recipients
        .iter()
        .map(|recipient| NewNotification {
            recipient: *recipient,
            title: title.to_string(),
            message: message.to_string(),
            kind,
            order_id: Some(order_id),
        })
        .collect()
}

/// Who hears about an order event, and what they are told.
pub fn plan_notifications(envelope: &EventEnvelope<OrderEvent>, context: &PlanContext) -> Vec<NewNotification> {
    let order_id = envelope.aggregate_id;
    let short = order_ref(order_id);
    let agent_name = context.agent_name.as_deref().unwrap_or("a delivery partner");

    match &envelope.event_data {
        OrderEvent::Placed(e) => to_each(
            &context.admins,
            "New Order Received",
            &format!("New order #{short} received from {}", e.delivery_address.full_name),
            NotificationKind::NewOrder,
            order_id,
        ),

        OrderEvent::DeliveryRequested(_) => to_each(
            &context.admins,
            "Delivery Request",
            &format!("Delivery request for order #{short} from {agent_name}"),
            NotificationKind::DeliveryRequest,
            order_id,
        ),

        OrderEvent::DeliveryAssigned(e) => {
            let mut planned = to_each(
                &[e.agent_id],
                "Order Assigned",
                &format!("You have been assigned order #{short}. Please check your assigned orders."),
                NotificationKind::OrderAssigned,
                order_id,
            );
            planned.extend(to_each(
                &e.rejected_agents,
                "Order Assignment Update",
                &format!("Order #{short} has been assigned to another delivery person."),
                NotificationKind::OrderAssigned,
                order_id,
            ));
            planned.extend(to_each(
                &context.admins,
                "Order Assigned to Delivery",
                &format!("Order #{short} has been assigned to {agent_name}"),
                NotificationKind::OrderAssigned,
                order_id,
            ));
            planned
        }

        OrderEvent::StatusChanged(e) => {
            let mut planned = Vec::new();
            if e.to.is_completed() && e.assigned_agent.is_some() {
                let outcome = match e.to {
                    OrderStatus::Served => "served",
                    _ => "delivered successfully",
                };
                planned.extend(to_each(
                    &[e.customer_id],
                    "Order Delivered",
                    &format!("Your order #{short} has been {outcome}!"),
                    NotificationKind::OrderDelivered,
                    order_id,
                ));
            }
            planned.extend(to_each(
                &context.admins,
                "Order Status Updated",
                &format!("Order #{short} status changed to {}", e.to),
                NotificationKind::StatusUpdate,
                order_id,
            ));
            planned
        }

        OrderEvent::Cancelled(_) => to_each(
            &context.admins,
            "Order Cancelled",
            &format!("Order #{short} was cancelled by the customer"),
            NotificationKind::OrderCancelled,
            order_id,
        ),
    }
}

async fn resolve_context(users: &dyn UserDirectory, envelope: &EventEnvelope<OrderEvent>) -> PlanContext {
    let admins = users.list_admins().await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "Could not list admins; admin notifications skipped");
        Vec::new()
    });

    let agent_id = match &envelope.event_data {
        OrderEvent::DeliveryRequested(e) => Some(e.agent_id),
        OrderEvent::DeliveryAssigned(e) => Some(e.agent_id),
        _ => None,
    };
    let agent_name = match agent_id {
        Some(id) => users.find(id).await.ok().flatten().map(|user| user.name),
        None => None,
    };

    PlanContext { admins, agent_name }
}

async fn deliver(sink: &dyn NotificationSink, metrics: &Metrics, notification: NewNotification) -> bool {
    let recipient = notification.recipient;
    let kind = notification.kind;

    match sink.emit(notification).await {
        Ok(_) => {
            metrics.record_notification(kind.as_str(), true);
            true
        }
        Err(e) => {
            metrics.record_notification(kind.as_str(), false);
            tracing::error!(
                recipient = %recipient,
                kind = kind.as_str(),
                error = %e,
                "Failed to deliver notification"
            );
            false
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

impl Handler<OrderEventPublished> for NotificationDispatcher {
    type Result = AtomicResponse<Self, ()>;

    fn handle(&mut self, msg: OrderEventPublished, _: &mut Self::Context) -> Self::Result {
        let sink = self.sink.clone();
        let users = self.users.clone();
        let metrics = self.metrics.clone();
        let envelope = msg.0;

        let work = async move {
            let context = resolve_context(users.as_ref(), &envelope).await;
            let planned = plan_notifications(&envelope, &context);

            tracing::debug!(
                order_id = %envelope.aggregate_id,
                event_type = %envelope.event_type,
                recipients = planned.len(),
                "Dispatching notifications"
            );

            let outcomes = join_all(
                planned
                    .into_iter()
                    .map(|notification| deliver(sink.as_ref(), &metrics, notification)),
            )
            .await;

            let sent = outcomes.iter().filter(|ok| **ok).count() as u64;
            (sent, outcomes.len() as u64 - sent)
        };

        AtomicResponse::new(Box::pin(work.into_actor(self).map(
            |(sent, failed), act, _ctx| {
                act.stats.events += 1;
                act.stats.sent += sent;
                act.stats.failed += failed;
            },
        )))
    }
}

impl Handler<GetDispatchStats> for NotificationDispatcher {
    type Result = MessageResult<GetDispatchStats>;

    fn handle(&mut self, _msg: GetDispatchStats, _: &mut Self::Context) -> Self::Result {
        MessageResult(self.stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use crate::domain::access::Role;
    use crate::domain::order::{DeliveryAssigned, DeliveryRequested, OrderStatusChanged};
    use crate::domain::user::User;
    use crate::notifications::{Notification, NotificationError};
    use crate::store::{InMemoryNotificationStore, InMemoryUserDirectory, NotificationInbox};

    fn envelope(order_id: Uuid, event: OrderEvent) -> EventEnvelope<OrderEvent> {
        EventEnvelope::new(order_id, 2, event, Uuid::new_v4())
    }

    fn status_changed(to: OrderStatus, assigned_agent: Option<Uuid>, customer_id: Uuid) -> OrderEvent {
        OrderEvent::StatusChanged(OrderStatusChanged {
            from: OrderStatus::OutForDelivery,
            to,
            changed_by: Role::Admin,
            customer_id,
            assigned_agent,
            changed_at: Utc::now(),
        })
    }

    #[test]
    fn test_assignment_plan_covers_winner_losers_and_admins() {
        let (winner, loser) = (Uuid::new_v4(), Uuid::new_v4());
        let admins = vec![Uuid::new_v4(), Uuid::new_v4()];
        let event = OrderEvent::DeliveryAssigned(DeliveryAssigned {
            agent_id: winner,
            rejected_agents: vec![loser],
            previous_status: OrderStatus::Pending,
            assigned_at: Utc::now(),
        });

        let plan = plan_notifications(
            &envelope(Uuid::new_v4(), event),
            &PlanContext { admins: admins.clone(), agent_name: Some("Rico".into()) },
        );

        assert_eq!(plan.len(), 4);
        assert_eq!(plan[0].recipient, winner);
        assert_eq!(plan[0].title, "Order Assigned");
        assert_eq!(plan[1].recipient, loser);
        assert_eq!(plan[1].title, "Order Assignment Update");
        assert!(plan[2..].iter().all(|n| admins.contains(&n.recipient)));
        assert!(plan[2].message.ends_with("assigned to Rico"));
        assert!(plan.iter().all(|n| n.kind == NotificationKind::OrderAssigned));
    }

    #[test]
    fn test_customer_hears_about_delivery_only_when_an_agent_was_assigned() {
        let customer = Uuid::new_v4();
        let admins = vec![Uuid::new_v4()];
        let context = PlanContext { admins, agent_name: None };
        let order_id = Uuid::new_v4();

        let with_agent = plan_notifications(
            &envelope(order_id, status_changed(OrderStatus::Delivered, Some(Uuid::new_v4()), customer)),
            &context,
        );
        assert_eq!(with_agent.len(), 2);
        assert_eq!(with_agent[0].recipient, customer);
        assert_eq!(with_agent[0].kind, NotificationKind::OrderDelivered);
        assert_eq!(
            with_agent[0].message,
            format!("Your order #{} has been delivered successfully!", order_ref(order_id))
        );

        let without_agent = plan_notifications(
            &envelope(order_id, status_changed(OrderStatus::Served, None, customer)),
            &context,
        );
        assert_eq!(without_agent.len(), 1);
        assert_eq!(without_agent[0].kind, NotificationKind::StatusUpdate);
        assert!(without_agent[0].message.ends_with("status changed to served"));
    }

    #[test]
    fn test_request_plan_without_admins_is_empty() {
        let event = OrderEvent::DeliveryRequested(DeliveryRequested {
            agent_id: Uuid::new_v4(),
            requested_at: Utc::now(),
        });
        assert!(plan_notifications(&envelope(Uuid::new_v4(), event), &PlanContext::default()).is_empty());
    }

    /// Rejects messages for one recipient, stores the rest.
    struct FlakySink {
        inner: InMemoryNotificationStore,
        unreachable: Uuid,
    }

    #[async_trait]
    impl NotificationSink for FlakySink {
        async fn emit(&self, notification: NewNotification) -> Result<Notification, NotificationError> {
            if notification.recipient == self.unreachable {
                return Err(NotificationError::Delivery("push gateway timeout".into()));
            }
            self.inner.emit(notification).await
        }
    }

    #[actix_web::test]
    async fn test_dispatcher_delivers_independently_and_counts_failures() {
        let users = Arc::new(InMemoryUserDirectory::new());
        let reachable = User::new("Admin One", "one@example.com", Role::Admin);
        let unreachable = User::new("Admin Two", "two@example.com", Role::Admin);
        let agent = User::new("Rico", "rico@example.com", Role::Delivery);
        for user in [&reachable, &unreachable, &agent] {
            users.upsert(user.clone()).await.unwrap();
        }

        let sink = Arc::new(FlakySink {
            inner: InMemoryNotificationStore::new(),
            unreachable: unreachable.id,
        });
        let metrics = Arc::new(Metrics::new().unwrap());
        let dispatcher = NotificationDispatcher::new(sink.clone(), users, metrics).start();

        let event = OrderEvent::DeliveryRequested(DeliveryRequested {
            agent_id: agent.id,
            requested_at: Utc::now(),
        });
        let recipient: Recipient<OrderEventPublished> = dispatcher.clone().recipient();
        recipient.publish(envelope(Uuid::new_v4(), event));

        let stats = dispatcher.send(GetDispatchStats).await.unwrap();
        assert_eq!(stats, DispatchStats { events: 1, sent: 1, failed: 1 });

        let inbox = sink.inner.list_for_user(reachable.id, 50).await.unwrap();
        assert_eq!(inbox.len(), 1);
        assert!(inbox[0].message.ends_with("from Rico"));
        assert!(sink.inner.list_for_user(unreachable.id, 50).await.unwrap().is_empty());
    }
}
