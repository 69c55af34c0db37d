// ============================================================================
// Notifications
// ============================================================================
//
// Fire-and-forget messages to users about order lifecycle events.
//
// - dispatcher  Actor that turns one order event into per-recipient messages
// - NotificationSink  Where messages are delivered (an inbox store, a push gateway, ...)
//
// ============================================================================

mod dispatcher;

pub use dispatcher::{
    plan_notifications, DispatchStats, GetDispatchStats, NotificationDispatcher,
    OrderEventPublished, PlanContext,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    NewOrder,
    DeliveryRequest,
    OrderAssigned,
    OrderDelivered,
    StatusUpdate,
    OrderCancelled,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::NewOrder => "new_order",
            NotificationKind::DeliveryRequest => "delivery_request",
            NotificationKind::OrderAssigned => "order_assigned",
            NotificationKind::OrderDelivered => "order_delivered",
            NotificationKind::StatusUpdate => "status_update",
            NotificationKind::OrderCancelled => "order_cancelled",
        }
    }
}

/// A message addressed to one user, before it is stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub recipient: Uuid,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub order_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    #[serde(rename = "user")]
    pub recipient: Uuid,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    #[serde(rename = "order")]
    pub order_id: Option<Uuid>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn from_new(new: NewNotification) -> Self {
        Self {
            id: Uuid::new_v4(),
            recipient: new.recipient,
            title: new.title,
            message: new.message,
            kind: new.kind,
            order_id: new.order_id,
            is_read: false,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("Notification not found: {0}")]
    NotFound(Uuid),

    #[error("Not authorized")]
    NotOwner,

    #[error("Delivery failed: {0}")]
    Delivery(String),
}

#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn emit(&self, notification: NewNotification) -> Result<Notification, NotificationError>;
}
