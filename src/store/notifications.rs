use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::notifications::{NewNotification, Notification, NotificationError, NotificationSink};

/// Per-user notification inbox.
#[async_trait]
pub trait NotificationInbox: Send + Sync {
    /// Newest first, at most `limit` entries.
    async fn list_for_user(&self, user: Uuid, limit: usize) -> Result<Vec<Notification>, NotificationError>;

    async fn mark_read(&self, user: Uuid, id: Uuid) -> Result<Notification, NotificationError>;

    /// Returns how many notifications flipped to read.
    async fn mark_all_read(&self, user: Uuid) -> Result<usize, NotificationError>;

    async fn unread_count(&self, user: Uuid) -> Result<usize, NotificationError>;
}

/// Insertion-ordered log of every notification emitted.
#[derive(Default)]
pub struct InMemoryNotificationStore {
    entries: RwLock<Vec<Notification>>,
}

impl InMemoryNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NotificationSink for InMemoryNotificationStore {
    async fn emit(&self, notification: NewNotification) -> Result<Notification, NotificationError> {
        let stored = Notification::from_new(notification);
        self.entries.write().await.push(stored.clone());
        Ok(stored)
    }
}

#[async_trait]
impl NotificationInbox for InMemoryNotificationStore {
    async fn list_for_user(&self, user: Uuid, limit: usize) -> Result<Vec<Notification>, NotificationError> {
        Ok(self
            .entries
            .read()
            .await
            .iter()
            .rev()
            .filter(|n| n.recipient == user)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn mark_read(&self, user: Uuid, id: Uuid) -> Result<Notification, NotificationError> {
        let mut entries = self.entries.write().await;
        let entry = entries
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or(NotificationError::NotFound(id))?;

        if entry.recipient != user {
            return Err(NotificationError::NotOwner);
        }
        entry.is_read = true;
        Ok(entry.clone())
    }

    async fn mark_all_read(&self, user: Uuid) -> Result<usize, NotificationError> {
        let mut entries = self.entries.write().await;
        let mut flipped = 0;
        for entry in entries.iter_mut().filter(|n| n.recipient == user && !n.is_read) {
            entry.is_read = true;
            flipped += 1;
        }
        Ok(flipped)
    }

    async fn unread_count(&self, user: Uuid) -> Result<usize, NotificationError> {
        Ok(self
            .entries
            .read()
            .await
            .iter()
            .filter(|n| n.recipient == user && !n.is_read)
            .count())
    }
}
