use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::access::Role;
use crate::domain::user::{AgentAvailability, User};
use super::StoreError;

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Ids of every active admin.
    async fn list_admins(&self) -> Result<Vec<Uuid>, StoreError>;

    /// Number of users holding `role`, active or not.
    async fn count_by_role(&self, role: Role) -> Result<usize, StoreError>;

    /// Set a delivery agent's availability in place and return the updated user.
    async fn set_availability(&self, id: Uuid, availability: AgentAvailability) -> Result<User, StoreError>;

    async fn upsert(&self, user: User) -> Result<(), StoreError>;
}

#[derive(Default)]
pub struct InMemoryUserDirectory {
    users: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn list_admins(&self) -> Result<Vec<Uuid>, StoreError> {
        let mut admins: Vec<Uuid> = self
            .users
            .read()
            .await
            .values()
            .filter(|user| user.role == Role::Admin && user.is_active)
            .map(|user| user.id)
            .collect();
        admins.sort();
        Ok(admins)
    }

    async fn count_by_role(&self, role: Role) -> Result<usize, StoreError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .filter(|user| user.role == role)
            .count())
    }

    async fn set_availability(&self, id: Uuid, availability: AgentAvailability) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(&id)
            .filter(|user| user.role == Role::Delivery)
            .ok_or(StoreError::NotFound(id))?;
        user.availability = Some(availability);
        Ok(user.clone())
    }

    async fn upsert(&self, user: User) -> Result<(), StoreError> {
        self.users.write().await.insert(user.id, user);
        Ok(())
    }
}
