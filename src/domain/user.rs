use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::access::{Actor, Role};

/// Whether a delivery agent is currently taking work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentAvailability {
    Active,
    Inactive,
    Busy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub is_active: bool,
    /// Only delivery agents carry an availability.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability: Option<AgentAvailability>,
}

impl User {
    pub fn new(name: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            email: email.into(),
            role,
            is_active: true,
            availability: (role == Role::Delivery).then_some(AgentAvailability::Active),
        }
    }

    pub fn as_actor(&self) -> Actor {
        Actor::new(self.id, self.role)
    }
}
