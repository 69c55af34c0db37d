use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::order::OrderError;

// ============================================================================
// Access Policy
// ============================================================================
//
// Every role check in the service goes through `can_perform`. Handlers call
// `authorize` once, before the command reaches the aggregate.
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Customer,
    Delivery,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Delivery => "delivery",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "customer" => Ok(Role::Customer),
            "delivery" => Ok(Role::Delivery),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// The authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn new(id: Uuid, role: Role) -> Self {
        Self { id, role }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    PlaceOrder,
    ViewOrder,
    ListOwnOrders,
    ListAllOrders,
    CancelOrder,
    UpdateStatus,
    RequestDelivery,
    AssignDelivery,
    ListAvailable,
    ListAssigned,
    ListDeliveryRequests,
    ListDailyOrders,
    ViewDashboard,
    ManageCart,
    SetAvailability,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::PlaceOrder => "place_order",
            Operation::ViewOrder => "view_order",
            Operation::ListOwnOrders => "list_own_orders",
            Operation::ListAllOrders => "list_all_orders",
            Operation::CancelOrder => "cancel_order",
            Operation::UpdateStatus => "update_status",
            Operation::RequestDelivery => "request_delivery",
            Operation::AssignDelivery => "assign_delivery",
            Operation::ListAvailable => "list_available",
            Operation::ListAssigned => "list_assigned",
            Operation::ListDeliveryRequests => "list_delivery_requests",
            Operation::ListDailyOrders => "list_daily_orders",
            Operation::ViewDashboard => "view_dashboard",
            Operation::ManageCart => "manage_cart",
            Operation::SetAvailability => "set_availability",
        }
    }
}

/// Who an order belongs to, as far as authorization is concerned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceOwners {
    pub customer: Option<Uuid>,
    pub assignee: Option<Uuid>,
}

impl ResourceOwners {
    pub fn none() -> Self {
        Self::default()
    }
}

fn role_permits(role: Role, operation: Operation) -> bool {
    use Operation::*;
    match role {
        Role::Admin => !matches!(
            operation,
            PlaceOrder | CancelOrder | RequestDelivery | ManageCart | SetAvailability
        ),
        Role::Customer => matches!(
            operation,
            PlaceOrder | ViewOrder | ListOwnOrders | CancelOrder | ManageCart
        ),
        Role::Delivery => matches!(
            operation,
            ViewOrder | UpdateStatus | RequestDelivery | ListAvailable | ListAssigned | SetAvailability
        ),
    }
}

fn ownership_holds(actor: &Actor, operation: Operation, owners: &ResourceOwners) -> bool {
    match (actor.role, operation) {
        (Role::Admin, _) => true,
        (Role::Customer, Operation::ViewOrder | Operation::CancelOrder) => {
            owners.customer == Some(actor.id)
        }
        (Role::Delivery, Operation::ViewOrder | Operation::UpdateStatus) => {
            owners.assignee == Some(actor.id)
        }
        _ => true,
    }
}

pub fn can_perform(actor: &Actor, operation: Operation, owners: &ResourceOwners) -> bool {
    role_permits(actor.role, operation) && ownership_holds(actor, operation, owners)
}

/// `can_perform` with the refusal turned into the matching error.
pub fn authorize(actor: &Actor, operation: Operation, owners: &ResourceOwners) -> Result<(), OrderError> {
    if can_perform(actor, operation, owners) {
        return Ok(());
    }
    if role_permits(actor.role, operation) {
        return Err(OrderError::NotOwner);
    }
    Err(OrderError::Forbidden { role: actor.role, operation })
}
