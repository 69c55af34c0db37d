use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveTime, Utc};
use uuid::Uuid;

use crate::domain::access::{authorize, Actor, Operation, ResourceOwners, Role};
use crate::store::{OrderFilter, OrderStore};

use super::aggregate::Order;
use super::errors::OrderError;
use super::value_objects::OrderStatus;

// ============================================================================
// Order Queries - read side
// ============================================================================

pub struct OrderQueries {
    orders: Arc<dyn OrderStore>,
}

impl OrderQueries {
    pub fn new(orders: Arc<dyn OrderStore>) -> Self {
        Self { orders }
    }

    pub async fn get_order(&self, actor: &Actor, order_id: Uuid) -> Result<Order, OrderError> {
        let order = self.orders.get(order_id).await?;
        authorize(actor, Operation::ViewOrder, &order.owners())?;
        Ok(order)
    }

    /// Customers see their own orders; admins see everything, optionally by status.
    pub async fn list_orders(&self, actor: &Actor, status: Option<&str>) -> Result<Vec<Order>, OrderError> {
        let statuses = status
            .map(|raw| raw.parse::<OrderStatus>().map(|status| vec![status]))
            .transpose()?;

        let filter = match actor.role {
            Role::Admin => {
                authorize(actor, Operation::ListAllOrders, &ResourceOwners::none())?;
                OrderFilter { statuses, ..Default::default() }
            }
            _ => {
                authorize(actor, Operation::ListOwnOrders, &ResourceOwners::none())?;
                OrderFilter {
                    customer_id: Some(actor.id),
                    statuses,
                    ..Default::default()
                }
            }
        };

        Ok(self.orders.find(&filter).await?)
    }

    /// Open orders nobody has been assigned to yet.
    pub async fn list_available(&self, actor: &Actor) -> Result<Vec<Order>, OrderError> {
        authorize(actor, Operation::ListAvailable, &ResourceOwners::none())?;
        let filter = OrderFilter {
            statuses: Some(vec![OrderStatus::Pending, OrderStatus::Confirmed]),
            unassigned_only: true,
            ..Default::default()
        };
        Ok(self.orders.find(&filter).await?)
    }

    pub async fn list_assigned(&self, actor: &Actor) -> Result<Vec<Order>, OrderError> {
        authorize(actor, Operation::ListAssigned, &ResourceOwners::none())?;
        let filter = OrderFilter {
            assigned_to: Some(actor.id),
            statuses: Some(vec![
                OrderStatus::OutForDelivery,
                OrderStatus::Delivered,
                OrderStatus::Served,
            ]),
            ..Default::default()
        };
        Ok(self.orders.find(&filter).await?)
    }

    /// Every order created on the UTC calendar day containing `now`.
    pub async fn list_daily(&self, actor: &Actor, now: DateTime<Utc>) -> Result<Vec<Order>, OrderError> {
        authorize(actor, Operation::ListDailyOrders, &ResourceOwners::none())?;
        let start = start_of_day(now);
        let filter = OrderFilter {
            created_from: Some(start),
            created_until: Some(start + Duration::days(1)),
            ..Default::default()
        };
        Ok(self.orders.find(&filter).await?)
    }

    pub async fn list_delivery_requests(&self, actor: &Actor) -> Result<Vec<Order>, OrderError> {
        authorize(actor, Operation::ListDeliveryRequests, &ResourceOwners::none())?;
        let filter = OrderFilter {
            with_pending_requests: true,
            ..Default::default()
        };
        Ok(self.orders.find(&filter).await?)
    }
}

pub(crate) fn start_of_day(at: DateTime<Utc>) -> DateTime<Utc> {
    at.date_naive().and_time(NaiveTime::MIN).and_utc()
}
