use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::access::{authorize, Actor, Operation, ResourceOwners, Role};
use crate::domain::order::queries::start_of_day;
use crate::domain::order::{Order, OrderError, OrderStatus};
use crate::store::{OrderFilter, OrderStore, ProductCatalog, UserDirectory};

// ============================================================================
// Admin Dashboard - counts and revenue across the whole shop
// ============================================================================

/// How many recent orders and open bids the dashboard lists.
const RECENT_LIMIT: usize = 5;

/// Figures computed from the order documents alone.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderFigures {
    pub total_orders: usize,
    pub today_orders: usize,
    pub month_orders: usize,
    pub pending_orders: usize,
    /// Orders still moving through the lifecycle.
    pub active_orders: usize,
    /// Sum of `total` over delivered and served orders.
    pub total_revenue: Decimal,
    pub month_revenue: Decimal,
    /// Created in the last 24 hours, newest first.
    pub recent_orders: Vec<Order>,
    /// Created in the last 24 hours with a pending bid, newest first.
    pub recent_delivery_requests: Vec<Order>,
}

impl OrderFigures {
    /// `orders` must be sorted newest first, as `OrderStore::find` returns them.
    pub fn compute(orders: &[Order], now: DateTime<Utc>) -> Self {
        let today = start_of_day(now);
        let month = now
            .date_naive()
            .with_day(1)
            .map(|first| first.and_time(NaiveTime::MIN).and_utc())
            .unwrap_or(today);
        let last_day = now - Duration::hours(24);

        let revenue = |from: Option<DateTime<Utc>>| -> Decimal {
            orders
                .iter()
                .filter(|order| order.status.is_completed())
                .filter(|order| from.map_or(true, |from| order.created_at >= from))
                .map(|order| order.totals.total)
                .sum()
        };
        let recent = orders.iter().filter(|order| order.created_at >= last_day);

        Self {
            total_orders: orders.len(),
            today_orders: orders.iter().filter(|o| o.created_at >= today).count(),
            month_orders: orders.iter().filter(|o| o.created_at >= month).count(),
            pending_orders: orders.iter().filter(|o| o.status == OrderStatus::Pending).count(),
            active_orders: orders.iter().filter(|o| !o.status.is_terminal()).count(),
            total_revenue: revenue(None),
            month_revenue: revenue(Some(month)),
            recent_orders: recent.clone().take(RECENT_LIMIT).cloned().collect(),
            recent_delivery_requests: recent
                .filter(|order| order.has_pending_requests())
                .take(RECENT_LIMIT)
                .cloned()
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_products: usize,
    pub total_customers: usize,
    pub total_delivery_agents: usize,
    #[serde(flatten)]
    pub orders: OrderFigures,
}

pub struct Dashboard {
    orders: Arc<dyn OrderStore>,
    catalog: Arc<dyn ProductCatalog>,
    users: Arc<dyn UserDirectory>,
}

impl Dashboard {
    pub fn new(
        orders: Arc<dyn OrderStore>,
        catalog: Arc<dyn ProductCatalog>,
        users: Arc<dyn UserDirectory>,
    ) -> Self {
        Self { orders, catalog, users }
    }

    pub async fn stats(&self, actor: &Actor, now: DateTime<Utc>) -> Result<DashboardStats, OrderError> {
        authorize(actor, Operation::ViewDashboard, &ResourceOwners::none())?;

        let orders = self.orders.find(&OrderFilter::default()).await?;
        let stats = DashboardStats {
            total_products: self.catalog.count_products().await?,
            total_customers: self.users.count_by_role(Role::Customer).await?,
            total_delivery_agents: self.users.count_by_role(Role::Delivery).await?,
            orders: OrderFigures::compute(&orders, now),
        };

        tracing::debug!(
            total_orders = stats.orders.total_orders,
            active_orders = stats.orders.active_orders,
            "Dashboard computed"
        );
        Ok(stats)
    }
}
