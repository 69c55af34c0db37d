mod server;

use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry};

pub use server::routes;

// ============================================================================
// Metrics Module - Prometheus metrics for the order lifecycle
// ============================================================================
//
// Provides metrics for:
// - Order placement and status transitions
// - Delivery requests and assignments
// - Stock reservations and restorations
// - Rejected commands, by error kind
// - Notification delivery outcomes
//
// All metrics are registered with Prometheus and can be scraped via /metrics
// ============================================================================

pub struct Metrics {
    registry: Registry,

    // Lifecycle Metrics
    pub orders_placed: IntCounter,
    pub order_transitions: IntCounterVec,
    pub delivery_requests: IntCounter,
    pub delivery_assignments: IntCounter,
    pub lifecycle_rejections: IntCounterVec,
    pub command_duration: HistogramVec,

    // Inventory Metrics
    pub stock_adjustments: IntCounterVec,
    pub stock_restore_failures: IntCounter,

    // Notification Metrics
    pub notifications_sent: IntCounterVec,
    pub notifications_failed: IntCounterVec,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        // Lifecycle Metrics
        let orders_placed = IntCounter::new("orders_placed_total", "Total orders placed")?;
        registry.register(Box::new(orders_placed.clone()))?;

        let order_transitions = IntCounterVec::new(
            Opts::new("order_transitions_total", "Order status transitions"),
            &["from", "to"],
        )?;
        registry.register(Box::new(order_transitions.clone()))?;

        let delivery_requests = IntCounter::new(
            "delivery_requests_total",
            "Total delivery requests filed by agents",
        )?;
        registry.register(Box::new(delivery_requests.clone()))?;

        let delivery_assignments = IntCounter::new(
            "delivery_assignments_total",
            "Total orders assigned to a delivery agent",
        )?;
        registry.register(Box::new(delivery_assignments.clone()))?;

        let lifecycle_rejections = IntCounterVec::new(
            Opts::new("lifecycle_rejections_total", "Commands rejected by the lifecycle engine"),
            &["reason"],
        )?;
        registry.register(Box::new(lifecycle_rejections.clone()))?;

        let command_duration = HistogramVec::new(
            HistogramOpts::new("lifecycle_command_duration_seconds", "Lifecycle command duration")
                .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]),
            &["operation"],
        )?;
        registry.register(Box::new(command_duration.clone()))?;

        // Inventory Metrics
        let stock_adjustments = IntCounterVec::new(
            Opts::new("stock_adjustments_total", "Per-product stock adjustments"),
            &["direction"],
        )?;
        registry.register(Box::new(stock_adjustments.clone()))?;

        let stock_restore_failures = IntCounter::new(
            "stock_restore_failures_total",
            "Product lines not restored after a committed cancellation",
        )?;
        registry.register(Box::new(stock_restore_failures.clone()))?;

        // Notification Metrics
        let notifications_sent = IntCounterVec::new(
            Opts::new("notifications_sent_total", "Notifications delivered"),
            &["kind"],
        )?;
        registry.register(Box::new(notifications_sent.clone()))?;

        let notifications_failed = IntCounterVec::new(
            Opts::new("notifications_failed_total", "Notifications that could not be delivered"),
            &["kind"],
        )?;
        registry.register(Box::new(notifications_failed.clone()))?;

        Ok(Self {
            registry,
            orders_placed,
            order_transitions,
            delivery_requests,
            delivery_assignments,
            lifecycle_rejections,
            command_duration,
            stock_adjustments,
            stock_restore_failures,
            notifications_sent,
            notifications_failed,
        })
    }

    /// Get the Prometheus registry for exposing metrics via HTTP
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_order_placed(&self) {
        self.orders_placed.inc();
    }

    pub fn record_transition(&self, from: &str, to: &str) {
        self.order_transitions.with_label_values(&[from, to]).inc();
    }

    pub fn record_delivery_request(&self) {
        self.delivery_requests.inc();
    }

    pub fn record_assignment(&self) {
        self.delivery_assignments.inc();
    }

    pub fn record_rejection(&self, reason: &str) {
        self.lifecycle_rejections.with_label_values(&[reason]).inc();
    }

    pub fn observe_command(&self, operation: &str, duration_secs: f64) {
        self.command_duration.with_label_values(&[operation]).observe(duration_secs);
    }

    /// One increment per product line touched.
    pub fn record_stock_adjustment(&self, direction: &str, lines: usize) {
        self.stock_adjustments
            .with_label_values(&[direction])
            .inc_by(lines as u64);
    }

    pub fn record_stock_restore_failure(&self, lines: usize) {
        self.stock_restore_failures.inc_by(lines as u64);
    }

    pub fn record_notification(&self, kind: &str, delivered: bool) {
        if delivered {
            self.notifications_sent.with_label_values(&[kind]).inc();
        } else {
            self.notifications_failed.with_label_values(&[kind]).inc();
        }
    }
}
