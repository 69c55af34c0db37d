use actix::prelude::*;
use actix_web::{web, App, HttpServer};
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use food_orders::api::{self, AppState};
use food_orders::config::{AppConfig, DEFAULT_LOG_FILTER};
use food_orders::domain::cart::CartService;
use food_orders::domain::dashboard::Dashboard;
use food_orders::domain::order::{OrderCommandHandler, OrderQueries};
use food_orders::metrics::{self, Metrics};
use food_orders::notifications::{NotificationDispatcher, OrderEventPublished};
use food_orders::seed::seed_demo_data;
use food_orders::store::{
    InMemoryCartStore, InMemoryNotificationStore, InMemoryOrderStore, InMemoryProductCatalog,
    InMemoryUserDirectory,
};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // RUST_LOG wins over LOG_FILTER, e.g. RUST_LOG=debug cargo run
    let log_filter = std::env::var("LOG_FILTER").unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string());
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_filter)))
        .init();

    let config = AppConfig::from_env();
    tracing::info!("🚀 Starting food order service");
    tracing::info!(
        free_delivery_threshold = %config.pricing.free_delivery_threshold,
        delivery_fee = %config.pricing.delivery_fee,
        tax_rate = %config.pricing.tax_rate,
        "Pricing policy loaded"
    );

    // === 1. Metrics ===
    let metrics = Arc::new(Metrics::new()?);
    tracing::info!("📊 Metrics registry created with {} metrics", metrics.registry().gather().len());

    // === 2. Stores ===
    let orders = Arc::new(InMemoryOrderStore::new());
    let catalog = Arc::new(InMemoryProductCatalog::new());
    let users = Arc::new(InMemoryUserDirectory::new());
    let inbox = Arc::new(InMemoryNotificationStore::new());
    let carts = Arc::new(InMemoryCartStore::new());

    if config.seed_demo_data {
        seed_demo_data(users.as_ref(), catalog.as_ref()).await?;
    }

    // === 3. Notification dispatcher ===
    let dispatcher = NotificationDispatcher::new(inbox.clone(), users.clone(), metrics.clone()).start();
    let publisher: Recipient<OrderEventPublished> = dispatcher.recipient();

    // === 4. Lifecycle engine, read side, carts and back office ===
    let state = web::Data::new(AppState {
        commands: OrderCommandHandler::new(
            orders.clone(),
            catalog.clone(),
            config.pricing,
            Arc::new(publisher),
            metrics.clone(),
        ),
        queries: OrderQueries::new(orders.clone()),
        carts: CartService::new(carts, catalog.clone()),
        dashboard: Dashboard::new(orders, catalog.clone(), users.clone()),
        catalog,
        users,
        inbox,
    });
    let metrics_data = web::Data::new(metrics);

    // === 5. HTTP ===
    let (host, port) = config.bind_addr();
    tracing::info!("📡 Listening on http://{}:{} (metrics at /metrics)", host, port);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(metrics_data.clone())
            .configure(api::configure)
            .configure(metrics::routes)
    })
    .bind((host, port))?
    .run()
    .await?;

    tracing::info!("👋 Shutdown complete");
    Ok(())
}
