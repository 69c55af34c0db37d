// ============================================================================
// HTTP API (actix-web)
// ============================================================================
//
// Thin JSON layer over the lifecycle engine and its read side. The caller's
// identity arrives in `X-User-Id` / `X-User-Role`, set by the upstream auth
// gateway.
//
// ============================================================================

mod admin;
mod cart;
mod delivery;
mod error;
mod identity;
mod notifications;
mod orders;
mod products;

pub use error::ApiError;
pub use identity::{USER_ID_HEADER, USER_ROLE_HEADER};

use std::sync::Arc;

use actix_web::web;

use crate::domain::cart::CartService;
use crate::domain::dashboard::Dashboard;
use crate::domain::order::{OrderCommandHandler, OrderQueries};
use crate::store::{NotificationInbox, ProductCatalog, UserDirectory};

/// Everything the handlers need, shared across workers.
pub struct AppState {
    pub commands: OrderCommandHandler,
    pub queries: OrderQueries,
    pub carts: CartService,
    pub dashboard: Dashboard,
    pub catalog: Arc<dyn ProductCatalog>,
    pub users: Arc<dyn UserDirectory>,
    pub inbox: Arc<dyn NotificationInbox>,
}

/// Mount the API routes. Expects `web::Data<AppState>` on the app.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into()),
    )
    .configure(orders::routes)
    .configure(products::routes)
    .configure(cart::routes)
    .configure(delivery::routes)
    .configure(admin::routes)
    .configure(notifications::routes);
}
