use actix_web::{web, HttpResponse};

use super::{ApiError, AppState};

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/products", web::get().to(list_products));
}

/// Active products only; anyone may browse.
async fn list_products(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(state.catalog.list_active().await?))
}
