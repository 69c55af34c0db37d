use actix_web::{web, HttpResponse};
use chrono::Utc;

use super::{ApiError, AppState};
use crate::domain::access::Actor;

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/admin/dashboard", web::get().to(dashboard));
}

async fn dashboard(state: web::Data<AppState>, actor: Actor) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(state.dashboard.stats(&actor, Utc::now()).await?))
}
