use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::access::Actor;
use crate::domain::order::PlaceOrder;
use super::{ApiError, AppState};

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/orders")
            .route("", web::post().to(place_order))
            .route("", web::get().to(list_orders))
            .route("/delivery/available", web::get().to(list_available))
            .route("/delivery/assigned", web::get().to(list_assigned))
            .route("/delivery-requests", web::get().to(list_delivery_requests))
            .route("/daily", web::get().to(list_daily))
            .route("/{id}", web::get().to(get_order))
            .route("/{id}/cancel", web::put().to(cancel_order))
            .route("/{id}/status", web::put().to(update_status))
            .route("/{id}/request-delivery", web::post().to(request_delivery))
            .route("/{id}/assign-delivery", web::put().to(assign_delivery)),
    );
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusBody {
    status: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssignBody {
    delivery_boy_id: Uuid,
}

async fn place_order(
    state: web::Data<AppState>,
    actor: Actor,
    body: web::Json<PlaceOrder>,
) -> Result<HttpResponse, ApiError> {
    let order = state.commands.place_order(&actor, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(order))
}

async fn list_orders(
    state: web::Data<AppState>,
    actor: Actor,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, ApiError> {
    let orders = state.queries.list_orders(&actor, query.status.as_deref()).await?;
    Ok(HttpResponse::Ok().json(orders))
}

async fn list_available(state: web::Data<AppState>, actor: Actor) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(state.queries.list_available(&actor).await?))
}

async fn list_assigned(state: web::Data<AppState>, actor: Actor) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(state.queries.list_assigned(&actor).await?))
}

async fn list_delivery_requests(state: web::Data<AppState>, actor: Actor) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(state.queries.list_delivery_requests(&actor).await?))
}

async fn list_daily(state: web::Data<AppState>, actor: Actor) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(state.queries.list_daily(&actor, Utc::now()).await?))
}

async fn get_order(
    state: web::Data<AppState>,
    actor: Actor,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(state.queries.get_order(&actor, path.into_inner()).await?))
}

async fn cancel_order(
    state: web::Data<AppState>,
    actor: Actor,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let order = state.commands.cancel_order(&actor, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(order))
}

async fn update_status(
    state: web::Data<AppState>,
    actor: Actor,
    path: web::Path<Uuid>,
    body: web::Json<StatusBody>,
) -> Result<HttpResponse, ApiError> {
    let order = state
        .commands
        .update_status(&actor, path.into_inner(), &body.status)
        .await?;
    Ok(HttpResponse::Ok().json(order))
}

async fn request_delivery(
    state: web::Data<AppState>,
    actor: Actor,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let order = state.commands.request_delivery(&actor, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(order))
}

async fn assign_delivery(
    state: web::Data<AppState>,
    actor: Actor,
    path: web::Path<Uuid>,
    body: web::Json<AssignBody>,
) -> Result<HttpResponse, ApiError> {
    let order = state
        .commands
        .assign_delivery(&actor, path.into_inner(), body.delivery_boy_id)
        .await?;
    Ok(HttpResponse::Ok().json(order))
}
