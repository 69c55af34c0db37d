use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use super::{ApiError, AppState};
use crate::domain::access::Actor;

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/cart")
            .route("", web::get().to(get_cart))
            .route("/add", web::post().to(add_item))
            .route("/update/{product_id}", web::put().to(update_item))
            .route("/remove/{product_id}", web::delete().to(remove_item))
            .route("/clear", web::delete().to(clear_cart))
            .route("/summary", web::get().to(summary)),
    );
}

fn one() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddItemBody {
    product_id: Uuid,
    #[serde(default = "one")]
    quantity: u32,
}

#[derive(Debug, Deserialize)]
struct UpdateItemBody {
    quantity: u32,
}

async fn get_cart(state: web::Data<AppState>, actor: Actor) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(state.carts.get_cart(&actor).await?))
}

async fn add_item(
    state: web::Data<AppState>,
    actor: Actor,
    body: web::Json<AddItemBody>,
) -> Result<HttpResponse, ApiError> {
    let cart = state.carts.add_item(&actor, body.product_id, body.quantity).await?;
    Ok(HttpResponse::Ok().json(cart))
}

async fn update_item(
    state: web::Data<AppState>,
    actor: Actor,
    path: web::Path<Uuid>,
    body: web::Json<UpdateItemBody>,
) -> Result<HttpResponse, ApiError> {
    let cart = state.carts.update_item(&actor, path.into_inner(), body.quantity).await?;
    Ok(HttpResponse::Ok().json(cart))
}

async fn remove_item(
    state: web::Data<AppState>,
    actor: Actor,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(state.carts.remove_item(&actor, path.into_inner()).await?))
}

async fn clear_cart(state: web::Data<AppState>, actor: Actor) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(state.carts.clear(&actor).await?))
}

async fn summary(state: web::Data<AppState>, actor: Actor) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(state.carts.summary(&actor).await?))
}
