use actix_web::{web, HttpResponse};
use serde_json::json;
use uuid::Uuid;

use crate::domain::access::Actor;
use super::{ApiError, AppState};

const INBOX_PAGE: usize = 50;

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/notifications")
            .route("", web::get().to(list_notifications))
            .route("/unread-count", web::get().to(unread_count))
            .route("/read-all", web::put().to(mark_all_read))
            .route("/{id}/read", web::put().to(mark_read)),
    );
}

async fn list_notifications(state: web::Data<AppState>, actor: Actor) -> Result<HttpResponse, ApiError> {
    let notifications = state.inbox.list_for_user(actor.id, INBOX_PAGE).await?;
    Ok(HttpResponse::Ok().json(notifications))
}

async fn unread_count(state: web::Data<AppState>, actor: Actor) -> Result<HttpResponse, ApiError> {
    let count = state.inbox.unread_count(actor.id).await?;
    Ok(HttpResponse::Ok().json(json!({ "count": count })))
}

async fn mark_all_read(state: web::Data<AppState>, actor: Actor) -> Result<HttpResponse, ApiError> {
    let updated = state.inbox.mark_all_read(actor.id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "message": "All notifications marked as read",
        "updated": updated
    })))
}

async fn mark_read(
    state: web::Data<AppState>,
    actor: Actor,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let notification = state.inbox.mark_read(actor.id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(notification))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::{test, App};
    use serde_json::Value;

    use crate::api::configure;
    use crate::api::testing::{request, world};
    use crate::domain::access::Role;
    use crate::notifications::GetDispatchStats;

    #[actix_web::test]
    async fn test_admin_inbox_flow() {
        let w = world(None).await;
        let app = test::init_service(App::new().app_data(w.state.clone()).configure(configure)).await;
        let customer = Actor::new(Uuid::new_v4(), Role::Customer);

        for _ in 0..2 {
            let req = request(test::TestRequest::post(), "/api/orders", &customer)
                .set_json(json!({
                    "items": [{ "product": w.product.id, "quantity": 1 }],
                    "deliveryAddress": { "fullName": "Ana", "email": "a@example.com", "phone": "1" }
                }))
                .to_request();
            assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);
        }
        w.dispatcher.send(GetDispatchStats).await.unwrap();

        let inbox: Value = test::call_and_read_body_json(
            &app,
            request(test::TestRequest::get(), "/api/notifications", &w.admin).to_request(),
        )
        .await;
        assert_eq!(inbox.as_array().unwrap().len(), 2);
        assert_eq!(inbox[0]["title"], "New Order Received");
        assert_eq!(inbox[0]["isRead"], false);

        let first = inbox[0]["id"].as_str().unwrap().to_string();
        let stranger = Actor::new(Uuid::new_v4(), Role::Admin);
        let uri = format!("/api/notifications/{first}/read");
        let resp = test::call_service(&app, request(test::TestRequest::put(), &uri, &stranger).to_request()).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let read: Value =
            test::call_and_read_body_json(&app, request(test::TestRequest::put(), &uri, &w.admin).to_request()).await;
        assert_eq!(read["isRead"], true);

        let count: Value = test::call_and_read_body_json(
            &app,
            request(test::TestRequest::get(), "/api/notifications/unread-count", &w.admin).to_request(),
        )
        .await;
        assert_eq!(count["count"], 1);

        let all: Value = test::call_and_read_body_json(
            &app,
            request(test::TestRequest::put(), "/api/notifications/read-all", &w.admin).to_request(),
        )
        .await;
        assert_eq!(all["updated"], 1);
    }
}
