use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ApiError, AppState};
use crate::domain::access::{authorize, Actor, Operation, ResourceOwners};
use crate::domain::user::AgentAvailability;
use crate::store::StoreError;

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/delivery")
            .route("/status", web::get().to(get_status))
            .route("/status", web::put().to(set_status)),
    );
}

#[derive(Debug, Serialize, Deserialize)]
struct AvailabilityBody {
    status: AgentAvailability,
}

fn agent_not_found(id: Uuid) -> ApiError {
    ApiError::NotFound(format!("Delivery agent {id}"))
}

/// Availability is informational; dispatch does not consult it.
async fn set_status(
    state: web::Data<AppState>,
    actor: Actor,
    body: web::Json<AvailabilityBody>,
) -> Result<HttpResponse, ApiError> {
    authorize(&actor, Operation::SetAvailability, &ResourceOwners::none())?;

    let user = match state.users.set_availability(actor.id, body.status).await {
        Ok(user) => user,
        Err(StoreError::NotFound(id)) => return Err(agent_not_found(id)),
        Err(e) => return Err(e.into()),
    };
    tracing::info!(agent_id = %actor.id, status = ?body.status, "Delivery agent availability changed");
    Ok(HttpResponse::Ok().json(user))
}

async fn get_status(state: web::Data<AppState>, actor: Actor) -> Result<HttpResponse, ApiError> {
    authorize(&actor, Operation::SetAvailability, &ResourceOwners::none())?;

    let status = state
        .users
        .find(actor.id)
        .await?
        .and_then(|user| user.availability)
        .ok_or_else(|| agent_not_found(actor.id))?;
    Ok(HttpResponse::Ok().json(AvailabilityBody { status }))
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::{test, App};
    use serde_json::{json, Value};
    use uuid::Uuid;

    use crate::api::configure;
    use crate::api::testing::{request, world};
    use crate::domain::access::{Actor, Role};
    use crate::domain::user::User;

    #[actix_web::test]
    async fn test_agent_sets_own_availability() {
        let w = world(None).await;
        let rider = User::new("Rider", "rider@example.com", Role::Delivery);
        w.state.users.upsert(rider.clone()).await.unwrap();
        let app = test::init_service(App::new().app_data(w.state.clone()).configure(configure)).await;
        let actor = rider.as_actor();

        let current: Value = test::call_and_read_body_json(
            &app,
            request(test::TestRequest::get(), "/api/delivery/status", &actor).to_request(),
        )
        .await;
        assert_eq!(current, json!({ "status": "active" }));

        let req = request(test::TestRequest::put(), "/api/delivery/status", &actor)
            .set_json(json!({ "status": "busy" }))
            .to_request();
        let user: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(user["availability"], "busy");
        assert_eq!(user["id"], rider.id.to_string());

        let req = request(test::TestRequest::put(), "/api/delivery/status", &actor)
            .set_json(json!({ "status": "sleeping" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_availability_needs_a_known_agent() {
        let w = world(None).await;
        let app = test::init_service(App::new().app_data(w.state.clone()).configure(configure)).await;

        let stranger = Actor::new(Uuid::new_v4(), Role::Delivery);
        let req = request(test::TestRequest::put(), "/api/delivery/status", &stranger)
            .set_json(json!({ "status": "inactive" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        let customer = Actor::new(Uuid::new_v4(), Role::Customer);
        let req = request(test::TestRequest::put(), "/api/delivery/status", &customer)
            .set_json(json!({ "status": "inactive" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);
    }
}
