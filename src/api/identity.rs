use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest};
use futures_util::future::{ready, Ready};
use uuid::Uuid;

use crate::domain::access::{Actor, Role};
use super::ApiError;

pub const USER_ID_HEADER: &str = "X-User-Id";
pub const USER_ROLE_HEADER: &str = "X-User-Role";

fn header<'a>(req: &'a HttpRequest, name: &str) -> Result<&'a str, ApiError> {
    req.headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ApiError::Unauthenticated(format!("missing {name} header")))
}

fn actor_from(req: &HttpRequest) -> Result<Actor, ApiError> {
    let id = header(req, USER_ID_HEADER)?
        .parse::<Uuid>()
        .map_err(|e| ApiError::Unauthenticated(format!("invalid {USER_ID_HEADER}: {e}")))?;
    let role = header(req, USER_ROLE_HEADER)?
        .parse::<Role>()
        .map_err(ApiError::Unauthenticated)?;
    Ok(Actor::new(id, role))
}

impl FromRequest for Actor {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(actor_from(req))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_actor_from_headers() {
        let id = Uuid::new_v4();
        let req = TestRequest::default()
            .insert_header((USER_ID_HEADER, id.to_string()))
            .insert_header((USER_ROLE_HEADER, "Delivery"))
            .to_http_request();
        assert_eq!(actor_from(&req).unwrap(), Actor::new(id, Role::Delivery));
    }

    #[test]
    fn test_missing_or_bad_identity_is_unauthenticated() {
        let anonymous = TestRequest::default().to_http_request();
        assert!(matches!(actor_from(&anonymous), Err(ApiError::Unauthenticated(_))));

        let bad_role = TestRequest::default()
            .insert_header((USER_ID_HEADER, Uuid::new_v4().to_string()))
            .insert_header((USER_ROLE_HEADER, "courier"))
            .to_http_request();
        assert!(matches!(actor_from(&bad_role), Err(ApiError::Unauthenticated(_))));
    }
}
