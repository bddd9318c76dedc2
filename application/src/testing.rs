//! Helpers for exercising the [`Router`] in tests.

use std::time::Duration;

use axum::{body::Body, response::Response, Router};
use http::{header, Request};
use service::{
    command::{self, Command as _},
    domain::user,
    infra::database::Memory,
};

use crate::{session, Service};

/// Secret signing sessions in tests.
pub(crate) const SECRET: &[u8] = b"there is no spoon";

/// Creates a new [`Service`] backed by the provided [`Memory`] store.
pub(crate) fn service_with(db: Memory) -> Service {
    Service::new(
        service::Config::new(SECRET, Duration::from_secs(60 * 60)),
        db,
    )
}

/// Creates a new [`Service`] backed by an empty [`Memory`] store.
pub(crate) fn service() -> Service {
    service_with(Memory::default())
}

/// Creates a new application [`Router`] backed by the provided [`Service`].
pub(crate) fn app_with(service: Service) -> Router {
    crate::app(service, session::Settings::default())
}

/// Creates a new application [`Router`] backed by an empty [`Memory`] store.
pub(crate) fn app() -> Router {
    app_with(service())
}

/// Returns a `Cookie` header value carrying a valid session of the provided
/// [`user::Id`].
pub(crate) async fn session_cookie(user_id: user::Id) -> String {
    let output = service()
        .execute(command::CreateUserSession { user_id })
        .await
        .unwrap();
    format!("{}={}", session::COOKIE_NAME, output.token)
}

/// Builds a form submitting `POST` request.
pub(crate) fn form(
    uri: &str,
    cookie: Option<String>,
    body: &'static str,
) -> Request<Body> {
    let mut req = Request::post(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        req = req.header(header::COOKIE, cookie);
    }
    req.body(Body::from(body)).unwrap()
}

/// Reads the JSON body of the provided [`Response`].
pub(crate) async fn json(res: Response) -> serde_json::Value {
    let body = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}
