//! HTTP routes: loaders answering `GET` requests and actions handling form
//! submissions.

pub mod auth;
pub mod jokes;

use axum::{routing::get, Json, Router};
use serde::Serialize;

/// Builds the [`Router`] serving all the routes.
///
/// Expects [`Service`] and [`session::Settings`] to be provided as
/// [`Extension`]s.
///
/// [`Extension`]: axum::Extension
/// [`Service`]: crate::Service
/// [`session::Settings`]: crate::session::Settings
pub fn router() -> Router {
    Router::new()
        .route("/", get(index))
        .route("/jokes", get(jokes::index))
        .route("/jokes/new", get(jokes::new).post(jokes::create))
        .route("/jokes/:joke_id", get(jokes::show).post(jokes::delete))
        .route("/login", get(auth::login_form).post(auth::login))
        .route("/logout", get(auth::logout_redirect).post(auth::logout))
}

/// Landing document.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct Landing {
    /// Title of the application.
    pub title: &'static str,

    /// Navigation links.
    pub links: &'static [Link],
}

/// Navigation link.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct Link {
    /// Target location.
    pub href: &'static str,

    /// Human-readable label.
    pub text: &'static str,
}

/// Document without any data.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct Empty {}

/// Outcome of a form action that has to be re-submitted.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionData<E, F> {
    /// Error concerning the whole form.
    pub form_error: Option<String>,

    /// Errors of the individual fields.
    pub field_errors: Option<E>,

    /// Submitted values to fill the form with.
    pub fields: Option<F>,
}

impl<E, F> ActionData<E, F> {
    /// Creates [`ActionData`] with an error of the whole form.
    #[must_use]
    pub fn form_error(message: impl Into<String>, fields: Option<F>) -> Self {
        Self {
            form_error: Some(message.into()),
            field_errors: None,
            fields,
        }
    }

    /// Creates [`ActionData`] with errors of the individual fields.
    #[must_use]
    pub fn field_errors(errors: E, fields: F) -> Self {
        Self {
            form_error: None,
            field_errors: Some(errors),
            fields: Some(fields),
        }
    }
}

/// `GET /` loader.
#[expect(clippy::unused_async, reason = "`async` is required by `axum`")]
async fn index() -> Json<Landing> {
    Json(Landing {
        title: "Remix: So great, it's funny!",
        links: &[Link {
            href: "/jokes",
            text: "Read Jokes",
        }],
    })
}
