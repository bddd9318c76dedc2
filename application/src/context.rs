//! [`Context`]-related definitions.

use axum::{
    async_trait,
    extract::FromRequestParts,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use derive_more::{Display, Error as StdError};
use service::{
    command::{self, Command as _},
    domain::{self, user},
    query, Query as _,
};
use url::form_urlencoded;

use crate::{session, AsError, Error, Service};

/// Request context resolving the identity of the requester.
#[derive(Debug)]
pub struct Context {
    /// [`Service`] instance.
    service: Service,

    /// [`session::Settings`] of the session cookie.
    settings: session::Settings,

    /// Cookies of the HTTP request.
    jar: CookieJar,

    /// Path of the HTTP request.
    path: String,

    /// ID of the [`domain::User`] the request session belongs to, if any.
    user_id: Option<user::Id>,
}

impl Context {
    /// Returns [`Service`] instance of this [`Context`].
    #[must_use]
    pub fn service(&self) -> &Service {
        &self.service
    }

    /// Returns ID of the [`domain::User`] carried by the request session, if
    /// any.
    ///
    /// Tampered, expired or missing session cookies resolve to [`None`].
    #[must_use]
    pub fn user_id(&self) -> Option<user::Id> {
        self.user_id
    }

    /// Returns ID of the [`domain::User`] carried by the request session.
    ///
    /// # Errors
    ///
    /// With [`Unauthenticated`] if the request has no valid session, pointing
    /// back to the provided `redirect_to` path or to the request path
    /// otherwise.
    pub fn require_user_id(
        &self,
        redirect_to: Option<&str>,
    ) -> Result<user::Id, Unauthenticated> {
        self.user_id.ok_or_else(|| Unauthenticated {
            redirect_to: redirect_to.unwrap_or(&self.path).to_owned(),
        })
    }

    /// Returns the [`domain::User`] the request session belongs to.
    ///
    /// A session pointing to a non-existent [`domain::User`] is treated as
    /// anonymous.
    ///
    /// # Errors
    ///
    /// If the [`domain::User`] cannot be looked up.
    pub async fn current_user(&self) -> Result<Option<domain::User>, Error> {
        let Some(user_id) = self.user_id else {
            return Ok(None);
        };

        let user = self
            .service
            .execute(query::user::ById::by(user_id))
            .await
            .map_err(AsError::into_error)?;
        if user.is_none() {
            tracing::warn!(%user_id, "session refers to a missing `User`");
        }
        Ok(user)
    }

    /// Starts a new session of the provided [`domain::User`] and redirects to
    /// the provided `redirect_to` location.
    ///
    /// # Errors
    ///
    /// If the session cannot be signed.
    pub async fn create_session(
        &self,
        user_id: user::Id,
        redirect_to: &str,
    ) -> Result<(CookieJar, Redirect), Error> {
        let output = self
            .service
            .execute(command::CreateUserSession { user_id })
            .await
            .map_err(AsError::into_error)?;

        Ok((
            self.settings.commit(self.jar.clone(), &output.token),
            Redirect::to(redirect_to),
        ))
    }

    /// Destroys the current session and redirects to the provided
    /// `redirect_to` location.
    #[must_use]
    pub fn destroy_session(&self, redirect_to: &str) -> (CookieJar, Redirect) {
        (
            self.settings.destroy(self.jar.clone()),
            Redirect::to(redirect_to),
        )
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Context
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut http::request::Parts,
        _: &S,
    ) -> Result<Self, Self::Rejection> {
        let service = parts
            .extensions
            .get::<Service>()
            .cloned()
            .ok_or_else(|| Error::internal(&"missing `Service` extension"))?;
        let settings = parts
            .extensions
            .get::<session::Settings>()
            .copied()
            .unwrap_or_default();
        let jar = CookieJar::from_headers(&parts.headers);

        let mut user_id = None;
        if let Some(token) = session::token(&jar) {
            match service
                .execute(command::AuthorizeUserSession { token })
                .await
            {
                Ok(s) => user_id = Some(s.user_id),
                Err(e) => tracing::debug!("ignoring invalid session: {e}"),
            }
        }

        Ok(Self {
            service,
            settings,
            jar,
            path: parts.uri.path().to_owned(),
            user_id,
        })
    }
}

/// Absence of a valid session where one is required.
#[derive(Clone, Debug, Display, StdError)]
#[display("authentication required to access `{redirect_to}`")]
pub struct Unauthenticated {
    /// Location to return to once logged in.
    pub redirect_to: String,
}

impl Unauthenticated {
    /// Returns the login page location remembering the
    /// [`Unauthenticated::redirect_to`] one.
    #[must_use]
    pub fn login_location(&self) -> String {
        form_urlencoded::Serializer::new(String::from("/login?"))
            .append_pair("redirectTo", &self.redirect_to)
            .finish()
    }
}

impl IntoResponse for Unauthenticated {
    fn into_response(self) -> Response {
        Redirect::to(&self.login_location()).into_response()
    }
}
