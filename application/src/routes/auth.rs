//! Authentication routes.

use axum::{
    extract::rejection::FormRejection,
    response::{IntoResponse, Redirect, Response},
    Form, Json,
};
use secrecy::{ExposeSecret as _, SecretBox, SecretString};
use serde::{Deserialize, Serialize};
use service::{
    command::{self, Command as _},
    domain::user,
};

use crate::{define_error, AsError, Context, Error};

use super::{ActionData, Empty};

/// Locations allowed to be redirected to after logging in.
const REDIRECT_WHITELIST: &[&str] = &["/jokes", "/", "https://remix.run"];

/// Location redirected to after logging in, unless whitelisted another one.
const DEFAULT_REDIRECT: &str = "/jokes";

/// Submitted login form.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginForm {
    /// Either `login` or `register`.
    pub login_type: Option<String>,

    /// Name of the [`user::Username`] to log in as.
    pub username: Option<String>,

    /// [`user::Password`] to log in with.
    pub password: Option<SecretString>,

    /// Location to redirect to once logged in.
    pub redirect_to: Option<String>,
}

/// Errors of the individual [`LoginForm`] fields.
#[derive(Clone, Debug, Default, Serialize)]
pub struct LoginFieldErrors {
    /// Error of the username field.
    pub username: Option<&'static str>,

    /// Error of the password field.
    pub password: Option<&'static str>,
}

/// Submitted [`LoginForm`] values echoed back.
///
/// The password is never echoed.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginFields {
    /// Submitted login type.
    pub login_type: String,

    /// Submitted username.
    pub username: String,
}

/// Outcome of the login action re-rendering the form.
pub type LoginData = ActionData<LoginFieldErrors, LoginFields>;

/// Returns the provided `url` if it's allowed to be redirected to, or the
/// default location otherwise.
#[must_use]
pub fn validate_url(url: Option<&str>) -> &str {
    url.filter(|u| REDIRECT_WHITELIST.contains(u))
        .unwrap_or(DEFAULT_REDIRECT)
}

/// Validates the provided [`user::Username`].
///
/// # Errors
///
/// With a human-readable message if the `username` is invalid.
pub fn validate_username(username: &str) -> Result<user::Username, &'static str> {
    let len = username.chars().count();
    if len < user::Username::MIN_LEN {
        return Err("Usernames must be at least 3 characters long");
    }
    if len > user::Username::MAX_LEN {
        return Err("Usernames must be at most 64 characters long");
    }
    user::Username::new(username).ok_or(
        "Usernames must not contain control characters or surrounding spaces",
    )
}

/// Validates the provided [`user::Password`].
///
/// # Errors
///
/// With a human-readable message if the `password` is invalid.
pub fn validate_password(password: &str) -> Result<user::Password, &'static str> {
    if password.chars().count() < user::Password::MIN_LEN {
        return Err("Passwords must be at least 6 characters long");
    }
    user::Password::new(password)
        .ok_or("Passwords must be at most 72 bytes long")
}

define_error! {
    enum AuthError {
        #[code = "USERNAME_OCCUPIED"]
        #[status = CONFLICT]
        #[message = "`Username` is occupied by another `User`"]
        UsernameOccupied,

        #[code = "WRONG_CREDENTIALS"]
        #[status = FORBIDDEN]
        #[message = "Username/Password combination is incorrect"]
        WrongCredentials,
    }
}

/// `GET /login` loader.
#[expect(clippy::unused_async, reason = "`async` is required by `axum`")]
pub async fn login_form() -> Json<Empty> {
    Json(Empty {})
}

/// `POST /login` action.
///
/// # Errors
///
/// If the form is malformed or the store fails.
#[tracing::instrument(skip_all)]
pub async fn login(
    ctx: Context,
    form: Result<Form<LoginForm>, FormRejection>,
) -> Result<Response, Error> {
    let Form(form) = form.map_err(AsError::into_error)?;
    let redirect_to = validate_url(form.redirect_to.as_deref()).to_owned();

    let (Some(login_type), Some(username), Some(password)) =
        (form.login_type, form.username, form.password)
    else {
        return Ok(bad_request(&LoginData::form_error(
            "Form not submitted correctly.",
            None,
        )));
    };

    let (username, password) = match (
        validate_username(&username),
        validate_password(password.expose_secret()),
    ) {
        (Ok(u), Ok(p)) => (u, p),
        (u, p) => {
            let errors = LoginFieldErrors {
                username: u.err(),
                password: p.err(),
            };
            let fields = LoginFields {
                login_type,
                username,
            };
            return Ok(bad_request(&LoginData::field_errors(errors, fields)));
        }
    };
    let fields = LoginFields {
        login_type: login_type.clone(),
        username: username.to_string(),
    };
    let password = SecretBox::init_with(move || password);

    let user = match login_type.as_str() {
        "login" => {
            let res = ctx
                .service()
                .execute(command::AuthenticateUser { username, password })
                .await;
            match res {
                Ok(u) => u,
                Err(e) => {
                    use command::authenticate_user::ExecutionError as E;

                    if let E::WrongCredentials = e.as_ref() {
                        return Ok(bad_request(&LoginData::form_error(
                            AuthError::WrongCredentials.to_string(),
                            Some(fields),
                        )));
                    }
                    return Err(e.into_error());
                }
            }
        }
        "register" => {
            let res = ctx
                .service()
                .execute(command::CreateUser { username, password })
                .await;
            match res {
                Ok(u) => u,
                Err(e) => {
                    use command::create_user::ExecutionError as E;

                    if let E::UsernameOccupied(u) = e.as_ref() {
                        return Ok(bad_request(&LoginData::form_error(
                            format!("User with username {u} already exists"),
                            Some(fields),
                        )));
                    }
                    return Err(e.into_error());
                }
            }
        }
        _ => {
            return Ok(bad_request(&LoginData::form_error(
                "Login type invalid",
                Some(fields),
            )));
        }
    };
    tracing::info!(user_id = %user.id, "logged in");

    ctx.create_session(user.id, &redirect_to)
        .await
        .map(IntoResponse::into_response)
}

/// `POST /logout` action.
#[expect(clippy::unused_async, reason = "`async` is required by `axum`")]
pub async fn logout(ctx: Context) -> Response {
    ctx.destroy_session("/jokes").into_response()
}

/// `GET /logout` loader.
#[expect(clippy::unused_async, reason = "`async` is required by `axum`")]
pub async fn logout_redirect() -> Redirect {
    Redirect::to("/")
}

/// Answers with the provided [`LoginData`] as a `400 Bad Request`.
fn bad_request(data: &LoginData) -> Response {
    (http::StatusCode::BAD_REQUEST, Json(data)).into_response()
}

impl AsError for command::create_user::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::HashingTask(_) | Self::PasswordHash(_) => None,
            Self::UsernameOccupied(_) => Some(AuthError::UsernameOccupied.into()),
        }
    }
}

impl AsError for command::authenticate_user::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::VerificationTask(_) | Self::PasswordHash(_) => None,
            Self::WrongCredentials => Some(AuthError::WrongCredentials.into()),
        }
    }
}

impl AsError for command::create_user_session::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::JsonWebTokenEncodeError(_) => None,
        }
    }
}

#[cfg(test)]
mod spec {
    use axum::{body::Body, response::Response};
    use axum_extra::extract::cookie::Cookie;
    use http::{header, Request, StatusCode};
    use secrecy::SecretBox;
    use service::{
        command::{self, Command as _},
        domain::user,
        infra::database::Memory,
    };
    use tower::ServiceExt as _;

    use crate::{
        session::COOKIE_NAME,
        testing::{app, app_with, form, json, service, service_with},
    };

    use super::{validate_password, validate_url, validate_username};

    async fn seed_kody(db: &Memory) -> user::Id {
        service_with(db.clone())
            .execute(command::CreateUser {
                username: user::Username::new("kody").unwrap(),
                password: SecretBox::init_with(|| {
                    user::Password::new("twixrox").unwrap()
                }),
            })
            .await
            .unwrap()
            .id
    }

    /// Returns the session [`Cookie`] set by the provided [`Response`].
    fn session_of(res: &Response) -> Cookie<'static> {
        let cookie = Cookie::parse(
            res.headers()[header::SET_COOKIE].to_str().unwrap().to_owned(),
        )
        .unwrap();
        assert_eq!(cookie.name(), COOKIE_NAME);
        cookie
    }

    #[tokio::test]
    async fn logs_in_with_valid_credentials() {
        let db = Memory::default();
        let user_id = seed_kody(&db).await;

        let res = app_with(service_with(db))
            .oneshot(form(
                "/login",
                None,
                "loginType=login&username=kody&password=twixrox\
                 &redirectTo=%2F",
            ))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(res.headers()[header::LOCATION], "/");
        let cookie = session_of(&res);
        assert_eq!(cookie.http_only(), Some(true));
        let session = service()
            .execute(command::AuthorizeUserSession {
                token: cookie.value().parse().unwrap(),
            })
            .await
            .unwrap();
        assert_eq!(session.user_id, user_id);
    }

    #[tokio::test]
    async fn refuses_wrong_password() {
        let db = Memory::default();
        _ = seed_kody(&db).await;

        let res = app_with(service_with(db))
            .oneshot(form(
                "/login",
                None,
                "loginType=login&username=kody&password=twixrocks",
            ))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert!(res.headers().get(header::SET_COOKIE).is_none());
        let body = json(res).await;
        assert_eq!(
            body["formError"],
            "Username/Password combination is incorrect",
        );
        assert_eq!(body["fields"]["username"], "kody");
    }

    #[tokio::test]
    async fn registers_new_user() {
        let db = Memory::default();

        let res = app_with(service_with(db.clone()))
            .oneshot(form(
                "/login",
                None,
                "loginType=register&username=kody&password=twixrox",
            ))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(res.headers()[header::LOCATION], "/jokes");
        _ = session_of(&res);
        let users = db.users();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].username.to_string(), "kody");
    }

    #[tokio::test]
    async fn refuses_occupied_username() {
        let db = Memory::default();
        _ = seed_kody(&db).await;

        let res = app_with(service_with(db.clone()))
            .oneshot(form(
                "/login",
                None,
                "loginType=register&username=kody&password=another1",
            ))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert!(res.headers().get(header::SET_COOKIE).is_none());
        let body = json(res).await;
        assert_eq!(body["formError"], "User with username kody already exists");
        assert_eq!(body["fields"]["loginType"], "register");
        assert_eq!(db.users().len(), 1);
    }

    #[test]
    fn whitelists_redirects() {
        assert_eq!(validate_url(Some("/jokes")), "/jokes");
        assert_eq!(validate_url(Some("/")), "/");
        assert_eq!(validate_url(Some("https://remix.run")), "https://remix.run");
        assert_eq!(validate_url(Some("https://evil.example")), "/jokes");
        assert_eq!(validate_url(Some("/jokes/new")), "/jokes");
        assert_eq!(validate_url(None), "/jokes");
    }

    #[test]
    fn validates_credentials() {
        assert_eq!(
            validate_username("ko").unwrap_err(),
            "Usernames must be at least 3 characters long",
        );
        assert!(validate_username("kody").is_ok());
        assert_eq!(
            validate_password("twix1").unwrap_err(),
            "Passwords must be at least 6 characters long",
        );
        assert!(validate_password("twixrox").is_ok());
    }

    #[tokio::test]
    async fn rejects_short_credentials() {
        let res = app()
            .oneshot(form(
                "/login",
                None,
                "loginType=login&username=ko&password=twix&redirectTo=%2Fjokes",
            ))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert!(res.headers().get(header::SET_COOKIE).is_none());
        let body = json(res).await;
        assert_eq!(
            body["fieldErrors"]["username"],
            "Usernames must be at least 3 characters long",
        );
        assert_eq!(
            body["fieldErrors"]["password"],
            "Passwords must be at least 6 characters long",
        );
        assert_eq!(body["fields"]["username"], "ko");
        assert!(body["fields"].get("password").is_none());
    }

    #[tokio::test]
    async fn rejects_invalid_login_type() {
        let res = app()
            .oneshot(form(
                "/login",
                None,
                "loginType=guest&username=kody&password=twixrox",
            ))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json(res).await["formError"], "Login type invalid");
    }

    #[tokio::test]
    async fn rejects_incomplete_form() {
        let res = app()
            .oneshot(form("/login", None, "loginType=login&username=kody"))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json(res).await["formError"], "Form not submitted correctly.");
    }

    #[tokio::test]
    async fn logout_expires_cookie() {
        let res = app().oneshot(form("/logout", None, "")).await.unwrap();

        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(res.headers()[header::LOCATION], "/jokes");
        let cookie = Cookie::parse(
            res.headers()[header::SET_COOKIE].to_str().unwrap().to_owned(),
        )
        .unwrap();
        assert_eq!(cookie.name(), COOKIE_NAME);
        assert_eq!(cookie.value(), "");
        assert_eq!(
            cookie.expires_datetime(),
            Some(time::OffsetDateTime::UNIX_EPOCH),
        );
    }

    #[tokio::test]
    async fn logout_page_redirects_home() {
        let res = app()
            .oneshot(Request::get("/logout").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(res.headers()[header::LOCATION], "/");
    }
}
