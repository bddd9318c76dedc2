//! [`Joke`]-related routes.
//!
//! [`Joke`]: domain::Joke

use axum::{
    extract::{rejection::FormRejection, Path},
    response::{IntoResponse as _, Redirect, Response},
    Form, Json,
};
use common::operations::{Limit, Random};
use serde::{Deserialize, Serialize};
use service::{
    command::{self, Command as _},
    domain::{self, joke, user},
    query, read, Query as _,
};

use crate::{define_error, AsError, Context, Error};

use super::{ActionData, Empty};

/// Number of the latest [`domain::Joke`]s listed on the jokes page.
const LATEST_COUNT: usize = 5;

/// Public view of a [`domain::User`].
#[derive(Clone, Debug, Serialize)]
pub struct User {
    /// ID of the [`domain::User`].
    pub id: user::Id,

    /// Name of the [`domain::User`].
    pub username: String,
}

impl From<domain::User> for User {
    fn from(user: domain::User) -> Self {
        Self {
            id: user.id,
            username: user.username.to_string(),
        }
    }
}

/// Listing entry of a [`domain::Joke`].
#[derive(Clone, Debug, Serialize)]
pub struct Summary {
    /// ID of the [`domain::Joke`].
    pub id: joke::Id,

    /// Name of the [`domain::Joke`].
    pub name: String,
}

impl From<read::joke::Summary> for Summary {
    fn from(summary: read::joke::Summary) -> Self {
        Self {
            id: summary.id,
            name: summary.name.to_string(),
        }
    }
}

/// Full view of a [`domain::Joke`].
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Joke {
    /// ID of the [`domain::Joke`].
    pub id: joke::Id,

    /// Name of the [`domain::Joke`].
    pub name: String,

    /// Content of the [`domain::Joke`].
    pub content: String,

    /// ID of the [`domain::User`] who told the [`domain::Joke`], if any.
    pub jokester_id: Option<user::Id>,

    /// Moment the [`domain::Joke`] was told at.
    pub created_at: joke::CreationDateTime,
}

impl From<domain::Joke> for Joke {
    fn from(joke: domain::Joke) -> Self {
        Self {
            id: joke.id,
            name: joke.name.to_string(),
            content: joke.content.to_string(),
            jokester_id: joke.jokester_id,
            created_at: joke.created_at,
        }
    }
}

/// `GET /jokes` document.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Index {
    /// Current [`User`], if logged in.
    pub user: Option<User>,

    /// Latest [`Summary`]s, newest first.
    pub jokes: Vec<Summary>,

    /// Random [`Joke`], unless there are none.
    pub random_joke: Option<Joke>,
}

/// `GET /jokes/:joke_id` document.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Show {
    /// Requested [`Joke`].
    pub joke: Joke,

    /// Indicator whether the requester told the [`Joke`].
    pub is_owner: bool,
}

/// Submitted new [`domain::Joke`] form.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct NewJoke {
    /// Name of a new [`domain::Joke`].
    pub name: Option<String>,

    /// Content of a new [`domain::Joke`].
    pub content: Option<String>,
}

/// Submitted [`domain::Joke`] action form.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct JokeAction {
    /// Requested action.
    pub intent: Option<String>,
}

define_error! {
    enum JokeError {
        #[code = "UNAUTHORIZED"]
        #[status = UNAUTHORIZED]
        #[message = "Unauthorized"]
        Unauthorized,

        #[code = "JOKE_NOT_FOUND"]
        #[status = NOT_FOUND]
        #[message = "What a joke! Not found."]
        NotFound,

        #[code = "JOKE_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "Can't delete what does not exist"]
        NotExists,

        #[code = "NOT_JOKESTER"]
        #[status = FORBIDDEN]
        #[message = "Pssh, nice try. That's not your joke"]
        NotJokester,
    }
}

/// Validates the provided [`joke::Name`].
///
/// # Errors
///
/// With a human-readable message if the `name` is invalid.
pub fn validate_name(name: &str) -> Result<joke::Name, &'static str> {
    if name.chars().count() < joke::Name::MIN_LEN {
        return Err("Joke name must be at least 3 chars or more");
    }
    joke::Name::new(name).ok_or("Joke name must be at most 256 chars")
}

/// Validates the provided [`joke::Content`].
///
/// # Errors
///
/// With a human-readable message if the `content` is invalid.
pub fn validate_content(content: &str) -> Result<joke::Content, &'static str> {
    if content.chars().count() < joke::Content::MIN_LEN {
        return Err("Joke content must be at least 10 chars long");
    }
    joke::Content::new(content).ok_or("Joke content must be at most 4096 chars")
}

/// `GET /jokes` loader.
///
/// # Errors
///
/// If the store fails.
#[tracing::instrument(skip_all)]
pub async fn index(ctx: Context) -> Result<Json<Index>, Error> {
    let user = ctx.current_user().await?;
    let jokes = ctx
        .service()
        .execute(query::jokes::Latest::by(Limit(LATEST_COUNT)))
        .await
        .map_err(AsError::into_error)?;
    let random_joke = ctx
        .service()
        .execute(query::joke::Random::by(Random))
        .await
        .map_err(AsError::into_error)?;

    Ok(Json(Index {
        user: user.map(Into::into),
        jokes: jokes.into_iter().map(Into::into).collect(),
        random_joke: random_joke.map(Into::into),
    }))
}

/// `GET /jokes/new` loader.
///
/// # Errors
///
/// If the requester is not logged in.
#[expect(clippy::unused_async, reason = "`async` is required by `axum`")]
pub async fn new(ctx: Context) -> Result<Json<Empty>, Error> {
    _ = ctx.user_id().ok_or(JokeError::Unauthorized)?;
    Ok(Json(Empty {}))
}

/// `POST /jokes/new` action.
///
/// # Errors
///
/// If the form is malformed or the store fails.
#[tracing::instrument(skip_all)]
pub async fn create(
    ctx: Context,
    form: Result<Form<NewJoke>, FormRejection>,
) -> Result<Response, Error> {
    let Form(form) = form.map_err(AsError::into_error)?;
    let jokester_id = match ctx.require_user_id(None) {
        Ok(id) => id,
        Err(e) => return Ok(e.into_response()),
    };

    let NewJoke {
        name: Some(name),
        content: Some(content),
    } = form
    else {
        let data = ActionData::<NewJoke, NewJoke>::form_error(
            "Form not submitted correctly.",
            None,
        );
        return Ok(Json(data).into_response());
    };

    let (name, content) =
        match (validate_name(&name), validate_content(&content)) {
            (Ok(n), Ok(c)) => (n, c),
            (n, c) => {
                let errors = NewJoke {
                    name: n.err().map(str::to_owned),
                    content: c.err().map(str::to_owned),
                };
                let fields = NewJoke {
                    name: Some(name),
                    content: Some(content),
                };
                let data = ActionData::field_errors(errors, fields);
                return Ok(Json(data).into_response());
            }
        };

    let joke = ctx
        .service()
        .execute(command::CreateJoke {
            name,
            content,
            jokester_id,
        })
        .await
        .map_err(AsError::into_error)?;
    tracing::info!(joke_id = %joke.id, "joke created");

    Ok(Redirect::to(&format!("/jokes/{}", joke.id)).into_response())
}

/// `GET /jokes/:joke_id` loader.
///
/// # Errors
///
/// If the [`domain::Joke`] doesn't exist or the store fails.
#[tracing::instrument(skip_all, fields(joke_id = %joke_id))]
pub async fn show(
    ctx: Context,
    Path(joke_id): Path<String>,
) -> Result<Json<Show>, Error> {
    let joke_id = joke_id
        .parse::<joke::Id>()
        .map_err(|_| JokeError::NotFound)?;
    let joke = ctx
        .service()
        .execute(query::joke::ById::by(joke_id))
        .await
        .map_err(AsError::into_error)?
        .ok_or(JokeError::NotFound)?;

    let is_owner = ctx.user_id().is_some_and(|id| joke.is_told_by(id));
    Ok(Json(Show {
        joke: joke.into(),
        is_owner,
    }))
}

/// `POST /jokes/:joke_id` action.
///
/// # Errors
///
/// If the intent is not supported, the [`domain::Joke`] doesn't exist, the
/// requester is not its jokester or the store fails.
#[tracing::instrument(skip_all, fields(joke_id = %joke_id))]
pub async fn delete(
    ctx: Context,
    Path(joke_id): Path<String>,
    form: Result<Form<JokeAction>, FormRejection>,
) -> Result<Response, Error> {
    let Form(JokeAction { intent }) = form.map_err(AsError::into_error)?;
    if intent.as_deref() != Some("delete") {
        return Err(Error::bad_request(&format!(
            "The intent {} is not supported",
            intent.as_deref().unwrap_or("null"),
        )));
    }

    let initiator_id = match ctx.require_user_id(None) {
        Ok(id) => id,
        Err(e) => return Ok(e.into_response()),
    };
    let joke_id = joke_id
        .parse::<joke::Id>()
        .map_err(|_| JokeError::NotExists)?;

    let joke = ctx
        .service()
        .execute(command::DeleteJoke {
            joke_id,
            initiator_id,
        })
        .await
        .map_err(AsError::into_error)?;
    tracing::info!(joke_id = %joke.id, "joke deleted");

    Ok(Redirect::to("/jokes").into_response())
}

impl AsError for command::create_joke::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
        }
    }
}

impl AsError for command::delete_joke::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::JokeNotExists(_) => JokeError::NotExists.into(),
            Self::NotJokester(_) => JokeError::NotJokester.into(),
        })
    }
}

#[cfg(test)]
mod spec {
    use axum::body::Body;
    use http::{header, Request, StatusCode};
    use service::{
        command::{self, Command as _},
        domain::{joke, user, Joke},
        infra::database::Memory,
    };
    use tower::ServiceExt as _;

    use crate::testing::{
        app, app_with, form, json, service_with, session_cookie,
    };

    use super::{validate_content, validate_name};

    async fn seed_joke(db: &Memory, jokester_id: user::Id) -> Joke {
        service_with(db.clone())
            .execute(command::CreateJoke {
                name: joke::Name::new("Frisbee").unwrap(),
                content: joke::Content::new(
                    "I was wondering why the frisbee was getting bigger, \
                     then it hit me.",
                )
                .unwrap(),
                jokester_id,
            })
            .await
            .unwrap()
    }

    #[test]
    fn validates_name_length() {
        assert_eq!(
            validate_name("ab").unwrap_err(),
            "Joke name must be at least 3 chars or more",
        );
        assert!(validate_name("abc").is_ok());
        assert!(validate_name(&"a".repeat(joke::Name::MAX_LEN)).is_ok());
        assert!(validate_name(&"a".repeat(joke::Name::MAX_LEN + 1)).is_err());
    }

    #[test]
    fn validates_content_length() {
        assert_eq!(
            validate_content("too short").unwrap_err(),
            "Joke content must be at least 10 chars long",
        );
        assert!(validate_content("long enough").is_ok());
    }

    #[tokio::test]
    async fn new_form_requires_session() {
        let res = app()
            .oneshot(Request::get("/jokes/new").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json(res).await["message"], "Unauthorized");
    }

    #[tokio::test]
    async fn new_form_for_logged_in() {
        let cookie = session_cookie(user::Id::new()).await;

        let res = app()
            .oneshot(
                Request::get("/jokes/new")
                    .header(header::COOKIE, cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(json(res).await, serde_json::json!({}));
    }

    #[tokio::test]
    async fn create_redirects_anonymous_to_login() {
        let res = app()
            .oneshot(form(
                "/jokes/new",
                None,
                "name=Frisbee&content=It+hit+me+eventually",
            ))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            res.headers()[header::LOCATION],
            "/login?redirectTo=%2Fjokes%2Fnew",
        );
    }

    #[tokio::test]
    async fn create_reports_field_errors() {
        let cookie = session_cookie(user::Id::new()).await;

        let res = app()
            .oneshot(form("/jokes/new", Some(cookie), "name=ab&content=short"))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        let body = json(res).await;
        assert_eq!(
            body["fieldErrors"]["name"],
            "Joke name must be at least 3 chars or more",
        );
        assert_eq!(
            body["fieldErrors"]["content"],
            "Joke content must be at least 10 chars long",
        );
        assert_eq!(body["fields"]["name"], "ab");
        assert_eq!(body["fields"]["content"], "short");
        assert!(body["formError"].is_null());
    }

    #[tokio::test]
    async fn create_requires_all_fields() {
        let cookie = session_cookie(user::Id::new()).await;

        let res = app()
            .oneshot(form("/jokes/new", Some(cookie), "name=Frisbee"))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(json(res).await["formError"], "Form not submitted correctly.");
    }

    #[tokio::test]
    async fn create_redirects_to_new_joke() {
        let db = Memory::default();
        let jokester_id = user::Id::new();
        let cookie = session_cookie(jokester_id).await;

        let res = app_with(service_with(db.clone()))
            .oneshot(form(
                "/jokes/new",
                Some(cookie),
                "name=Frisbee&content=It+hit+me+eventually",
            ))
            .await
            .unwrap();

        let jokes = db.jokes();
        assert_eq!(jokes.len(), 1);
        assert!(jokes[0].is_told_by(jokester_id));
        assert_eq!(jokes[0].name.to_string(), "Frisbee");
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            res.headers()[header::LOCATION],
            format!("/jokes/{}", jokes[0].id).as_str(),
        );
    }

    #[tokio::test]
    async fn shows_ownership() {
        let db = Memory::default();
        let jokester_id = user::Id::new();
        let joke = seed_joke(&db, jokester_id).await;
        let uri = format!("/jokes/{}", joke.id);

        for (cookie, is_owner) in [
            (Some(session_cookie(jokester_id).await), true),
            (Some(session_cookie(user::Id::new()).await), false),
            (None, false),
        ] {
            let mut req = Request::get(uri.as_str());
            if let Some(cookie) = cookie {
                req = req.header(header::COOKIE, cookie);
            }
            let res = app_with(service_with(db.clone()))
                .oneshot(req.body(Body::empty()).unwrap())
                .await
                .unwrap();

            assert_eq!(res.status(), StatusCode::OK);
            let body = json(res).await;
            assert_eq!(body["isOwner"], is_owner);
            assert_eq!(body["joke"]["name"], "Frisbee");
        }
    }

    #[tokio::test]
    async fn deletes_own_joke() {
        let db = Memory::default();
        let jokester_id = user::Id::new();
        let joke = seed_joke(&db, jokester_id).await;
        let cookie = session_cookie(jokester_id).await;
        let uri = format!("/jokes/{}", joke.id);

        let res = app_with(service_with(db.clone()))
            .oneshot(form(&uri, Some(cookie), "intent=delete"))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(res.headers()[header::LOCATION], "/jokes");
        assert!(db.jokes().is_empty());
    }

    #[tokio::test]
    async fn refuses_deleting_foreign_joke() {
        let db = Memory::default();
        let joke = seed_joke(&db, user::Id::new()).await;
        let cookie = session_cookie(user::Id::new()).await;
        let uri = format!("/jokes/{}", joke.id);

        let res = app_with(service_with(db.clone()))
            .oneshot(form(&uri, Some(cookie), "intent=delete"))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            json(res).await["message"],
            "Pssh, nice try. That's not your joke",
        );
        let jokes = db.jokes();
        assert_eq!(jokes.len(), 1);
        assert_eq!(jokes[0].id, joke.id);
    }

    #[tokio::test]
    async fn refuses_deleting_missing_joke() {
        let cookie = session_cookie(user::Id::new()).await;
        let uri = format!("/jokes/{}", joke::Id::new());

        let res = app()
            .oneshot(form(&uri, Some(cookie), "intent=delete"))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            json(res).await["message"],
            "Can't delete what does not exist",
        );
    }

    #[tokio::test]
    async fn action_rejects_unknown_intent() {
        let cookie = session_cookie(user::Id::new()).await;
        let uri = format!("/jokes/{}", joke::Id::new());

        let res = app()
            .oneshot(form(&uri, Some(cookie), "intent=update"))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json(res).await["message"],
            "The intent update is not supported",
        );
    }

    #[tokio::test]
    async fn delete_redirects_anonymous_to_login() {
        let id = joke::Id::new();
        let uri = format!("/jokes/{id}");

        let res = app()
            .oneshot(form(&uri, None, "intent=delete"))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            res.headers()[header::LOCATION],
            format!("/login?redirectTo=%2Fjokes%2F{id}").as_str(),
        );
    }

    #[tokio::test]
    async fn show_unknown_id_is_not_found() {
        let res = app()
            .oneshot(
                Request::get("/jokes/not-a-joke")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(json(res).await["message"], "What a joke! Not found.");
    }

    #[tokio::test]
    async fn store_failure_does_not_log_out() {
        let cookie = session_cookie(user::Id::new()).await;

        let res = app_with(service_with(Memory::unavailable()))
            .oneshot(
                Request::get("/jokes")
                    .header(header::COOKIE, cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(res.headers().get(header::SET_COOKIE).is_none());
        assert_eq!(json(res).await["code"], "INTERNAL_SERVER_ERROR");
    }
}
