//! Session cookie codec.

use std::time::Duration;

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use service::domain::user::session;
use smart_default::SmartDefault;
use time::OffsetDateTime;

/// Name of the cookie carrying a [`session::Token`].
pub const COOKIE_NAME: &str = "RJ_session";

/// Attributes of the session cookie.
#[derive(Clone, Copy, Debug, SmartDefault)]
pub struct Settings {
    /// Lifetime of the cookie, sent as its `Max-Age`.
    #[default(Duration::from_secs(60 * 60 * 24 * 30))]
    pub max_age: Duration,

    /// Indicator whether the cookie is restricted to HTTPS.
    #[default(true)]
    pub secure: bool,
}

impl Settings {
    /// Builds a session cookie with the provided `value` and these
    /// [`Settings`] applied.
    fn cookie(self, value: String) -> Cookie<'static> {
        Cookie::build((COOKIE_NAME, value))
            .path("/")
            .secure(self.secure)
            .http_only(true)
            .same_site(SameSite::Lax)
            .build()
    }

    /// Stores the provided [`session::Token`] in the returned [`CookieJar`].
    #[must_use]
    pub fn commit(self, jar: CookieJar, token: &session::Token) -> CookieJar {
        let mut cookie = self.cookie(token.to_string());
        cookie.set_max_age(
            time::Duration::try_from(self.max_age)
                .unwrap_or(time::Duration::MAX),
        );
        jar.add(cookie)
    }

    /// Replaces the session cookie in the returned [`CookieJar`] with an
    /// empty and already expired one.
    #[must_use]
    pub fn destroy(self, jar: CookieJar) -> CookieJar {
        let mut cookie = self.cookie(String::new());
        cookie.set_expires(OffsetDateTime::UNIX_EPOCH);
        jar.add(cookie)
    }
}

/// Extracts the [`session::Token`] from the provided [`CookieJar`], if any.
#[must_use]
pub fn token(jar: &CookieJar) -> Option<session::Token> {
    jar.get(COOKIE_NAME)
        .map(Cookie::value)
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod spec {
    use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
    use service::domain::user::session;

    use super::{token, Settings, COOKIE_NAME};

    fn sample_token() -> session::Token {
        "header.payload.signature".parse().unwrap()
    }

    #[test]
    fn commits_with_attributes() {
        let jar = Settings::default().commit(CookieJar::new(), &sample_token());

        let cookie = jar.get(COOKIE_NAME).unwrap();
        assert_eq!(cookie.value(), "header.payload.signature");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(
            cookie.max_age(),
            Some(time::Duration::seconds(2_592_000)),
        );
    }

    #[test]
    fn reads_committed_token() {
        let jar = Settings::default().commit(CookieJar::new(), &sample_token());

        assert_eq!(token(&jar), Some(sample_token()));
    }

    #[test]
    fn destroys_into_expired_empty_cookie() {
        let jar = Settings::default().commit(CookieJar::new(), &sample_token());
        let jar = Settings::default().destroy(jar);

        let cookie = jar.get(COOKIE_NAME).unwrap();
        assert_eq!(cookie.value(), "");
        assert_eq!(
            cookie.expires_datetime(),
            Some(time::OffsetDateTime::UNIX_EPOCH),
        );
        assert_eq!(token(&jar), None);
    }

    #[test]
    fn ignores_foreign_cookies() {
        let jar = CookieJar::new().add(Cookie::new("theme", "dark"));

        assert_eq!(token(&jar), None);
    }
}
