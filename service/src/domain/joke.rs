//! [`Joke`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::user;
#[cfg(doc)]
use crate::domain::User;

/// Short joke posted by a [`User`].
#[derive(Clone, Debug)]
pub struct Joke {
    /// ID of this [`Joke`].
    pub id: Id,

    /// [`Name`] of this [`Joke`].
    pub name: Name,

    /// [`Content`] of this [`Joke`].
    pub content: Content,

    /// ID of the [`User`] who posted this [`Joke`], if any.
    pub jokester_id: Option<user::Id>,

    /// [`DateTime`] when this [`Joke`] was created.
    pub created_at: CreationDateTime,
}

impl Joke {
    /// Checks whether the provided [`User`] is the jokester of this [`Joke`].
    #[must_use]
    pub fn is_told_by(&self, user_id: user::Id) -> bool {
        self.jokester_id == Some(user_id)
    }
}

/// ID of a [`Joke`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Name of a [`Joke`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Name(String);

impl Name {
    /// Minimal number of characters in a [`Name`].
    pub const MIN_LEN: usize = 3;

    /// Maximal number of characters in a [`Name`].
    pub const MAX_LEN: usize = 256;

    /// Creates a new [`Name`] if the given `name` is valid.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        Self::check(&name).then_some(Self(name))
    }

    /// Checks whether the given `name` is a valid [`Name`].
    fn check(name: impl AsRef<str>) -> bool {
        (Self::MIN_LEN..=Self::MAX_LEN)
            .contains(&name.as_ref().chars().count())
    }
}

/// Content of a [`Joke`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Content(String);

impl Content {
    /// Minimal number of characters in a [`Content`].
    pub const MIN_LEN: usize = 10;

    /// Maximal number of characters in a [`Content`].
    pub const MAX_LEN: usize = 4096;

    /// Creates a new [`Content`] if the given `content` is valid.
    #[must_use]
    pub fn new(content: impl Into<String>) -> Option<Self> {
        let content = content.into();
        Self::check(&content).then_some(Self(content))
    }

    /// Checks whether the given `content` is a valid [`Content`].
    fn check(content: impl AsRef<str>) -> bool {
        (Self::MIN_LEN..=Self::MAX_LEN)
            .contains(&content.as_ref().chars().count())
    }
}

/// [`DateTime`] when a [`Joke`] was created.
pub type CreationDateTime = DateTimeOf<(Joke, unit::Creation)>;

#[cfg(test)]
mod spec {
    use common::DateTime;

    use super::{Content, Id, Joke, Name};
    use crate::domain::user;

    #[test]
    fn name_length() {
        assert!(Name::new("ab").is_none());
        assert!(Name::new("abc").is_some());
        assert!(Name::new("x".repeat(Name::MAX_LEN)).is_some());
        assert!(Name::new("x".repeat(Name::MAX_LEN + 1)).is_none());
    }

    #[test]
    fn content_length() {
        assert!(Content::new("too short").is_none());
        assert!(Content::new("just right").is_some());
        assert!("x".repeat(Content::MAX_LEN + 1).parse::<Content>().is_err());
    }

    #[test]
    fn counts_characters_not_bytes() {
        assert!(Name::new("ёжи").is_some());
    }

    #[test]
    fn told_by_jokester_only() {
        let kody = user::Id::new();
        let joke = Joke {
            id: Id::new(),
            name: Name::new("Road worker").unwrap(),
            content: Content::new("I never wanted to believe that my Dad \
                                   was stealing from his job as a road \
                                   worker. But when I got home, all the \
                                   signs were there.")
                .unwrap(),
            jokester_id: Some(kody),
            created_at: DateTime::now().coerce(),
        };

        assert!(joke.is_told_by(kody));
        assert!(!joke.is_told_by(user::Id::new()));
        assert!(!Joke {
            jokester_id: None,
            ..joke
        }
        .is_told_by(kody));
    }
}
