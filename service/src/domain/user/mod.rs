//! [`User`] definitions.

pub mod session;

use std::sync::LazyLock;

#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use regex::Regex;
use secrecy::{zeroize::Zeroize, CloneableSecret};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use self::session::Session;

/// Registered jokester.
#[derive(Clone, Debug)]
pub struct User {
    /// ID of this [`User`].
    pub id: Id,

    /// [`Username`] of this [`User`].
    pub username: Username,

    /// [`PasswordHash`] of this [`User`].
    pub password_hash: PasswordHash,

    /// [`DateTime`] when this [`User`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`User`] was last updated.
    pub updated_at: ModificationDateTime,
}

/// ID of a [`User`].
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

/// Unique name a [`User`] logs in with.
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Username(String);

impl Username {
    /// Minimal number of characters in a [`Username`].
    pub const MIN_LEN: usize = 3;

    /// Maximal number of characters in a [`Username`].
    pub const MAX_LEN: usize = 64;

    /// Creates a new [`Username`] if the given `username` is valid.
    #[must_use]
    pub fn new(username: impl Into<String>) -> Option<Self> {
        let username = username.into();
        Self::check(&username).then_some(Self(username))
    }

    /// Checks whether the given `username` is a valid [`Username`].
    fn check(username: impl AsRef<str>) -> bool {
        /// Regular expression checking [`Username`] invariants:
        /// - Must not start/end with whitespace;
        /// - Must not contain control characters.
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^\S(?:[^\p{Cc}]*\S)?$").expect("valid regex")
        });

        let username = username.as_ref();
        let len = username.chars().count();
        (Self::MIN_LEN..=Self::MAX_LEN).contains(&len)
            && REGEX.is_match(username)
    }
}

/// Password of a [`User`].
#[derive(AsRef, Clone, derive_more::Debug, Eq, PartialEq)]
#[as_ref(str)]
pub struct Password(#[debug(skip)] String);

impl Password {
    /// Minimal number of characters in a [`Password`].
    pub const MIN_LEN: usize = 6;

    /// Maximal number of bytes in a [`Password`].
    ///
    /// [`bcrypt`] silently truncates longer inputs.
    pub const MAX_BYTES: usize = 72;

    /// Creates a new [`Password`] if the given `password` is valid.
    #[must_use]
    pub fn new(password: impl Into<String>) -> Option<Self> {
        let password = password.into();
        Self::check(&password).then_some(Self(password))
    }

    /// Checks whether the given `password` is a valid [`Password`].
    fn check(password: impl AsRef<str>) -> bool {
        let password = password.as_ref();
        password.chars().count() >= Self::MIN_LEN
            && password.len() <= Self::MAX_BYTES
    }
}

impl CloneableSecret for Password {}
impl Zeroize for Password {
    fn zeroize(&mut self) {
        self.0.zeroize();
    }
}

/// Salted [`bcrypt`] hash of a [`Password`].
#[derive(Clone, Debug, Display, Eq, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct PasswordHash(String);

impl PasswordHash {
    /// [`bcrypt`] cost factor used for new [`PasswordHash`]es.
    pub const COST: u32 = 10;

    /// Hashes the given [`Password`] with a fresh salt.
    ///
    /// This is CPU-heavy, so should be run on a blocking thread.
    ///
    /// # Errors
    ///
    /// If [`bcrypt`] fails to hash the [`Password`].
    pub fn new(password: &Password) -> Result<Self, bcrypt::BcryptError> {
        let password: &str = password.as_ref();
        bcrypt::hash(password, Self::COST).map(Self)
    }

    /// Verifies whether the given [`Password`] matches this [`PasswordHash`].
    ///
    /// This is CPU-heavy, so should be run on a blocking thread.
    ///
    /// # Errors
    ///
    /// If this [`PasswordHash`] is not a valid [`bcrypt`] hash.
    pub fn verify(
        &self,
        password: &Password,
    ) -> Result<bool, bcrypt::BcryptError> {
        let password: &str = password.as_ref();
        bcrypt::verify(password, &self.0)
    }
}

/// [`DateTime`] when a [`User`] was created.
pub type CreationDateTime = DateTimeOf<(User, unit::Creation)>;

/// [`DateTime`] when a [`User`] was last updated.
pub type ModificationDateTime = DateTimeOf<(User, unit::Modification)>;
