//! In-memory [`Database`] implementation.

#[cfg(test)]
use std::time::Duration;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use common::operations::{
    By, Commit, Delete, Insert, Limit, Random, Select, Transact,
};
use derive_more::{Display, Error as StdError};
use tracerr::Traced;

#[cfg(test)]
use crate::{Config, Service};
use crate::{
    domain::{joke, user, Joke, User},
    infra::{database, Database},
    read,
};

/// Secret signing [`Session`]s in tests.
///
/// [`Session`]: crate::domain::user::Session
#[cfg(test)]
pub(crate) const SECRET: &[u8] = b"there is no spoon";

/// Creates a new [`Service`] backed by the provided [`Memory`] database.
#[cfg(test)]
pub(crate) fn service(db: Memory) -> Service<Memory> {
    Service::new(Config::new(SECRET, Duration::from_secs(60 * 60)), db)
}

/// Error of an unavailable [`Memory`] database.
#[derive(Clone, Copy, Debug, Display, StdError)]
#[display("`Memory` database is unavailable")]
pub struct Unavailable;

/// In-memory [`Database`] keeping everything in [`Vec`]s.
///
/// [`Transact`] shares the same state, so nothing is rolled back.
#[derive(Clone, Debug, Default)]
pub struct Memory {
    /// Shared state of this [`Memory`].
    state: Arc<Mutex<State>>,

    /// Indicator whether every operation fails as if the store is down.
    unavailable: bool,
}

/// State of a [`Memory`] database.
#[derive(Debug, Default)]
struct State {
    /// Stored [`User`]s.
    users: Vec<User>,

    /// Stored [`Joke`]s, oldest first.
    jokes: Vec<Joke>,
}

impl Memory {
    /// Creates a new [`Memory`] database failing every operation.
    #[must_use]
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    /// Returns all the stored [`User`]s.
    #[must_use]
    pub fn users(&self) -> Vec<User> {
        self.state().users.clone()
    }

    /// Returns all the stored [`Joke`]s.
    #[must_use]
    pub fn jokes(&self) -> Vec<Joke> {
        self.state().jokes.clone()
    }

    /// Locks the [`State`] of this [`Memory`].
    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Emulates an unavailable store, if configured so.
    fn ensure_available(&self) -> Result<(), Traced<database::Error>> {
        if self.unavailable {
            return Err(tracerr::new!(database::Error::from(Unavailable)));
        }
        Ok(())
    }
}

impl Database<Transact> for Memory {
    type Ok = Self;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        self.ensure_available()?;
        Ok(self.clone())
    }
}

impl Database<Commit> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        self.ensure_available()
    }
}

impl Database<Select<By<Option<User>, user::Id>>> for Memory {
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.ensure_available()?;
        let id = by.into_inner();
        Ok(self.state().users.iter().find(|u| u.id == id).cloned())
    }
}

impl<'l> Database<Select<By<Option<User>, &'l user::Username>>> for Memory {
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, &'l user::Username>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.ensure_available()?;
        let username = by.into_inner();
        Ok(self
            .state()
            .users
            .iter()
            .find(|u| &u.username == username)
            .cloned())
    }
}

impl Database<Insert<User>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(user): Insert<User>,
    ) -> Result<Self::Ok, Self::Err> {
        self.ensure_available()?;
        self.state().users.push(user);
        Ok(())
    }
}

impl Database<Select<By<Option<Joke>, joke::Id>>> for Memory {
    type Ok = Option<Joke>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Joke>, joke::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.ensure_available()?;
        let id = by.into_inner();
        Ok(self.state().jokes.iter().find(|j| j.id == id).cloned())
    }
}

impl Database<Select<By<Option<Joke>, Random>>> for Memory {
    type Ok = Option<Joke>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<Option<Joke>, Random>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.ensure_available()?;
        // The oldest one, to stay deterministic.
        Ok(self.state().jokes.first().cloned())
    }
}

impl Database<Select<By<Vec<read::joke::Summary>, Limit>>> for Memory {
    type Ok = Vec<read::joke::Summary>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<read::joke::Summary>, Limit>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.ensure_available()?;
        let Limit(limit) = by.into_inner();
        Ok(self
            .state()
            .jokes
            .iter()
            .rev()
            .take(limit)
            .map(|j| read::joke::Summary {
                id: j.id,
                name: j.name.clone(),
            })
            .collect())
    }
}

impl Database<Insert<Joke>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(joke): Insert<Joke>,
    ) -> Result<Self::Ok, Self::Err> {
        self.ensure_available()?;
        self.state().jokes.push(joke);
        Ok(())
    }
}

impl Database<Delete<By<Joke, joke::Id>>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Joke, joke::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.ensure_available()?;
        let id = by.into_inner();
        self.state().jokes.retain(|j| j.id != id);
        Ok(())
    }
}
