//! [`Command`] for deleting a [`Joke`] by its jokester.

use common::operations::{By, Commit, Delete, Select, Transact, Transacted};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::User;
use crate::{
    domain::{joke, user, Joke},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for deleting a [`Joke`] by its jokester.
#[derive(Clone, Copy, Debug)]
pub struct DeleteJoke {
    /// ID of the [`Joke`] to delete.
    pub joke_id: joke::Id,

    /// ID of the [`User`] initiating the deletion.
    pub initiator_id: user::Id,
}

impl<Db> Command<DeleteJoke> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<Joke>, joke::Id>>,
            Ok = Option<Joke>,
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<Joke, joke::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<Commit, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = Joke;
    type Err = Traced<ExecutionError>;

    #[tracing::instrument(
        skip_all,
        fields(
            initiator_id = %cmd.initiator_id,
            joke_id = %cmd.joke_id,
        ),
    )]
    async fn execute(&self, cmd: DeleteJoke) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeleteJoke {
            joke_id,
            initiator_id,
        } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let joke = tx
            .execute(Select(By::<Option<Joke>, _>::new(joke_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::JokeNotExists(joke_id))
            .map_err(tracerr::wrap!())?;
        if !joke.is_told_by(initiator_id) {
            return Err(tracerr::new!(E::NotJokester(initiator_id)));
        }

        tx.execute(Delete(By::new(joke_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        Ok(joke)
    }
}

/// Error of [`DeleteJoke`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Joke`] doesn't exist.
    #[display("`Joke(id: {_0})` does not exist")]
    #[from(ignore)]
    JokeNotExists(#[error(not(source))] joke::Id),

    /// Initiator is not the jokester of the [`Joke`].
    #[display("`User(id: {_0})` is not the jokester")]
    #[from(ignore)]
    NotJokester(#[error(not(source))] user::Id),
}
