//! [`Command`] for creating a new [`Joke`].

use common::{operations::Insert, DateTime};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::{
    joke::{Content, Name},
    User,
};
use crate::{
    domain::{joke, user, Joke},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`Joke`].
#[derive(Clone, Debug)]
pub struct CreateJoke {
    /// [`Name`] of a new [`Joke`].
    pub name: joke::Name,

    /// [`Content`] of a new [`Joke`].
    pub content: joke::Content,

    /// ID of the [`User`] telling a new [`Joke`].
    pub jokester_id: user::Id,
}

impl<Db> Command<CreateJoke> for Service<Db>
where
    Db: Database<Insert<Joke>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = Joke;
    type Err = Traced<ExecutionError>;

    #[tracing::instrument(
        skip_all,
        fields(jokester_id = %cmd.jokester_id, name = %cmd.name),
    )]
    async fn execute(&self, cmd: CreateJoke) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateJoke {
            name,
            content,
            jokester_id,
        } = cmd;

        let joke = Joke {
            id: joke::Id::new(),
            name,
            content,
            jokester_id: Some(jokester_id),
            created_at: DateTime::now().coerce(),
        };
        self.database()
            .execute(Insert(joke.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        Ok(joke)
    }
}

/// Error of [`CreateJoke`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),
}

#[cfg(test)]
mod spec {
    use crate::{
        domain::{joke, user},
        infra::database::{memory::service, Memory},
        Command as _,
    };

    use super::CreateJoke;

    #[tokio::test]
    async fn stores_joke_of_jokester() {
        let db = Memory::default();
        let kody = user::Id::new();

        let joke = service(db.clone())
            .execute(CreateJoke {
                name: joke::Name::new("Frisbee").unwrap(),
                content: joke::Content::new(
                    "I was wondering why the frisbee was getting bigger, \
                     then it hit me.",
                )
                .unwrap(),
                jokester_id: kody,
            })
            .await
            .unwrap();

        let stored = db.jokes();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, joke.id);
        assert_eq!(stored[0].name.to_string(), "Frisbee");
        assert!(stored[0].is_told_by(kody));
    }
}
