//! [`Command`] for registering a new [`User`].

use common::{
    operations::{By, Insert, Select},
    DateTime,
};
use derive_more::{Display, Error, From};
use secrecy::{ExposeSecret as _, SecretBox};
use tokio::task;
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::user::{Password, PasswordHash, Username};
use crate::{
    domain::{user, User},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for registering a new [`User`].
#[derive(Clone, Debug)]
pub struct CreateUser {
    /// [`Username`] of a new [`User`].
    pub username: user::Username,

    /// [`Password`] of a new [`User`].
    pub password: SecretBox<user::Password>,
}

impl CreateUser {
    /// Name of the unique constraint on [`Username`]s in the [`Database`].
    const USERNAME_CONSTRAINT: &'static str = "users_username_key";
}

impl<Db> Command<CreateUser> for Service<Db>
where
    Db: for<'l> Database<
            Select<By<Option<User>, &'l user::Username>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Insert<User>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = User;
    type Err = Traced<ExecutionError>;

    #[tracing::instrument(
        skip_all,
        fields(username = %cmd.username),
    )]
    async fn execute(&self, cmd: CreateUser) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateUser { username, password } = cmd;

        let u = self
            .database()
            .execute(Select(By::new(&username)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if u.is_some() {
            return Err(tracerr::new!(E::UsernameOccupied(username)));
        }

        let password_hash = task::spawn_blocking(move || {
            user::PasswordHash::new(password.expose_secret())
        })
        .await
        .map_err(tracerr::from_and_wrap!(=> E))?
        .map_err(tracerr::from_and_wrap!(=> E))?;

        let now = DateTime::now();
        let user = User {
            id: user::Id::new(),
            username,
            password_hash,
            created_at: now.coerce(),
            updated_at: now.coerce(),
        };

        self.database()
            .execute(Insert(user.clone()))
            .await
            .map_err(|e| {
                if e.as_ref()
                    .is_unique_violation(Some(CreateUser::USERNAME_CONSTRAINT))
                {
                    tracerr::new!(E::UsernameOccupied(user.username.clone()))
                } else {
                    tracerr::map_from(e)
                }
            })?;

        tracing::info!(user.id = %user.id, "registered new `User`");

        Ok(user)
    }
}

/// Error of [`CreateUser`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// Background hashing task failed to complete.
    #[display("Failed to hash a password: {_0}")]
    HashingTask(task::JoinError),

    /// [`bcrypt`] failed to produce a [`PasswordHash`].
    #[display("Failed to hash a password: {_0}")]
    PasswordHash(bcrypt::BcryptError),

    /// [`Username`] is already taken by another [`User`].
    #[display("`{_0}` username is occupied")]
    #[from(ignore)]
    UsernameOccupied(#[error(not(source))] user::Username),
}

#[cfg(test)]
mod spec {
    use secrecy::SecretBox;

    use crate::{
        domain::user,
        infra::database::{memory::service, Memory},
        Command as _,
    };

    use super::{CreateUser, ExecutionError};

    fn register(username: &str, password: &str) -> CreateUser {
        CreateUser {
            username: user::Username::new(username).unwrap(),
            password: SecretBox::init_with(|| {
                user::Password::new(password).unwrap()
            }),
        }
    }

    #[tokio::test]
    async fn stores_hashed_password() {
        let db = Memory::default();
        let svc = service(db.clone());

        let user = svc.execute(register("kody", "twixrox")).await.unwrap();

        let stored = db.users();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, user.id);
        assert_eq!(stored[0].username.to_string(), "kody");
        assert_ne!(stored[0].password_hash.to_string(), "twixrox");
        assert!(stored[0]
            .password_hash
            .verify(&user::Password::new("twixrox").unwrap())
            .unwrap());
    }

    #[tokio::test]
    async fn rejects_occupied_username() {
        let db = Memory::default();
        let svc = service(db.clone());
        _ = svc.execute(register("kody", "twixrox")).await.unwrap();

        let err = svc
            .execute(register("kody", "another1"))
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::UsernameOccupied(u) if u.to_string() == "kody",
        ));
        assert_eq!(db.users().len(), 1);
    }

    #[tokio::test]
    async fn surfaces_store_failure() {
        let svc = service(Memory::unavailable());

        let err = svc
            .execute(register("kody", "twixrox"))
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::Db(_)));
    }
}
