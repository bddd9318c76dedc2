//! [`Command`] for authenticating a [`User`] by credentials.

use common::operations::{By, Select};
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

/// [`Command`] for authenticating a [`User`] by credentials.
///
/// Never reveals whether the [`Username`] or the [`Password`] was wrong.
#[derive(Clone, Debug)]
pub struct AuthenticateUser {
    /// [`Username`] of a [`User`].
    pub username: user::Username,

    /// [`Password`] of a [`User`].
    pub password: SecretBox<user::Password>,
}

impl<Db> Command<AuthenticateUser> for Service<Db>
where
    Db: for<'l> Database<
        Select<By<Option<User>, &'l user::Username>>,
        Ok = Option<User>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = User;
    type Err = Traced<ExecutionError>;

    #[tracing::instrument(
        skip_all,
        fields(username = %cmd.username),
    )]
    async fn execute(
        &self,
        cmd: AuthenticateUser,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let AuthenticateUser { username, password } = cmd;

        let user = self
            .database()
            .execute(Select(By::new(&username)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or_else(|| E::WrongCredentials)
            .map_err(tracerr::wrap!())?;

        let hash = user.password_hash.clone();
        let is_correct = task::spawn_blocking(move || {
            hash.verify(password.expose_secret())
        })
        .await
        .map_err(tracerr::from_and_wrap!(=> E))?
        .map_err(tracerr::from_and_wrap!(=> E))?;
        if !is_correct {
            return Err(tracerr::new!(E::WrongCredentials));
        }

        Ok(user)
    }
}

/// Error of [`AuthenticateUser`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// Background verification task failed to complete.
    #[display("Failed to verify a password: {_0}")]
    VerificationTask(task::JoinError),

    /// Stored [`PasswordHash`] is malformed.
    #[display("Failed to verify a password: {_0}")]
    PasswordHash(bcrypt::BcryptError),

    /// Provided credentials don't match any [`User`].
    #[display("Wrong `User` credentials")]
    WrongCredentials,
}

#[cfg(test)]
mod spec {
    use common::{operations::Insert, DateTime};
    use secrecy::SecretBox;

    use crate::{
        domain::{user, User},
        infra::{
            database::{memory::service, Memory},
            Database as _,
        },
        Command as _,
    };

    use super::{AuthenticateUser, ExecutionError};

    async fn seed_kody(db: &Memory) -> User {
        let now = DateTime::now();
        let kody = User {
            id: user::Id::new(),
            username: user::Username::new("kody").unwrap(),
            password_hash: user::PasswordHash::new(
                &user::Password::new("twixrox").unwrap(),
            )
            .unwrap(),
            created_at: now.coerce(),
            updated_at: now.coerce(),
        };
        db.execute(Insert(kody.clone())).await.unwrap();
        kody
    }

    fn login(username: &str, password: &str) -> AuthenticateUser {
        AuthenticateUser {
            username: user::Username::new(username).unwrap(),
            password: SecretBox::init_with(|| {
                user::Password::new(password).unwrap()
            }),
        }
    }

    #[tokio::test]
    async fn accepts_correct_credentials() {
        let db = Memory::default();
        let kody = seed_kody(&db).await;

        let user = service(db)
            .execute(login("kody", "twixrox"))
            .await
            .unwrap();

        assert_eq!(user.id, kody.id);
        assert_eq!(user.username, kody.username);
    }

    #[tokio::test]
    async fn rejects_wrong_password() {
        let db = Memory::default();
        _ = seed_kody(&db).await;

        let err = service(db)
            .execute(login("kody", "twixrocks"))
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::WrongCredentials));
    }

    #[tokio::test]
    async fn rejects_unknown_username_the_same_way() {
        let db = Memory::default();
        _ = seed_kody(&db).await;

        let err = service(db)
            .execute(login("jody", "twixrox"))
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::WrongCredentials));
    }
}
