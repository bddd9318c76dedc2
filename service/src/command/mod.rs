//! [`Command`] definition.

pub mod authenticate_user;
pub mod authorize_user_session;
pub mod create_joke;
pub mod create_user;
pub mod create_user_session;
pub mod delete_joke;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    authenticate_user::AuthenticateUser,
    authorize_user_session::AuthorizeUserSession, create_joke::CreateJoke,
    create_user::CreateUser, create_user_session::CreateUserSession,
    delete_joke::DeleteJoke,
};
