//! Domain definitions.

pub mod joke;
pub mod user;

pub use self::{joke::Joke, user::User};
