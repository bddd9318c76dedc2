//! [`Joke`] read model definitions.
//!
//! [`Joke`]: crate::domain::Joke

use crate::domain::joke;
#[cfg(doc)]
use crate::domain::Joke;

/// Short listing entry of a [`Joke`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Summary {
    /// ID of the [`Joke`].
    pub id: joke::Id,

    /// [`joke::Name`] of the [`Joke`].
    pub name: joke::Name,
}
