//! [`Query`] collection related to a single [`Joke`].

use common::operations::{self, By};

use crate::domain::{joke, Joke};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries a [`Joke`] by its [`joke::Id`].
pub type ById = DatabaseQuery<By<Option<Joke>, joke::Id>>;

/// Queries a uniformly random [`Joke`], if there is any.
pub type Random = DatabaseQuery<By<Option<Joke>, operations::Random>>;
