//! [`Query`] collection related to the multiple [`Joke`]s.

use common::operations::{By, Limit};

use crate::read;
#[cfg(doc)]
use crate::{domain::Joke, Query};

use super::DatabaseQuery;

/// Queries the latest [`Joke`]s, newest first, up to the provided [`Limit`].
pub type Latest = DatabaseQuery<By<Vec<read::joke::Summary>, Limit>>;
