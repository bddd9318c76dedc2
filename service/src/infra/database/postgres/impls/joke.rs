//! [`Joke`]-related [`Database`] implementations.

use common::operations::{By, Delete, Insert, Limit, Random, Select};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{joke, Joke},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read,
};

/// Builds a [`Joke`] out of the provided [`Row`].
fn from_row(row: &Row) -> Joke {
    Joke {
        id: row.get("id"),
        name: row.get("name"),
        content: row.get("content"),
        jokester_id: row.get("jokester_id"),
        created_at: row.get("created_at"),
    }
}

impl<C> Database<Select<By<Option<Joke>, joke::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Joke>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Joke>, joke::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            SELECT id, name, content, jokester_id, created_at \
            FROM jokes \
            WHERE id = $1::UUID \
            LIMIT 1";
        Ok(self
            .query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<C> Database<Select<By<Option<Joke>, Random>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Joke>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<Option<Joke>, Random>>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            SELECT id, name, content, jokester_id, created_at \
            FROM jokes \
            ORDER BY RANDOM() \
            LIMIT 1";
        Ok(self
            .query_opt(SQL, &[])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<C> Database<Select<By<Vec<read::joke::Summary>, Limit>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<read::joke::Summary>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<read::joke::Summary>, Limit>>,
    ) -> Result<Self::Ok, Self::Err> {
        let Limit(limit) = by.into_inner();
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        const SQL: &str = "\
            SELECT id, name \
            FROM jokes \
            ORDER BY created_at DESC \
            LIMIT $1::INT8";
        Ok(self
            .query(SQL, &[&limit])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| read::joke::Summary {
                id: row.get("id"),
                name: row.get("name"),
            })
            .collect())
    }
}

impl<C> Database<Insert<Joke>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(joke): Insert<Joke>,
    ) -> Result<Self::Ok, Self::Err> {
        let Joke {
            id,
            name,
            content,
            jokester_id,
            created_at,
        } = joke;

        const SQL: &str = "\
            INSERT INTO jokes (\
                id, name, content, jokester_id, created_at\
            ) \
            VALUES (\
                $1::UUID, \
                $2::VARCHAR, $3::TEXT, \
                $4::UUID, \
                $5::TIMESTAMPTZ\
            )";
        self.exec(SQL, &[&id, &name, &content, &jokester_id, &created_at])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Delete<By<Joke, joke::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Joke, joke::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            DELETE FROM jokes \
            WHERE id = $1::UUID";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
