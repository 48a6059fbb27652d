use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::db::schema::location;
use crate::error::DbResult;
use crate::model::location::{Location, NewLocation};

/// ## Errors
/// Returns an error if the insert fails.
pub async fn insert(
    conn: &mut AsyncPgConnection,
    new_location: &NewLocation<'_>,
) -> DbResult<Location> {
    Ok(diesel::insert_into(location::table)
        .values(new_location)
        .returning(Location::as_select())
        .get_result(conn)
        .await?)
}

/// ## Errors
/// Returns an error if the query fails.
pub async fn by_ids(conn: &mut AsyncPgConnection, ids: &[uuid::Uuid]) -> DbResult<Vec<Location>> {
    Ok(location::table
        .filter(location::id.eq_any(ids))
        .select(Location::as_select())
        .load(conn)
        .await?)
}
