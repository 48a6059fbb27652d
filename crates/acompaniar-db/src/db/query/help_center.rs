use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::db::schema::{help_center, help_center_category, location};
use crate::error::DbResult;
use crate::model::help_center::{HelpCenter, HelpCenterCategory, HelpCenterImage, HelpCenterPhone};
use crate::model::location::Location;

pub type HelpCenterRow = (HelpCenter, Location, Option<HelpCenterCategory>);

/// ## Summary
/// Returns a page of help centers ordered by name, with their location and
/// category.
///
/// ## Errors
/// Returns an error if the query fails.
pub async fn page(
    conn: &mut AsyncPgConnection,
    offset: i64,
    limit: i64,
) -> DbResult<Vec<HelpCenterRow>> {
    Ok(help_center::table
        .inner_join(location::table)
        .left_join(help_center_category::table)
        .order((help_center::name.asc(), help_center::id.asc()))
        .offset(offset)
        .limit(limit)
        .select((
            HelpCenter::as_select(),
            Location::as_select(),
            Option::<HelpCenterCategory>::as_select(),
        ))
        .load(conn)
        .await?)
}

/// ## Errors
/// Returns an error if the query fails.
pub async fn count(conn: &mut AsyncPgConnection) -> DbResult<i64> {
    Ok(help_center::table.count().get_result(conn).await?)
}

/// ## Errors
/// Returns an error if the query fails.
pub async fn by_id(conn: &mut AsyncPgConnection, id: uuid::Uuid) -> DbResult<Option<HelpCenterRow>> {
    Ok(help_center::table
        .inner_join(location::table)
        .left_join(help_center_category::table)
        .filter(help_center::id.eq(id))
        .select((
            HelpCenter::as_select(),
            Location::as_select(),
            Option::<HelpCenterCategory>::as_select(),
        ))
        .first(conn)
        .await
        .optional()?)
}

/// ## Errors
/// Returns an error if the query fails.
pub async fn phones_for(
    conn: &mut AsyncPgConnection,
    centers: &[HelpCenter],
) -> DbResult<Vec<HelpCenterPhone>> {
    Ok(HelpCenterPhone::belonging_to(centers)
        .select(HelpCenterPhone::as_select())
        .load(conn)
        .await?)
}

/// ## Errors
/// Returns an error if the query fails.
pub async fn images_for(
    conn: &mut AsyncPgConnection,
    centers: &[HelpCenter],
) -> DbResult<Vec<HelpCenterImage>> {
    Ok(HelpCenterImage::belonging_to(centers)
        .select(HelpCenterImage::as_select())
        .load(conn)
        .await?)
}
