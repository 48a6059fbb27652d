use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::db::schema::contact;
use crate::error::DbResult;
use crate::model::contact::{Contact, NewContact};

/// ## Summary
/// Returns a query for a user's contacts in position order.
#[must_use]
pub fn for_user(user_id: uuid::Uuid) -> contact::BoxedQuery<'static, diesel::pg::Pg> {
    contact::table
        .filter(contact::user_id.eq(user_id))
        .order(contact::position.asc())
        .into_boxed()
}

/// ## Errors
/// Returns an error if the query fails.
pub async fn list_for_user(
    conn: &mut AsyncPgConnection,
    user_id: uuid::Uuid,
) -> DbResult<Vec<Contact>> {
    Ok(for_user(user_id)
        .select(Contact::as_select())
        .load(conn)
        .await?)
}

/// ## Summary
/// Returns the user's contacts whose ids are in `ids`, in position order.
/// Ids owned by someone else are not returned.
///
/// ## Errors
/// Returns an error if the query fails.
pub async fn owned_subset(
    conn: &mut AsyncPgConnection,
    user_id: uuid::Uuid,
    ids: &[uuid::Uuid],
) -> DbResult<Vec<Contact>> {
    Ok(for_user(user_id)
        .filter(contact::id.eq_any(ids))
        .select(Contact::as_select())
        .load(conn)
        .await?)
}

/// ## Errors
/// Returns an error if the query fails.
pub async fn by_id(conn: &mut AsyncPgConnection, id: uuid::Uuid) -> DbResult<Option<Contact>> {
    Ok(contact::table
        .find(id)
        .select(Contact::as_select())
        .first(conn)
        .await
        .optional()?)
}

/// ## Errors
/// Returns an error if the query fails.
pub async fn count_for_user(conn: &mut AsyncPgConnection, user_id: uuid::Uuid) -> DbResult<i64> {
    Ok(contact::table
        .filter(contact::user_id.eq(user_id))
        .count()
        .get_result(conn)
        .await?)
}

/// ## Errors
/// Returns an error if the insert fails.
pub async fn insert(conn: &mut AsyncPgConnection, new_contact: &NewContact<'_>) -> DbResult<Contact> {
    Ok(diesel::insert_into(contact::table)
        .values(new_contact)
        .returning(Contact::as_select())
        .get_result(conn)
        .await?)
}

/// ## Errors
/// Returns an error if the update fails.
pub async fn update_details(
    conn: &mut AsyncPgConnection,
    id: uuid::Uuid,
    name: &str,
    phone: &str,
) -> DbResult<Contact> {
    Ok(diesel::update(contact::table.find(id))
        .set((contact::name.eq(name), contact::phone.eq(phone)))
        .returning(Contact::as_select())
        .get_result(conn)
        .await?)
}

/// ## Summary
/// Moves a contact to a new position. The `(user_id, position)` uniqueness
/// check is deferred to commit, so a whole list can be renumbered in place.
///
/// ## Errors
/// Returns an error if the update fails.
pub async fn set_position(
    conn: &mut AsyncPgConnection,
    id: uuid::Uuid,
    position: i32,
) -> DbResult<()> {
    diesel::update(contact::table.find(id))
        .set(contact::position.eq(position))
        .execute(conn)
        .await?;
    Ok(())
}

/// ## Errors
/// Returns an error if the delete fails.
pub async fn delete(conn: &mut AsyncPgConnection, id: uuid::Uuid) -> DbResult<usize> {
    Ok(diesel::delete(contact::table.find(id)).execute(conn).await?)
}

/// ## Errors
/// Returns an error if the delete fails.
pub async fn delete_for_user(conn: &mut AsyncPgConnection, user_id: uuid::Uuid) -> DbResult<usize> {
    Ok(diesel::delete(contact::table.filter(contact::user_id.eq(user_id)))
        .execute(conn)
        .await?)
}
