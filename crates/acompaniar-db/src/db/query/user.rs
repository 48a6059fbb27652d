use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::db::schema::user_account;
use crate::error::DbResult;
use crate::model::user::{NewUser, User, UserChanges};

/// ## Summary
/// Inserts a user and returns the stored row.
///
/// ## Errors
/// Returns an error if the insert fails, including a unique violation on email.
pub async fn insert(conn: &mut AsyncPgConnection, new_user: &NewUser<'_>) -> DbResult<User> {
    Ok(diesel::insert_into(user_account::table)
        .values(new_user)
        .returning(User::as_select())
        .get_result(conn)
        .await?)
}

/// ## Errors
/// Returns an error if the query fails.
pub async fn by_id(conn: &mut AsyncPgConnection, id: uuid::Uuid) -> DbResult<Option<User>> {
    Ok(user_account::table
        .find(id)
        .select(User::as_select())
        .first(conn)
        .await
        .optional()?)
}

/// ## Errors
/// Returns an error if the query fails.
pub async fn by_email(conn: &mut AsyncPgConnection, email: &str) -> DbResult<Option<User>> {
    Ok(user_account::table
        .filter(user_account::email.eq(email))
        .select(User::as_select())
        .first(conn)
        .await
        .optional()?)
}

/// ## Summary
/// Applies the given changes and returns the updated row, if it exists.
///
/// ## Errors
/// Returns an error if the update fails.
pub async fn update(
    conn: &mut AsyncPgConnection,
    id: uuid::Uuid,
    changes: &UserChanges<'_>,
) -> DbResult<Option<User>> {
    Ok(diesel::update(user_account::table.find(id))
        .set(changes)
        .returning(User::as_select())
        .get_result(conn)
        .await
        .optional()?)
}

/// ## Summary
/// Takes a row lock on the user so concurrent writes to the same user's
/// contact list are serialized. Must be called inside a transaction.
///
/// ## Errors
/// Returns `NotFound` if the user does not exist, or any query error.
pub async fn lock_for_update(conn: &mut AsyncPgConnection, id: uuid::Uuid) -> DbResult<()> {
    let _locked: uuid::Uuid = user_account::table
        .find(id)
        .select(user_account::id)
        .for_update()
        .first(conn)
        .await?;
    Ok(())
}
