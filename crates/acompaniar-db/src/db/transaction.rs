//! Transaction helper for multi-statement writes.
//!
//! ```rust,ignore
//! use diesel_async::scoped_futures::ScopedFutureExt;
//!
//! with_transaction(&mut conn, |conn| async move {
//!     query::location::insert(conn, &new_location).await?;
//!     query::alert_record::insert_many(conn, &records).await?;
//!     Ok(())
//! }.scope_boxed()).await?;
//! ```

use diesel_async::{AsyncConnection, AsyncPgConnection, scoped_futures::ScopedBoxFuture};

/// ## Summary
/// Runs the closure inside a database transaction and returns its result.
///
/// The transaction commits when the closure returns `Ok` and rolls back on any
/// error, so none of its writes become visible on failure.
///
/// ## Errors
/// Returns any error produced by the closure, or errors raised while starting
/// or committing the transaction.
pub async fn with_transaction<'a, 'conn, T, E, F>(
    conn: &'conn mut AsyncPgConnection,
    callback: F,
) -> Result<T, E>
where
    F: for<'r> FnOnce(&'r mut AsyncPgConnection) -> ScopedBoxFuture<'a, 'r, Result<T, E>>
        + Send
        + 'a,
    E: From<diesel::result::Error> + Send + 'a,
    T: Send + 'a,
    'a: 'conn,
{
    conn.transaction::<T, E, F>(callback).await
}
