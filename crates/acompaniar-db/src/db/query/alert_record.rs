use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::db::enums::AlertState;
use crate::db::schema::{alert_record, location};
use crate::error::DbResult;
use crate::model::alert::{AlertRecord, NewAlertRecord};
use crate::model::location::Location;

/// ## Errors
/// Returns an error if any insert fails.
pub async fn insert_many(
    conn: &mut AsyncPgConnection,
    records: &[NewAlertRecord<'_>],
) -> DbResult<Vec<AlertRecord>> {
    Ok(diesel::insert_into(alert_record::table)
        .values(records)
        .returning(AlertRecord::as_select())
        .get_results(conn)
        .await?)
}

/// ## Summary
/// Moves the given records from `from` to `to`. Records already in another
/// state are left alone, so repeating the call is a no-op.
///
/// ## Errors
/// Returns an error if the update fails.
pub async fn transition(
    conn: &mut AsyncPgConnection,
    ids: &[uuid::Uuid],
    from: AlertState,
    to: AlertState,
    now: DateTime<Utc>,
) -> DbResult<usize> {
    Ok(diesel::update(
        alert_record::table
            .filter(alert_record::id.eq_any(ids))
            .filter(alert_record::state_code.eq(from)),
    )
    .set((
        alert_record::state_code.eq(to),
        alert_record::updated_at.eq(now),
    ))
    .execute(conn)
    .await?)
}

/// ## Summary
/// Returns one creation timestamp per alert the user raised at or after
/// `since`, newest first.
///
/// ## Errors
/// Returns an error if the query fails.
pub async fn alert_times_since(
    conn: &mut AsyncPgConnection,
    user_id: uuid::Uuid,
    since: DateTime<Utc>,
) -> DbResult<Vec<DateTime<Utc>>> {
    let rows: Vec<(uuid::Uuid, Option<DateTime<Utc>>)> = alert_record::table
        .filter(alert_record::user_id.eq(user_id))
        .filter(alert_record::created_at.ge(since))
        .group_by(alert_record::alert_id)
        .select((
            alert_record::alert_id,
            diesel::dsl::max(alert_record::created_at),
        ))
        .load(conn)
        .await?;

    let mut times: Vec<DateTime<Utc>> = rows.into_iter().filter_map(|(_, at)| at).collect();
    times.sort_unstable_by(|a, b| b.cmp(a));
    Ok(times)
}

/// ## Summary
/// Returns the user's most recent records with their location, newest first.
///
/// ## Errors
/// Returns an error if the query fails.
pub async fn history(
    conn: &mut AsyncPgConnection,
    user_id: uuid::Uuid,
    limit: i64,
) -> DbResult<Vec<(AlertRecord, Option<Location>)>> {
    Ok(alert_record::table
        .left_join(location::table)
        .filter(alert_record::user_id.eq(user_id))
        .order((alert_record::created_at.desc(), alert_record::id.asc()))
        .limit(limit)
        .select((AlertRecord::as_select(), Option::<Location>::as_select()))
        .load(conn)
        .await?)
}

/// ## Errors
/// Returns an error if the query fails.
pub async fn by_alert(
    conn: &mut AsyncPgConnection,
    alert_id: uuid::Uuid,
) -> DbResult<Vec<AlertRecord>> {
    Ok(alert_record::table
        .filter(alert_record::alert_id.eq(alert_id))
        .order(alert_record::id.asc())
        .select(AlertRecord::as_select())
        .load(conn)
        .await?)
}
