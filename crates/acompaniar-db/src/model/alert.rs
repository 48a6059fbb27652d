use diesel::{pg::Pg, prelude::*};

use crate::{db::schema, model};

pub use crate::db::enums::AlertState;

/// One (alert, recipient) audit row.
///
/// The contact name and phone are copied at creation so history survives the
/// contact being edited or removed.
#[derive(Debug, Clone, PartialEq, Eq, Identifiable, Queryable, Selectable, Associations)]
#[diesel(table_name = schema::alert_record)]
#[diesel(check_for_backend(Pg))]
#[diesel(belongs_to(model::user::User, foreign_key = user_id))]
pub struct AlertRecord {
    pub id: uuid::Uuid,
    pub alert_id: uuid::Uuid,
    pub user_id: uuid::Uuid,
    pub contact_id: Option<uuid::Uuid>,
    pub contact_name: String,
    pub contact_phone: String,
    pub location_id: Option<uuid::Uuid>,
    pub message: Option<String>,
    pub state_code: AlertState,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::alert_record)]
pub struct NewAlertRecord<'a> {
    pub id: uuid::Uuid,
    pub alert_id: uuid::Uuid,
    pub user_id: uuid::Uuid,
    pub contact_id: Option<uuid::Uuid>,
    pub contact_name: &'a str,
    pub contact_phone: &'a str,
    pub location_id: Option<uuid::Uuid>,
    pub message: Option<&'a str>,
    pub state_code: AlertState,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}
