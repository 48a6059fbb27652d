use diesel::{pg::Pg, prelude::*};

use crate::db::schema;

/// Account row. Anonymous accounts have no email or password hash.
#[derive(Debug, Clone, PartialEq, Eq, Identifiable, Queryable, Selectable)]
#[diesel(table_name = schema::user_account)]
#[diesel(check_for_backend(Pg))]
pub struct User {
    pub id: uuid::Uuid,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub password_hash: Option<String>,
    pub is_active: bool,
    pub is_anonymous: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::user_account)]
pub struct NewUser<'a> {
    pub id: uuid::Uuid,
    pub email: Option<&'a str>,
    pub full_name: Option<&'a str>,
    pub password_hash: Option<&'a str>,
    pub is_anonymous: bool,
}

/// Profile fields that may change after creation. `None` leaves a column as is.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = schema::user_account)]
pub struct UserChanges<'a> {
    pub email: Option<&'a str>,
    pub full_name: Option<&'a str>,
    pub password_hash: Option<&'a str>,
    pub is_active: Option<bool>,
    pub is_anonymous: Option<bool>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}
