use diesel::{pg::Pg, prelude::*};

use crate::db::schema;

#[derive(Debug, Clone, PartialEq, Identifiable, Queryable, Selectable)]
#[diesel(table_name = schema::location)]
#[diesel(check_for_backend(Pg))]
pub struct Location {
    pub id: uuid::Uuid,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::location)]
pub struct NewLocation<'a> {
    pub id: uuid::Uuid,
    pub address: &'a str,
    pub latitude: f64,
    pub longitude: f64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
