use diesel::{pg::Pg, prelude::*};

use crate::{db::schema, model};

/// Emergency contact. `position == 0` is the primary contact.
#[derive(Debug, Clone, PartialEq, Eq, Identifiable, Queryable, Selectable, Associations)]
#[diesel(table_name = schema::contact)]
#[diesel(check_for_backend(Pg))]
#[diesel(belongs_to(model::user::User, foreign_key = user_id))]
pub struct Contact {
    pub id: uuid::Uuid,
    pub user_id: uuid::Uuid,
    pub name: String,
    pub phone: String,
    pub position: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Contact {
    #[must_use]
    pub const fn is_primary(&self) -> bool {
        self.position == 0
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::contact)]
pub struct NewContact<'a> {
    pub id: uuid::Uuid,
    pub user_id: uuid::Uuid,
    pub name: &'a str,
    pub phone: &'a str,
    pub position: i32,
}
