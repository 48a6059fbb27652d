use diesel::{pg::Pg, prelude::*};

use crate::{db::schema, model};

#[derive(Debug, Clone, PartialEq, Eq, Identifiable, Queryable, Selectable)]
#[diesel(table_name = schema::help_center)]
#[diesel(check_for_backend(Pg))]
pub struct HelpCenter {
    pub id: uuid::Uuid,
    pub name: String,
    pub description: String,
    pub location_id: uuid::Uuid,
    pub category_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Identifiable, Queryable, Selectable, Associations)]
#[diesel(table_name = schema::help_center_phone)]
#[diesel(check_for_backend(Pg))]
#[diesel(belongs_to(model::help_center::HelpCenter, foreign_key = help_center_id))]
pub struct HelpCenterPhone {
    pub id: uuid::Uuid,
    pub help_center_id: uuid::Uuid,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Identifiable, Queryable, Selectable, Associations)]
#[diesel(table_name = schema::help_center_image)]
#[diesel(check_for_backend(Pg))]
#[diesel(belongs_to(model::help_center::HelpCenter, foreign_key = help_center_id))]
pub struct HelpCenterImage {
    pub id: uuid::Uuid,
    pub help_center_id: uuid::Uuid,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable)]
#[diesel(table_name = schema::help_center_category)]
#[diesel(check_for_backend(Pg))]
pub struct HelpCenterCategory {
    pub code: String,
    pub description: String,
}
