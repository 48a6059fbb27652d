//! Read-only help-center directory views.

use serde::Serialize;

use acompaniar_db::model::help_center::{HelpCenter, HelpCenterCategory};
use acompaniar_db::model::location::Location;

/// A help center as exposed by the API.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HelpCenterView {
    pub id: uuid::Uuid,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "descripcion")]
    pub description: String,
    #[serde(rename = "categoria")]
    pub category: Option<String>,
    #[serde(rename = "categoria_descripcion")]
    pub category_description: Option<String>,
    #[serde(rename = "direccion")]
    pub address: String,
    #[serde(rename = "latitud")]
    pub latitude: f64,
    #[serde(rename = "longitud")]
    pub longitude: f64,
    #[serde(rename = "telefonos")]
    pub phones: Vec<String>,
    #[serde(rename = "imagenes")]
    pub images: Vec<String>,
}

impl HelpCenterView {
    #[must_use]
    pub fn from_rows(
        center: HelpCenter,
        location: Location,
        category: Option<HelpCenterCategory>,
        phones: Vec<String>,
        images: Vec<String>,
    ) -> Self {
        let (category, category_description) = category
            .map(|c| (Some(c.code), Some(c.description)))
            .unwrap_or_default();

        Self {
            id: center.id,
            name: center.name,
            description: center.description,
            category,
            category_description,
            address: location.address,
            latitude: location.latitude,
            longitude: location.longitude,
            phones,
            images,
        }
    }
}

/// Page bounds for directory listings.
pub const DEFAULT_PAGE_SIZE: i64 = 100;
pub const MAX_PAGE_SIZE: i64 = 500;

/// ## Summary
/// Clamps user-supplied paging to a non-negative offset and a bounded limit.
#[must_use]
pub fn clamp_page(skip: Option<i64>, limit: Option<i64>) -> (i64, i64) {
    let offset = skip.unwrap_or(0).max(0);
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    (offset, limit)
}
