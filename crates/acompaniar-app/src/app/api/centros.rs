use salvo::{Depot, Request, Response, Router, handler, http::StatusCode, writing::Json};
use serde::Serialize;

use super::CENTERS_ROUTE_COMPONENT;
use super::response::{path_id, render_error, render_service_error, services};
use acompaniar_service::help_center::{HelpCenterView, clamp_page};

#[derive(Debug, Serialize)]
pub struct CentersResponse {
    pub centros: Vec<HelpCenterView>,
    pub total: i64,
}

/// ## Summary
/// GET /centros?skip=&limit= - Public help-center directory, by name
#[handler]
async fn list_centers(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let Some(services) = services(depot, res) else {
        return;
    };

    let (offset, limit) = clamp_page(req.query::<i64>("skip"), req.query::<i64>("limit"));
    match services.help_centers.list(offset, limit).await {
        Ok((centros, total)) => res.render(Json(CentersResponse { centros, total })),
        Err(e) => render_service_error(res, &e),
    }
}

/// ## Summary
/// GET /centros/{id}
#[handler]
async fn get_center(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let Some(id) = path_id(req, res, "id") else {
        return;
    };
    let Some(services) = services(depot, res) else {
        return;
    };

    match services.help_centers.get(id).await {
        Ok(Some(center)) => res.render(Json(center)),
        Ok(None) => render_error(res, StatusCode::NOT_FOUND, "Centro de ayuda no encontrado"),
        Err(e) => render_service_error(res, &e),
    }
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path(CENTERS_ROUTE_COMPONENT)
        .get(list_centers)
        .push(Router::with_path("{id}").get(get_center))
}
