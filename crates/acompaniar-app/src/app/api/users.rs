use salvo::{Depot, Request, Response, Router, handler, writing::Json};
use serde::Deserialize;

use super::USERS_ROUTE_COMPONENT;
use super::response::{parse_body, render_service_error, require_user, services};
use acompaniar_service::account::{ProfileUpdate, UserView};

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// ## Summary
/// GET /users/me - Returns the authenticated user
#[handler]
async fn me(depot: &mut Depot, res: &mut Response) {
    let Some(user) = require_user(depot, res) else {
        return;
    };
    res.render(Json(UserView::from(user)));
}

/// ## Summary
/// PUT /users/me - Updates the display name and/or password
#[handler]
async fn update_me(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let Some(user) = require_user(depot, res) else {
        return;
    };
    let Some(body) = parse_body::<UpdateProfileRequest>(req, res).await else {
        return;
    };
    let Some(services) = services(depot, res) else {
        return;
    };

    let update = ProfileUpdate {
        full_name: body.full_name,
        password: body.password,
    };
    match services.accounts.update_profile(user.id, update).await {
        Ok(view) => res.render(Json(view)),
        Err(e) => render_service_error(res, &e),
    }
}

/// ## Summary
/// DELETE /users/me - Deactivates the account
///
/// ## Side Effects
/// Sets `is_active = false`. Contacts and audit records are kept.
#[handler]
async fn delete_me(depot: &mut Depot, res: &mut Response) {
    let Some(user) = require_user(depot, res) else {
        return;
    };
    let Some(services) = services(depot, res) else {
        return;
    };

    match services.accounts.deactivate(user.id).await {
        Ok(view) => res.render(Json(view)),
        Err(e) => render_service_error(res, &e),
    }
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path(USERS_ROUTE_COMPONENT).push(
        Router::with_path("me")
            .get(me)
            .put(update_me)
            .delete(delete_me),
    )
}
