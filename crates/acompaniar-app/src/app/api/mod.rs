mod auth;
mod centros;
mod contacts;
mod emergency;
mod health;
pub mod response;
mod users;

use salvo::Router;

use crate::middleware::auth::AuthMiddleware;

pub use acompaniar_core::constants::{
    API_ROUTE_COMPONENT, API_ROUTE_PREFIX, API_VERSION_COMPONENT, AUTH_ROUTE_COMPONENT,
    CENTERS_ROUTE_COMPONENT, CONTACTS_ROUTE_COMPONENT, EMERGENCY_ROUTE_COMPONENT,
    USERS_ROUTE_COMPONENT,
};

/// ## Summary
/// Constructs the router for every endpoint. Requests under the versioned
/// API prefix go through the bearer-token middleware; handlers decide
/// whether they need a user.
///
/// ## Errors
/// Returns an error if any child route fails to initialize.
pub fn routes() -> anyhow::Result<Router> {
    Ok(Router::new().push(health::routes()).push(
        Router::with_path(API_ROUTE_COMPONENT).push(
            Router::with_path(API_VERSION_COMPONENT)
                .hoop(AuthMiddleware)
                .push(auth::routes())
                .push(users::routes())
                .push(contacts::routes())
                .push(emergency::routes())
                .push(centros::routes()),
        ),
    ))
}
