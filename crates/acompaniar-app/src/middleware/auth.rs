use salvo::Depot;
use tracing::error;

use crate::services_handler::get_services_from_depot;
use acompaniar_db::model::user::User;
use acompaniar_service::auth::authenticate;
use acompaniar_service::error::ServiceError;

pub mod depot_keys {
    pub const AUTHENTICATED_USER: &str = "__authenticated_user";
}

/// Who is making the request.
#[derive(Debug, Clone)]
pub enum DepotUser {
    User(Box<User>),
    Public,
}

/// ## Summary
/// Returns the authenticated user stored by [`AuthMiddleware`], if any.
#[must_use]
pub fn get_user_from_depot(depot: &Depot) -> Option<&User> {
    match depot.get::<DepotUser>(depot_keys::AUTHENTICATED_USER) {
        Ok(DepotUser::User(user)) => Some(user.as_ref()),
        Ok(DepotUser::Public) | Err(_) => None,
    }
}

/// ## Summary
/// Resolves the bearer token of the request and stores the result in the
/// depot. Requests without a valid token continue as public; handlers that
/// need a user reject them.
///
/// ## Errors
/// Returns HTTP 500 if the services are missing or the user lookup fails.
pub struct AuthMiddleware;

#[salvo::async_trait]
impl salvo::Handler for AuthMiddleware {
    #[tracing::instrument(skip(self, req, depot, res, ctrl), fields(
        method = %req.method(),
        path = %req.uri().path()
    ))]
    async fn handle(
        &self,
        req: &mut salvo::Request,
        depot: &mut Depot,
        res: &mut salvo::Response,
        ctrl: &mut salvo::FlowCtrl,
    ) {
        tracing::trace!("Authenticating request");

        let services = match get_services_from_depot(depot) {
            Ok(services) => services,
            Err(e) => {
                error!(error = ?e, "Failed to get services from depot");
                res.status_code(salvo::http::StatusCode::INTERNAL_SERVER_ERROR);
                ctrl.skip_rest();
                return;
            }
        };

        match authenticate(req, &services.tokens, services.users.as_ref()).await {
            Ok(user) => {
                tracing::debug!(user_id = %user.id, "User authenticated");
                depot.insert(depot_keys::AUTHENTICATED_USER, DepotUser::User(Box::new(user)));
            }
            Err(ServiceError::NotAuthenticated) => {
                tracing::trace!("No valid bearer token, treating as public");
                depot.insert(depot_keys::AUTHENTICATED_USER, DepotUser::Public);
            }
            Err(e) => {
                error!(error = ?e, "Authentication failed with error");
                res.status_code(salvo::http::StatusCode::INTERNAL_SERVER_ERROR);
                res.body("Internal Server Error");
                ctrl.skip_rest();
            }
        }
    }
}
