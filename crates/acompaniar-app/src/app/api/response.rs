//! Shared request parsing and error rendering for the JSON handlers.

use std::sync::Arc;

use salvo::http::StatusCode;
use salvo::writing::Json;
use salvo::{Depot, Request, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::error;

use crate::middleware::auth::get_user_from_depot;
use crate::services_handler::get_services_from_depot;
use acompaniar_core::error::CoreError;
use acompaniar_db::model::user::User;
use acompaniar_service::error::ServiceError;
use acompaniar_service::services::Services;

/// ## Summary
/// Error response payload
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub fn render_error(res: &mut Response, status: StatusCode, message: impl Into<String>) {
    res.status_code(status);
    res.render(Json(ErrorResponse {
        error: message.into(),
    }));
}

/// ## Summary
/// Maps a service error to its status code and renders it. Internal
/// failures are logged and replaced by a generic message.
pub fn render_service_error(res: &mut Response, err: &ServiceError) {
    match err {
        ServiceError::RateLimited { wait_seconds } => {
            if let Err(e) = res.add_header("Retry-After", wait_seconds.to_string(), true) {
                tracing::warn!(error = ?e, "Failed to set Retry-After header");
            }
            render_error(
                res,
                StatusCode::TOO_MANY_REQUESTS,
                format!("Demasiados intentos. Espera {wait_seconds} segundos"),
            );
        }
        ServiceError::NoRecipients => render_error(
            res,
            StatusCode::BAD_REQUEST,
            "No tienes contactos configurados. Agrega al menos un contacto de emergencia.",
        ),
        ServiceError::LimitExceeded { max } => render_error(
            res,
            StatusCode::BAD_REQUEST,
            format!("Máximo {max} contactos de emergencia permitidos"),
        ),
        ServiceError::ValidationError(message)
        | ServiceError::CoreError(CoreError::ValidationError(message) | CoreError::InvalidInput(message)) => {
            render_error(res, StatusCode::BAD_REQUEST, message.as_str());
        }
        ServiceError::NotFound(message) => render_error(res, StatusCode::NOT_FOUND, message.as_str()),
        ServiceError::Forbidden(message) => render_error(res, StatusCode::FORBIDDEN, message.as_str()),
        ServiceError::Conflict(message) => render_error(res, StatusCode::CONFLICT, message.as_str()),
        ServiceError::NotAuthenticated => {
            render_error(res, StatusCode::UNAUTHORIZED, "Se requiere autenticación");
        }
        ServiceError::AuditFailure(_) => {
            error!(error = ?err, "Alert aborted, audit trail not written");
            render_error(
                res,
                StatusCode::INTERNAL_SERVER_ERROR,
                "No se pudo registrar la alerta. Intenta nuevamente.",
            );
        }
        ServiceError::DatabaseError(_)
        | ServiceError::CoreError(_)
        | ServiceError::InvalidConfiguration(_)
        | ServiceError::Storage(_)
        | ServiceError::InvariantViolation(_) => {
            error!(error = ?err, "Request failed");
            render_error(
                res,
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error interno del servidor",
            );
        }
    }
}

/// ## Summary
/// Returns the shared services, or renders a 500.
pub fn services(depot: &Depot, res: &mut Response) -> Option<Arc<Services>> {
    match get_services_from_depot(depot) {
        Ok(services) => Some(services),
        Err(e) => {
            error!(error = ?e, "Failed to get services from depot");
            render_error(res, StatusCode::INTERNAL_SERVER_ERROR, "Error interno del servidor");
            None
        }
    }
}

/// ## Summary
/// Returns the authenticated user, or renders a 401.
pub fn require_user(depot: &Depot, res: &mut Response) -> Option<User> {
    let user = get_user_from_depot(depot).cloned();
    if user.is_none() {
        render_error(res, StatusCode::UNAUTHORIZED, "Se requiere autenticación");
    }
    user
}

/// ## Summary
/// Parses the JSON body, or renders a 400.
pub async fn parse_body<T: DeserializeOwned + Send>(req: &mut Request, res: &mut Response) -> Option<T> {
    match req.parse_json::<T>().await {
        Ok(body) => Some(body),
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to parse request body");
            render_error(res, StatusCode::BAD_REQUEST, "Cuerpo de la solicitud inválido");
            None
        }
    }
}

/// ## Summary
/// Reads a UUID path parameter, or renders a 400.
pub fn path_id(req: &Request, res: &mut Response, name: &str) -> Option<uuid::Uuid> {
    let parsed = req
        .param::<String>(name)
        .and_then(|raw| uuid::Uuid::parse_str(&raw).ok());

    if parsed.is_none() {
        render_error(res, StatusCode::BAD_REQUEST, "Identificador inválido");
    }
    parsed
}
