use salvo::{Depot, Request, Response, Router, handler, http::StatusCode, writing::Json};
use serde::Deserialize;

use super::AUTH_ROUTE_COMPONENT;
use super::response::{parse_body, render_error, render_service_error, require_user, services};
use acompaniar_service::account::Registration;
use acompaniar_service::error::ServiceError;

/// ## Summary
/// Registration request payload
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub is_anonymous: bool,
}

/// ## Summary
/// Login request payload
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// ## Summary
/// Payload upgrading an anonymous session to a registered account
#[derive(Debug, Deserialize)]
pub struct CompleteRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

/// ## Summary
/// POST /auth/register - Creates a registered or anonymous user
///
/// ## Errors
/// Returns HTTP 400 for missing or invalid credentials and 409 if the email
/// is already registered.
#[handler]
async fn register(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let Some(body) = parse_body::<RegisterRequest>(req, res).await else {
        return;
    };
    let Some(services) = services(depot, res) else {
        return;
    };

    let registration = Registration {
        email: body.email,
        password: body.password,
        full_name: body.full_name,
        is_anonymous: body.is_anonymous,
    };

    match services.accounts.register(registration).await {
        Ok(user) => {
            res.status_code(StatusCode::CREATED);
            res.render(Json(user));
        }
        Err(e) => render_service_error(res, &e),
    }
}

/// ## Summary
/// POST /auth/login - Exchanges email and password for a bearer token
///
/// ## Errors
/// Returns HTTP 401 for bad credentials and 429 after too many attempts.
#[handler]
async fn login(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let Some(body) = parse_body::<LoginRequest>(req, res).await else {
        return;
    };
    let Some(services) = services(depot, res) else {
        return;
    };

    match services.accounts.login(&body.email, &body.password).await {
        Ok(token) => res.render(Json(token)),
        Err(ServiceError::NotAuthenticated) => {
            render_error(res, StatusCode::UNAUTHORIZED, "Credenciales inválidas");
        }
        Err(e) => render_service_error(res, &e),
    }
}

/// ## Summary
/// POST /auth/anonymous - Starts an anonymous session
///
/// ## Side Effects
/// Creates a user row flagged as anonymous.
#[handler]
async fn anonymous(depot: &mut Depot, res: &mut Response) {
    let Some(services) = services(depot, res) else {
        return;
    };

    match services.accounts.anonymous().await {
        Ok(token) => res.render(Json(token)),
        Err(e) => render_service_error(res, &e),
    }
}

/// ## Summary
/// POST /auth/complete - Registers the current anonymous user in place
///
/// ## Errors
/// Returns HTTP 401 without a session and 409 if the session is not
/// anonymous or the email is taken.
#[handler]
async fn complete(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let Some(user) = require_user(depot, res) else {
        return;
    };
    let Some(body) = parse_body::<CompleteRequest>(req, res).await else {
        return;
    };
    let Some(services) = services(depot, res) else {
        return;
    };

    match services
        .accounts
        .complete(&user, &body.email, &body.password, body.full_name)
        .await
    {
        Ok(token) => res.render(Json(token)),
        Err(e) => render_service_error(res, &e),
    }
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path(AUTH_ROUTE_COMPONENT)
        .push(Router::with_path("register").post(register))
        .push(Router::with_path("login").post(login))
        .push(Router::with_path("anonymous").post(anonymous))
        .push(Router::with_path("complete").post(complete))
}
