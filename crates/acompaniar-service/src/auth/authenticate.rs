use acompaniar_db::model::user::User;

use super::token::TokenIssuer;
use crate::error::{ServiceError, ServiceResult};
use crate::store::UserStore;

/// ## Summary
/// Extracts the token from an `Authorization: Bearer <token>` value. The
/// scheme is matched case-insensitively.
#[must_use]
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// ## Summary
/// Resolves the bearer token of a request to an active user.
///
/// ## Errors
/// Returns `NotAuthenticated` if the header is missing or malformed, the token
/// does not verify, or the user no longer exists or was deactivated.
#[tracing::instrument(skip_all)]
pub async fn authenticate(
    req: &salvo::Request,
    tokens: &TokenIssuer,
    users: &dyn UserStore,
) -> ServiceResult<User> {
    let header = req
        .headers()
        .get(salvo::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(ServiceError::NotAuthenticated)?;

    let token = bearer_token(header).ok_or(ServiceError::NotAuthenticated)?;
    let claims = tokens.verify(token)?;

    let user = users
        .find_by_id(claims.sub)
        .await?
        .ok_or(ServiceError::NotAuthenticated)?;

    if !user.is_active {
        tracing::debug!(user_id = %user.id, "Rejected token of deactivated user");
        return Err(ServiceError::NotAuthenticated);
    }

    tracing::trace!(user_id = %user.id, "Authenticated request");
    Ok(user)
}
