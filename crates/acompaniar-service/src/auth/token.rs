//! Bearer session tokens (HS256 JWT).

use std::sync::Arc;

use chrono::Duration;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use acompaniar_core::clock::{Clock, span_minutes};
use acompaniar_core::config::AuthConfig;

use crate::error::{ServiceError, ServiceResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: uuid::Uuid,
    pub is_anonymous: bool,
    pub exp: i64,
    pub iat: i64,
}

/// Issues and verifies session tokens with a shared secret.
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl TokenIssuer {
    /// ## Errors
    /// Returns `InvalidConfiguration` if the secret is empty.
    pub fn new(config: &AuthConfig, clock: Arc<dyn Clock>) -> ServiceResult<Self> {
        if config.jwt_secret.is_empty() {
            return Err(ServiceError::InvalidConfiguration(
                "auth.jwt_secret must not be empty".to_string(),
            ));
        }

        let secret = config.jwt_secret.as_bytes();
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against the injected clock instead.
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl: span_minutes(config.token_ttl_minutes.max(1)),
            clock,
        })
    }

    /// ## Summary
    /// Signs a token for `user_id`.
    ///
    /// ## Errors
    /// Returns an error if signing fails.
    pub fn issue(&self, user_id: uuid::Uuid, is_anonymous: bool) -> ServiceResult<String> {
        let now = self.clock.now();
        let claims = Claims {
            sub: user_id,
            is_anonymous,
            exp: (now + self.ttl).timestamp(),
            iat: now.timestamp(),
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| ServiceError::InvalidConfiguration(format!("Failed to sign token: {e}")))
    }

    /// ## Summary
    /// Checks the signature and expiry of a token and returns its claims.
    ///
    /// ## Errors
    /// Returns `NotAuthenticated` for malformed, forged or expired tokens.
    pub fn verify(&self, token: &str) -> ServiceResult<Claims> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|err| {
                tracing::debug!(error = %err, "Rejected bearer token");
                ServiceError::NotAuthenticated
            })?;

        if data.claims.exp <= self.clock.now().timestamp() {
            tracing::debug!(user_id = %data.claims.sub, "Expired bearer token");
            return Err(ServiceError::NotAuthenticated);
        }

        Ok(data.claims)
    }
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
