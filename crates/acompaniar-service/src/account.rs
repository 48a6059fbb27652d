//! Registration, login and profile management.

use std::sync::Arc;

use serde::Serialize;

use acompaniar_core::constants::PASSWORD_MIN_CHARS;
use acompaniar_db::model::user::User;

use crate::auth::{TokenIssuer, password};
use crate::error::{ServiceError, ServiceResult};
use crate::rate_limit::RateLimiter;
use crate::store::{AccountChanges, NewAccount, UserStore};

/// A user as exposed by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserView {
    pub id: uuid::Uuid,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub is_anonymous: bool,
    pub is_active: bool,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            is_anonymous: user.is_anonymous,
            is_active: user.is_active,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenView {
    pub access_token: String,
    pub token_type: &'static str,
}

impl TokenView {
    fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub email: Option<String>,
    pub password: Option<String>,
    pub full_name: Option<String>,
    pub is_anonymous: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub password: Option<String>,
}

fn normalize_email(email: &str) -> ServiceResult<String> {
    let email = email.trim().to_lowercase();
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));

    if !valid {
        return Err(ServiceError::ValidationError("Email inválido".to_string()));
    }
    Ok(email)
}

fn check_password(password: &str) -> ServiceResult<()> {
    if password.chars().count() < PASSWORD_MIN_CHARS {
        return Err(ServiceError::ValidationError(format!(
            "La contraseña debe tener al menos {PASSWORD_MIN_CHARS} caracteres"
        )));
    }
    Ok(())
}

fn clean_name(name: Option<String>) -> Option<String> {
    name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
}

/// Account lifecycle on top of a [`UserStore`].
#[derive(Debug)]
pub struct AccountService {
    users: Arc<dyn UserStore>,
    tokens: Arc<TokenIssuer>,
    login_limiter: RateLimiter,
}

impl AccountService {
    #[must_use]
    pub fn new(users: Arc<dyn UserStore>, tokens: Arc<TokenIssuer>, login_limiter: RateLimiter) -> Self {
        Self {
            users,
            tokens,
            login_limiter,
        }
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    /// ## Summary
    /// Creates an account. Registered accounts need an email and a password.
    ///
    /// ## Errors
    /// `ValidationError` for missing or malformed credentials, `Conflict` if
    /// the email is taken.
    #[tracing::instrument(skip_all, fields(is_anonymous = registration.is_anonymous))]
    pub async fn register(&self, registration: Registration) -> ServiceResult<UserView> {
        let email = registration.email.as_deref().map(normalize_email).transpose()?;

        let password_hash = match registration.password.as_deref() {
            Some(password) => {
                check_password(password)?;
                Some(password::hash_password(password)?)
            }
            None => None,
        };

        if !registration.is_anonymous && (email.is_none() || password_hash.is_none()) {
            return Err(ServiceError::ValidationError(
                "Se requieren email y contraseña para el registro".to_string(),
            ));
        }

        let user = self
            .users
            .create(NewAccount {
                email,
                full_name: clean_name(registration.full_name),
                password_hash,
                is_anonymous: registration.is_anonymous,
            })
            .await?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user.into())
    }

    /// ## Summary
    /// Exchanges credentials for a token. Attempts are limited per email.
    ///
    /// ## Errors
    /// `RateLimited` when too many attempts were made, `NotAuthenticated` for
    /// unknown emails, wrong passwords and deactivated accounts.
    #[tracing::instrument(skip_all)]
    pub async fn login(&self, email: &str, password: &str) -> ServiceResult<TokenView> {
        let email = email.trim().to_lowercase();

        if !self.login_limiter.allow(&email) {
            return Err(ServiceError::RateLimited {
                wait_seconds: self.login_limiter.wait_time(&email),
            });
        }

        let user = self
            .users
            .find_by_email(&email)
            .await?
            .filter(|u| u.is_active)
            .ok_or(ServiceError::NotAuthenticated)?;
        let hash = user
            .password_hash
            .as_deref()
            .ok_or(ServiceError::NotAuthenticated)?;

        password::verify_password(password, hash)?;
        self.login_limiter.reset(&email);

        tracing::info!(user_id = %user.id, "User logged in");
        Ok(TokenView::bearer(self.tokens.issue(user.id, user.is_anonymous)?))
    }

    /// ## Summary
    /// Creates an anonymous account and returns a session for it.
    #[tracing::instrument(skip_all)]
    pub async fn anonymous(&self) -> ServiceResult<TokenView> {
        let user = self
            .users
            .create(NewAccount {
                is_anonymous: true,
                ..NewAccount::default()
            })
            .await?;

        tracing::info!(user_id = %user.id, "Anonymous session started");
        Ok(TokenView::bearer(self.tokens.issue(user.id, true)?))
    }

    /// ## Summary
    /// Turns an anonymous account into a registered one, keeping its id and
    /// everything it owns.
    ///
    /// ## Errors
    /// `Conflict` if the account is already registered or the email is taken.
    #[tracing::instrument(skip_all, fields(user_id = %user.id))]
    pub async fn complete(
        &self,
        user: &User,
        email: &str,
        password: &str,
        full_name: Option<String>,
    ) -> ServiceResult<TokenView> {
        if !user.is_anonymous {
            return Err(ServiceError::Conflict("No es una sesión anónima".to_string()));
        }

        let email = normalize_email(email)?;
        check_password(password)?;

        let updated = self
            .users
            .update(
                user.id,
                AccountChanges {
                    email: Some(email),
                    full_name: clean_name(full_name),
                    password_hash: Some(password::hash_password(password)?),
                    is_anonymous: Some(false),
                    ..AccountChanges::default()
                },
            )
            .await?;

        tracing::info!("Anonymous account completed");
        Ok(TokenView::bearer(self.tokens.issue(updated.id, false)?))
    }

    /// ## Errors
    /// `ValidationError` for a too short password.
    #[tracing::instrument(skip_all, fields(user_id = %user_id))]
    pub async fn update_profile(
        &self,
        user_id: uuid::Uuid,
        update: ProfileUpdate,
    ) -> ServiceResult<UserView> {
        let password_hash = match update.password.as_deref() {
            Some(password) => {
                check_password(password)?;
                Some(password::hash_password(password)?)
            }
            None => None,
        };

        let user = self
            .users
            .update(
                user_id,
                AccountChanges {
                    full_name: clean_name(update.full_name),
                    password_hash,
                    ..AccountChanges::default()
                },
            )
            .await?;
        Ok(user.into())
    }

    /// ## Summary
    /// Soft-deletes the account. Its tokens stop working immediately.
    #[tracing::instrument(skip_all, fields(user_id = %user_id))]
    pub async fn deactivate(&self, user_id: uuid::Uuid) -> ServiceResult<UserView> {
        let user = self
            .users
            .update(
                user_id,
                AccountChanges {
                    is_active: Some(false),
                    ..AccountChanges::default()
                },
            )
            .await?;

        tracing::info!("User deactivated");
        Ok(user.into())
    }
}
