use salvo::async_trait;

use acompaniar_db::db::query;
use acompaniar_db::error::DbError;
use acompaniar_db::model::user::{NewUser, User, UserChanges};

use super::PgStore;
use crate::error::{ServiceError, ServiceResult};
use crate::store::{AccountChanges, NewAccount, UserStore};

fn email_conflict(err: DbError) -> ServiceError {
    if err.is_unique_violation() {
        ServiceError::Conflict("El email ya está registrado".to_string())
    } else {
        err.into()
    }
}

#[async_trait]
impl UserStore for PgStore {
    #[tracing::instrument(skip(self, account), fields(is_anonymous = account.is_anonymous))]
    async fn create(&self, account: NewAccount) -> ServiceResult<User> {
        let mut conn = self.conn().await?;

        let new_user = NewUser {
            id: uuid::Uuid::now_v7(),
            email: account.email.as_deref(),
            full_name: account.full_name.as_deref(),
            password_hash: account.password_hash.as_deref(),
            is_anonymous: account.is_anonymous,
        };

        query::user::insert(&mut conn, &new_user)
            .await
            .map_err(email_conflict)
    }

    async fn find_by_id(&self, id: uuid::Uuid) -> ServiceResult<Option<User>> {
        let mut conn = self.conn().await?;
        Ok(query::user::by_id(&mut conn, id).await?)
    }

    async fn find_by_email(&self, email: &str) -> ServiceResult<Option<User>> {
        let mut conn = self.conn().await?;
        Ok(query::user::by_email(&mut conn, email).await?)
    }

    #[tracing::instrument(skip(self, changes))]
    async fn update(&self, id: uuid::Uuid, changes: AccountChanges) -> ServiceResult<User> {
        let mut conn = self.conn().await?;

        let row_changes = UserChanges {
            email: changes.email.as_deref(),
            full_name: changes.full_name.as_deref(),
            password_hash: changes.password_hash.as_deref(),
            is_active: changes.is_active,
            is_anonymous: changes.is_anonymous,
            updated_at: Some(self.clock.now()),
        };

        query::user::update(&mut conn, id, &row_changes)
            .await
            .map_err(email_conflict)?
            .ok_or_else(|| ServiceError::NotFound("Usuario no encontrado".to_string()))
    }
}
