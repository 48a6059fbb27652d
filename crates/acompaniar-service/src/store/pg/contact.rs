use diesel_async::scoped_futures::ScopedFutureExt;
use salvo::async_trait;

use acompaniar_db::db::{query, transaction::with_transaction};
use acompaniar_db::model::contact::{Contact, NewContact};

use super::PgStore;
use crate::error::{ServiceError, ServiceResult};
use crate::store::{ContactDraft, ContactStore};

fn position_of(index: usize) -> ServiceResult<i32> {
    i32::try_from(index).map_err(|_err| ServiceError::InvariantViolation("contact position overflow"))
}

/// Renumbers `ordered` to positions `0..n`, touching only rows that move.
async fn renumber(
    conn: &mut diesel_async::AsyncPgConnection,
    ordered: &[Contact],
) -> ServiceResult<()> {
    for (index, contact) in ordered.iter().enumerate() {
        let position = position_of(index)?;
        if contact.position != position {
            query::contact::set_position(conn, contact.id, position).await?;
        }
    }
    Ok(())
}

#[async_trait]
impl ContactStore for PgStore {
    async fn list(&self, user_id: uuid::Uuid) -> ServiceResult<Vec<Contact>> {
        let mut conn = self.conn().await?;
        Ok(query::contact::list_for_user(&mut conn, user_id).await?)
    }

    async fn get(&self, id: uuid::Uuid) -> ServiceResult<Option<Contact>> {
        let mut conn = self.conn().await?;
        Ok(query::contact::by_id(&mut conn, id).await?)
    }

    #[tracing::instrument(skip(self, draft))]
    async fn create(
        &self,
        user_id: uuid::Uuid,
        draft: ContactDraft,
        max: usize,
    ) -> ServiceResult<Contact> {
        let mut conn = self.conn().await?;

        with_transaction(&mut conn, move |tx| {
            async move {
                query::user::lock_for_update(tx, user_id).await?;

                let count = query::contact::count_for_user(tx, user_id).await?;
                let count = usize::try_from(count).unwrap_or(usize::MAX);
                if count >= max {
                    return Err(ServiceError::LimitExceeded { max });
                }

                let new_contact = NewContact {
                    id: uuid::Uuid::now_v7(),
                    user_id,
                    name: &draft.name,
                    phone: &draft.phone,
                    position: position_of(count)?,
                };
                Ok(query::contact::insert(tx, &new_contact).await?)
            }
            .scope_boxed()
        })
        .await
    }

    async fn update(&self, id: uuid::Uuid, draft: ContactDraft) -> ServiceResult<Contact> {
        let mut conn = self.conn().await?;

        if query::contact::by_id(&mut conn, id).await?.is_none() {
            return Err(ServiceError::NotFound("Contacto no encontrado".to_string()));
        }
        Ok(query::contact::update_details(&mut conn, id, &draft.name, &draft.phone).await?)
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, id: uuid::Uuid) -> ServiceResult<()> {
        let mut conn = self.conn().await?;

        with_transaction(&mut conn, move |tx| {
            async move {
                let contact = query::contact::by_id(tx, id)
                    .await?
                    .ok_or_else(|| ServiceError::NotFound("Contacto no encontrado".to_string()))?;

                query::user::lock_for_update(tx, contact.user_id).await?;
                query::contact::delete(tx, id).await?;

                let remaining = query::contact::list_for_user(tx, contact.user_id).await?;
                renumber(tx, &remaining).await
            }
            .scope_boxed()
        })
        .await
    }

    #[tracing::instrument(skip(self))]
    async fn set_primary(
        &self,
        user_id: uuid::Uuid,
        id: uuid::Uuid,
    ) -> ServiceResult<Vec<Contact>> {
        let mut conn = self.conn().await?;

        with_transaction(&mut conn, move |tx| {
            async move {
                query::user::lock_for_update(tx, user_id).await?;

                let mut ordered = query::contact::list_for_user(tx, user_id).await?;
                let index = ordered
                    .iter()
                    .position(|c| c.id == id)
                    .ok_or_else(|| ServiceError::NotFound("Contacto no encontrado".to_string()))?;

                let chosen = ordered.remove(index);
                ordered.insert(0, chosen);
                renumber(tx, &ordered).await?;

                Ok(query::contact::list_for_user(tx, user_id).await?)
            }
            .scope_boxed()
        })
        .await
    }

    #[tracing::instrument(skip(self, drafts), fields(count = drafts.len()))]
    async fn replace_all(
        &self,
        user_id: uuid::Uuid,
        drafts: Vec<ContactDraft>,
        max: usize,
    ) -> ServiceResult<Vec<Contact>> {
        if drafts.len() > max {
            return Err(ServiceError::LimitExceeded { max });
        }

        let mut conn = self.conn().await?;

        with_transaction(&mut conn, move |tx| {
            async move {
                query::user::lock_for_update(tx, user_id).await?;
                query::contact::delete_for_user(tx, user_id).await?;

                let mut stored = Vec::with_capacity(drafts.len());
                for (index, draft) in drafts.iter().enumerate() {
                    let new_contact = NewContact {
                        id: uuid::Uuid::now_v7(),
                        user_id,
                        name: &draft.name,
                        phone: &draft.phone,
                        position: position_of(index)?,
                    };
                    stored.push(query::contact::insert(tx, &new_contact).await?);
                }
                Ok(stored)
            }
            .scope_boxed()
        })
        .await
    }
}
