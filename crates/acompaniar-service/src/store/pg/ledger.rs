use chrono::{DateTime, Utc};
use diesel_async::scoped_futures::ScopedFutureExt;
use salvo::async_trait;

use acompaniar_db::db::{enums::AlertState, query, transaction::with_transaction};
use acompaniar_db::model::alert::NewAlertRecord;
use acompaniar_db::model::location::NewLocation;

use super::PgStore;
use crate::error::{ServiceError, ServiceResult};
use crate::store::{AlertDraft, AuditLedger, CreatedAlert, HistoryEntry};

#[async_trait]
impl AuditLedger for PgStore {
    #[tracing::instrument(skip(self, draft), fields(alert_id = %draft.alert_id, user_id = %draft.user_id))]
    async fn create_alert_records(&self, draft: AlertDraft) -> ServiceResult<CreatedAlert> {
        let mut conn = self.conn().await?;

        let created = with_transaction(&mut conn, move |tx| {
            async move {
                let contacts = match &draft.contact_ids {
                    Some(ids) => query::contact::owned_subset(tx, draft.user_id, ids).await?,
                    None => query::contact::list_for_user(tx, draft.user_id).await?,
                };
                if contacts.is_empty() {
                    return Err(ServiceError::NoRecipients);
                }

                let location_id = match &draft.location {
                    Some(point) => {
                        let new_location = NewLocation {
                            id: uuid::Uuid::now_v7(),
                            address: &point.address,
                            latitude: point.latitude,
                            longitude: point.longitude,
                            created_at: draft.created_at,
                        };
                        Some(query::location::insert(tx, &new_location).await?.id)
                    }
                    None => None,
                };

                let new_records: Vec<NewAlertRecord<'_>> = contacts
                    .iter()
                    .map(|contact| NewAlertRecord {
                        id: uuid::Uuid::now_v7(),
                        alert_id: draft.alert_id,
                        user_id: draft.user_id,
                        contact_id: Some(contact.id),
                        contact_name: &contact.name,
                        contact_phone: &contact.phone,
                        location_id,
                        message: draft.message.as_deref(),
                        state_code: AlertState::Pending,
                        created_at: draft.created_at,
                        updated_at: draft.created_at,
                    })
                    .collect();

                let records = query::alert_record::insert_many(tx, &new_records).await?;

                Ok(CreatedAlert {
                    alert_id: draft.alert_id,
                    location_id,
                    records,
                })
            }
            .scope_boxed()
        })
        .await?;

        tracing::info!(
            records = created.records.len(),
            has_location = created.location_id.is_some(),
            "Alert audit records created"
        );

        Ok(created)
    }

    async fn mark_sent(&self, record_ids: &[uuid::Uuid]) -> ServiceResult<usize> {
        if record_ids.is_empty() {
            return Ok(0);
        }

        let mut conn = self.conn().await?;
        Ok(query::alert_record::transition(
            &mut conn,
            record_ids,
            AlertState::Pending,
            AlertState::Sent,
            self.clock.now(),
        )
        .await?)
    }

    async fn alert_times_since(
        &self,
        user_id: uuid::Uuid,
        since: DateTime<Utc>,
    ) -> ServiceResult<Vec<DateTime<Utc>>> {
        let mut conn = self.conn().await?;
        Ok(query::alert_record::alert_times_since(&mut conn, user_id, since).await?)
    }

    async fn history(&self, user_id: uuid::Uuid, limit: i64) -> ServiceResult<Vec<HistoryEntry>> {
        let mut conn = self.conn().await?;

        Ok(query::alert_record::history(&mut conn, user_id, limit)
            .await?
            .into_iter()
            .map(|(record, location)| HistoryEntry { record, location })
            .collect())
    }
}
