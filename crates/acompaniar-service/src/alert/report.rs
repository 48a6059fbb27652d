use serde::Deserialize;
use thiserror::Error;

use acompaniar_core::constants::ALERT_MESSAGE_MAX_CHARS;
use acompaniar_core::types::GeoPoint;
use acompaniar_db::model::alert::AlertRecord;

use super::{AlertDispatcher, parse_contact_ids};
use crate::error::ServiceError;
use crate::store::AlertDraft;

/// One recipient outcome as reported by the device.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportedResult {
    #[serde(default, alias = "contacto_id")]
    pub contact_id: Option<String>,
    #[serde(default, alias = "telefono")]
    pub phone: Option<String>,
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

/// Delivery report for an alert the device sent on its own.
#[derive(Debug, Clone, Default)]
pub struct DeliveryReport {
    /// Raw ids as received. Unparseable entries are dropped.
    pub contact_ids: Option<Vec<String>>,
    pub location: Option<GeoPoint>,
    pub message: Option<String>,
    pub results: Vec<ReportedResult>,
}

/// Acknowledgement of a recorded report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportAck {
    pub report_id: uuid::Uuid,
    pub records: usize,
    pub marked_sent: usize,
}

/// Why a report could not be recorded. The messages were already delivered,
/// so callers log this and still answer with success.
#[derive(Debug, Error)]
pub enum AuditWriteError {
    #[error("report names no contact owned by the user")]
    NoRecipients,

    #[error("could not persist report: {0}")]
    Persistence(ServiceError),
}

impl ReportedResult {
    fn matches(&self, record: &AlertRecord, dispatcher: &AlertDispatcher) -> bool {
        let by_id = self
            .contact_id
            .as_deref()
            .and_then(|raw| uuid::Uuid::parse_str(raw.trim()).ok())
            .is_some_and(|id| record.contact_id == Some(id));

        let by_phone = self.phone.as_deref().is_some_and(|phone| {
            dispatcher.phone_rules.normalize_for_dispatch(phone)
                == dispatcher.phone_rules.normalize_for_dispatch(&record.contact_phone)
        });

        by_id || by_phone
    }
}

impl AlertDispatcher {
    /// ## Summary
    /// Records an alert the device already delivered and marks the records of
    /// recipients reported as successful.
    ///
    /// No rate limit applies and nothing is sent.
    ///
    /// ## Errors
    /// `NoRecipients` if no owned contact can be resolved, `Persistence` if
    /// the audit trail could not be written. Failing to mark deliveries as
    /// sent is logged and leaves `marked_sent` at 0.
    #[tracing::instrument(skip_all, fields(user_id = %user_id, results = report.results.len()))]
    pub async fn ingest_report(
        &self,
        user_id: uuid::Uuid,
        report: DeliveryReport,
    ) -> Result<ReportAck, AuditWriteError> {
        let contact_ids =
            parse_contact_ids(report.contact_ids).map_err(|_err| AuditWriteError::NoRecipients)?;
        let message = report
            .message
            .map(|m| m.trim().chars().take(ALERT_MESSAGE_MAX_CHARS).collect::<String>())
            .filter(|m| !m.is_empty());

        let created = self
            .ledger
            .create_alert_records(AlertDraft {
                alert_id: uuid::Uuid::now_v7(),
                user_id,
                contact_ids,
                location: report.location,
                message,
                created_at: self.clock.now(),
            })
            .await
            .map_err(|err| match err {
                ServiceError::NoRecipients => AuditWriteError::NoRecipients,
                other => AuditWriteError::Persistence(other),
            })?;

        let delivered: Vec<uuid::Uuid> = created
            .records
            .iter()
            .filter(|record| {
                report
                    .results
                    .iter()
                    .any(|result| result.success && result.matches(record, self))
            })
            .map(|record| record.id)
            .collect();

        // The records are committed at this point, so a failed transition
        // only leaves them pending.
        let marked_sent = if delivered.is_empty() {
            0
        } else {
            self.ledger
                .mark_sent(&delivered)
                .await
                .inspect_err(|err| {
                    tracing::warn!(report_id = %created.alert_id, error = ?err, "Failed to mark reported deliveries as sent");
                })
                .unwrap_or(0)
        };

        tracing::info!(
            report_id = %created.alert_id,
            records = created.records.len(),
            marked_sent,
            "Delivery report recorded"
        );

        Ok(ReportAck {
            report_id: created.alert_id,
            records: created.records.len(),
            marked_sent,
        })
    }
}
