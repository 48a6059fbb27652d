use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::task::JoinHandle;

use acompaniar_core::clock::{Clock, span_seconds};
use acompaniar_core::config::EmergencyConfig;
use acompaniar_core::constants::ALERT_MESSAGE_MAX_CHARS;
use acompaniar_core::util::phone::PhoneRules;
use acompaniar_db::model::alert::AlertRecord;
use acompaniar_db::model::user::User;

use super::{
    ALERT_PARTIAL_MESSAGE, ALERT_SENT_MESSAGE, AlertRequest, AlertStatus, AlertSummary,
    DEFAULT_SENDER_NAME, HistoryItem, HistoryView, LocationView, MAX_HISTORY_LIMIT,
    TestSmsResult, UNKNOWN_CONTACT_NAME,
};
use crate::error::{ServiceError, ServiceResult};
use crate::notify::gateway::NOT_CONFIGURED_MESSAGE;
use crate::notify::{DispatchResult, NotificationGateway, Recipient};
use crate::rate_limit::RateLimiter;
use crate::store::{AlertDraft, AuditLedger, ContactStore};

/// Result of [`AlertDispatcher::dispatch`].
///
/// `reconciliation` is the background task moving delivered records to
/// `sent`. Callers may drop it; tests await it.
#[derive(Debug)]
pub struct AlertOutcome {
    pub summary: AlertSummary,
    pub reconciliation: Option<JoinHandle<()>>,
}

/// Orchestrates one alert: rate gate, audit trail, notification and
/// reconciliation of delivered records.
#[derive(Debug)]
pub struct AlertDispatcher {
    pub(super) contacts: Arc<dyn ContactStore>,
    pub(super) ledger: Arc<dyn AuditLedger>,
    pub(super) gateway: Arc<NotificationGateway>,
    pub(super) phone_rules: PhoneRules,
    pub(super) clock: Arc<dyn Clock>,
    pub(super) policy: EmergencyConfig,
    test_limiter: RateLimiter,
}

fn sender_name(user: &User) -> &str {
    user.full_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_SENDER_NAME)
}

fn recipients(records: &[AlertRecord]) -> Vec<Recipient> {
    records
        .iter()
        .map(|record| Recipient {
            contact_id: record.contact_id,
            name: record.contact_name.clone(),
            phone: record.contact_phone.clone(),
        })
        .collect()
}

fn ceil_seconds(duration: Duration) -> u64 {
    let millis = duration.num_milliseconds().max(0);
    u64::try_from((millis + 999) / 1000).unwrap_or(0)
}

impl AlertDispatcher {
    #[must_use]
    pub fn new(
        contacts: Arc<dyn ContactStore>,
        ledger: Arc<dyn AuditLedger>,
        gateway: Arc<NotificationGateway>,
        phone_rules: PhoneRules,
        clock: Arc<dyn Clock>,
        policy: EmergencyConfig,
        test_limiter: RateLimiter,
    ) -> Self {
        Self {
            contacts,
            ledger,
            gateway,
            phone_rules,
            clock,
            policy,
            test_limiter,
        }
    }

    fn window(&self) -> Duration {
        span_seconds(self.policy.rate_limit_seconds)
    }

    fn max_per_window(&self) -> usize {
        usize::try_from(self.policy.max_alerts_per_window.max(1)).unwrap_or(usize::MAX)
    }

    /// Timestamps of alerts inside the current window (newest first) and,
    /// when the budget is used up, the seconds until the next alert is allowed.
    async fn window_usage(
        &self,
        user_id: uuid::Uuid,
        now: DateTime<Utc>,
    ) -> ServiceResult<(Vec<DateTime<Utc>>, Option<u64>)> {
        let window = self.window();
        let times = self.ledger.alert_times_since(user_id, now - window).await?;

        let wait = times
            .get(self.max_per_window() - 1)
            .map(|released_by| ceil_seconds(*released_by + window - now).max(1));
        Ok((times, wait))
    }

    /// ## Summary
    /// Sends an emergency alert to the user's contacts.
    ///
    /// The audit trail is written before any message goes out. Recipient
    /// failures are reported in the summary and leave their records pending.
    ///
    /// ## Errors
    /// - `ValidationError` for an over-long message
    /// - `RateLimited` while the user's alert budget for the window is used up
    /// - `NoRecipients` if no owned contact is targeted
    /// - `AuditFailure` if the audit trail could not be written; nothing is sent
    ///
    /// ## Side Effects
    /// Spawns a task marking delivered records as `sent`.
    #[tracing::instrument(skip_all, fields(user_id = %user.id))]
    pub async fn dispatch(&self, user: &User, request: AlertRequest) -> ServiceResult<AlertOutcome> {
        let message = request
            .message
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty());
        if message
            .as_ref()
            .is_some_and(|m| m.chars().count() > ALERT_MESSAGE_MAX_CHARS)
        {
            return Err(ServiceError::ValidationError(format!(
                "El mensaje no puede superar {ALERT_MESSAGE_MAX_CHARS} caracteres"
            )));
        }

        let now = self.clock.now();
        let (_times, wait) = self.window_usage(user.id, now).await?;
        if let Some(wait_seconds) = wait {
            tracing::warn!(wait_seconds, "Alert rejected by rate limit");
            return Err(ServiceError::RateLimited { wait_seconds });
        }

        let contact_ids = request.contact_ids.filter(|ids| !ids.is_empty());
        let created = self
            .ledger
            .create_alert_records(AlertDraft {
                alert_id: uuid::Uuid::now_v7(),
                user_id: user.id,
                contact_ids,
                location: request.location.clone(),
                message: message.clone(),
                created_at: now,
            })
            .await
            .map_err(|err| match err {
                ServiceError::NoRecipients => ServiceError::NoRecipients,
                other => {
                    tracing::error!(error = ?other, "Failed to write alert audit trail");
                    ServiceError::AuditFailure(other.to_string())
                }
            })?;

        tracing::info!(
            alert_id = %created.alert_id,
            records = created.records.len(),
            "Alert recorded"
        );

        let result = self
            .gateway
            .send_emergency(
                &recipients(&created.records),
                sender_name(user),
                request.location.as_ref(),
                message.as_deref(),
            )
            .await;

        let reconciliation = self.reconcile(&created.records, &result);

        Ok(AlertOutcome {
            summary: AlertSummary {
                success: result.success,
                message: if result.success {
                    ALERT_SENT_MESSAGE.to_string()
                } else {
                    ALERT_PARTIAL_MESSAGE.to_string()
                },
                peticiones_creadas: created.records.len(),
                sms_enviados: result.sent,
                timestamp: now,
            },
            reconciliation,
        })
    }

    /// Marks the records of delivered contacts as sent without blocking the
    /// caller. Undelivered records stay pending.
    fn reconcile(&self, records: &[AlertRecord], result: &DispatchResult) -> Option<JoinHandle<()>> {
        let delivered: Vec<uuid::Uuid> = result.delivered_contacts().collect();
        let record_ids: Vec<uuid::Uuid> = records
            .iter()
            .filter(|r| r.contact_id.is_some_and(|id| delivered.contains(&id)))
            .map(|r| r.id)
            .collect();

        if record_ids.is_empty() {
            return None;
        }

        let ledger = Arc::clone(&self.ledger);
        Some(tokio::spawn(async move {
            match ledger.mark_sent(&record_ids).await {
                Ok(updated) => tracing::debug!(updated, "Alert records marked sent"),
                Err(err) => {
                    tracing::error!(error = ?err, records = record_ids.len(), "Failed to mark alert records sent");
                }
            }
        }))
    }

    /// ## Summary
    /// Whether the user may alert now, derived from the audit trail.
    #[tracing::instrument(skip(self))]
    pub async fn status(&self, user_id: uuid::Uuid) -> ServiceResult<AlertStatus> {
        let (times, wait) = self.window_usage(user_id, self.clock.now()).await?;

        Ok(match wait {
            None => AlertStatus {
                can_send_alert: true,
                wait_seconds: 0,
                recent_alerts: times.len(),
                message: "Puedes enviar una alerta".to_string(),
            },
            Some(wait_seconds) => AlertStatus {
                can_send_alert: false,
                wait_seconds,
                recent_alerts: times.len(),
                message: format!("Espera {wait_seconds} segundos"),
            },
        })
    }

    /// ## Summary
    /// The user's most recent audit records, newest first. `limit` is clamped
    /// to 1..=100 and defaults to the configured history size.
    #[tracing::instrument(skip(self))]
    pub async fn history(&self, user_id: uuid::Uuid, limit: Option<i64>) -> ServiceResult<HistoryView> {
        let limit = limit
            .unwrap_or(self.policy.history_limit)
            .clamp(1, MAX_HISTORY_LIMIT);

        let alerts: Vec<HistoryItem> = self
            .ledger
            .history(user_id, limit)
            .await?
            .into_iter()
            .map(|entry| HistoryItem {
                id: entry.record.id,
                alert_id: entry.record.alert_id,
                contact: if entry.record.contact_name.trim().is_empty() {
                    UNKNOWN_CONTACT_NAME.to_string()
                } else {
                    entry.record.contact_name
                },
                status: entry.record.state_code,
                sent_at: entry.record.created_at,
                location: entry.location.map(|l| LocationView {
                    address: l.address,
                    latitude: l.latitude,
                    longitude: l.longitude,
                }),
            })
            .collect();

        Ok(HistoryView {
            total: alerts.len(),
            alerts,
        })
    }

    /// ## Summary
    /// Sends the diagnostic message to one of the user's contacts.
    ///
    /// ## Errors
    /// `Forbidden` unless the contact exists and belongs to the user,
    /// `RateLimited` once the diagnostic budget is used up.
    #[tracing::instrument(skip(self))]
    pub async fn send_test(
        &self,
        user_id: uuid::Uuid,
        contact_id: uuid::Uuid,
    ) -> ServiceResult<TestSmsResult> {
        let contact = self
            .contacts
            .get(contact_id)
            .await?
            .filter(|c| c.user_id == user_id)
            .ok_or_else(|| {
                ServiceError::Forbidden(
                    "Solo puedes enviar SMS de prueba a tus contactos registrados".to_string(),
                )
            })?;

        let key = user_id.to_string();
        if !self.test_limiter.allow(&key) {
            return Err(ServiceError::RateLimited {
                wait_seconds: self.test_limiter.wait_time(&key),
            });
        }

        let result = self
            .gateway
            .send_test(&Recipient {
                contact_id: Some(contact.id),
                name: contact.name.clone(),
                phone: contact.phone.clone(),
            })
            .await;

        let message = if result.success {
            format!("SMS de prueba enviado a {}", contact.name)
        } else if !result.configured {
            NOT_CONFIGURED_MESSAGE.to_string()
        } else {
            "Error al enviar SMS".to_string()
        };

        Ok(TestSmsResult {
            success: result.success,
            message,
            contact: contact.name,
            phone: contact.phone,
        })
    }
}
