//! Fan-out of one message to many recipients with per-recipient outcomes.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use acompaniar_core::clock::Clock;
use acompaniar_core::config::{PhoneConfig, SmsConfig};
use acompaniar_core::types::GeoPoint;
use acompaniar_core::util::phone::PhoneRules;

use super::message::{self, EmergencyMessage};
use super::provider::{ProviderError, SmsProvider};
use super::twilio::TwilioProvider;
use crate::error::ServiceResult;

pub const NOT_CONFIGURED_MESSAGE: &str = "Servicio SMS no configurado";

const TWILIO_INVALID_NUMBER: u32 = 21_211;
const TWILIO_UNVERIFIED_NUMBER: u32 = 21_608;

/// Normalized reason a single send failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SendFailure {
    InvalidNumber,
    UnverifiedNumber,
    Rejected,
    Timeout,
    Unknown,
}

impl SendFailure {
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::InvalidNumber => "Número de teléfono inválido",
            Self::UnverifiedNumber => "Número no verificado en la cuenta del proveedor",
            Self::Rejected => "Mensaje rechazado por el proveedor",
            Self::Timeout => "Tiempo de espera agotado",
            Self::Unknown => "Error desconocido al enviar el SMS",
        }
    }
}

impl From<&ProviderError> for SendFailure {
    fn from(err: &ProviderError) -> Self {
        match err {
            ProviderError::Rejected {
                code: Some(TWILIO_INVALID_NUMBER),
                ..
            } => Self::InvalidNumber,
            ProviderError::Rejected {
                code: Some(TWILIO_UNVERIFIED_NUMBER),
                ..
            } => Self::UnverifiedNumber,
            ProviderError::Rejected { .. } => Self::Rejected,
            ProviderError::Timeout => Self::Timeout,
            ProviderError::Transport(_) => Self::Unknown,
        }
    }
}

/// Someone to notify.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub contact_id: Option<uuid::Uuid>,
    pub name: String,
    pub phone: String,
}

/// Outcome of one send attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryDetail {
    pub contact_id: Option<uuid::Uuid>,
    pub contact: String,
    pub phone: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<SendFailure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
}

/// Aggregate outcome of a fan-out. `success` holds only if every send did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchResult {
    pub success: bool,
    pub configured: bool,
    pub message: String,
    pub sent: usize,
    pub failed: usize,
    pub details: Vec<DeliveryDetail>,
    pub timestamp: DateTime<Utc>,
}

impl DispatchResult {
    /// Ids of contacts whose message was accepted.
    pub fn delivered_contacts(&self) -> impl Iterator<Item = uuid::Uuid> + '_ {
        self.details
            .iter()
            .filter(|d| d.success)
            .filter_map(|d| d.contact_id)
    }
}

/// Sends emergency and diagnostic messages through an optional provider.
///
/// Without a provider every call reports all recipients as failed with
/// [`NOT_CONFIGURED_MESSAGE`] and no network activity happens.
#[derive(Debug)]
pub struct NotificationGateway {
    provider: Option<Arc<dyn SmsProvider>>,
    phone_rules: PhoneRules,
    timeout: Duration,
    timezone: Tz,
    signature: String,
    clock: Arc<dyn Clock>,
}

impl NotificationGateway {
    #[must_use]
    pub fn new(
        provider: Option<Arc<dyn SmsProvider>>,
        sms: &SmsConfig,
        phone_rules: PhoneRules,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let timezone = sms.timezone.parse::<Tz>().unwrap_or_else(|_err| {
            tracing::warn!(timezone = %sms.timezone, "Unknown timezone, using America/Argentina/Tucuman");
            chrono_tz::America::Argentina::Tucuman
        });

        Self {
            provider,
            phone_rules,
            timeout: Duration::from_secs(sms.timeout_seconds.max(1)),
            timezone,
            signature: sms.signature.clone(),
            clock,
        }
    }

    /// ## Summary
    /// Builds the gateway, wiring a Twilio provider when credentials are set.
    ///
    /// ## Errors
    /// Returns an error if the HTTP client for the provider cannot be built.
    pub fn from_config(
        sms: &SmsConfig,
        phone: &PhoneConfig,
        clock: Arc<dyn Clock>,
    ) -> ServiceResult<Self> {
        let provider: Option<Arc<dyn SmsProvider>> = match sms.credentials() {
            Some(credentials) => {
                let twilio = TwilioProvider::new(
                    credentials,
                    &sms.api_base,
                    Duration::from_secs(sms.timeout_seconds.max(1)),
                )?;
                tracing::info!("SMS provider configured");
                Some(Arc::new(twilio))
            }
            None => {
                tracing::warn!("SMS credentials not configured, sending is disabled");
                None
            }
        };

        Ok(Self::new(provider, sms, PhoneRules::from(phone), clock))
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.provider.is_some()
    }

    /// ## Summary
    /// Sends the emergency message once to each recipient.
    ///
    /// Recipient failures are reported in the result; this never fails as a whole.
    #[tracing::instrument(skip_all, fields(recipients = recipients.len()))]
    pub async fn send_emergency(
        &self,
        recipients: &[Recipient],
        sender_name: &str,
        location: Option<&GeoPoint>,
        custom_text: Option<&str>,
    ) -> DispatchResult {
        let now = self.clock.now();
        let body = message::emergency_body(&EmergencyMessage {
            sender_name,
            location,
            custom_text,
            local_time: now.with_timezone(&self.timezone),
            signature: &self.signature,
        });

        self.fan_out(recipients, &body, now).await
    }

    /// ## Summary
    /// Sends the fixed diagnostic message to one recipient.
    #[tracing::instrument(skip_all)]
    pub async fn send_test(&self, recipient: &Recipient) -> DispatchResult {
        let now = self.clock.now();
        let body = message::test_body(now.with_timezone(&self.timezone), &self.signature);

        self.fan_out(std::slice::from_ref(recipient), &body, now).await
    }

    async fn fan_out(
        &self,
        recipients: &[Recipient],
        body: &str,
        timestamp: DateTime<Utc>,
    ) -> DispatchResult {
        let Some(provider) = &self.provider else {
            tracing::warn!("Attempted to send SMS without a configured provider");
            return DispatchResult {
                success: false,
                configured: false,
                message: NOT_CONFIGURED_MESSAGE.to_string(),
                sent: 0,
                failed: recipients.len(),
                details: Vec::new(),
                timestamp,
            };
        };

        let mut details = Vec::with_capacity(recipients.len());
        for recipient in recipients {
            details.push(self.send_one(provider.as_ref(), recipient, body).await);
        }

        let sent = details.iter().filter(|d| d.success).count();
        let failed = details.len() - sent;
        let success = failed == 0;

        DispatchResult {
            success,
            configured: true,
            message: if success {
                "SMS enviados correctamente".to_string()
            } else {
                "Error al enviar algunos SMS".to_string()
            },
            sent,
            failed,
            details,
            timestamp,
        }
    }

    async fn send_one(
        &self,
        provider: &dyn SmsProvider,
        recipient: &Recipient,
        body: &str,
    ) -> DeliveryDetail {
        let to = self.phone_rules.normalize_for_dispatch(&recipient.phone);

        let outcome = match tokio::time::timeout(self.timeout, provider.send(&to, body)).await {
            Ok(result) => result,
            Err(_elapsed) => Err(ProviderError::Timeout),
        };

        match outcome {
            Ok(receipt) => {
                tracing::info!(contact = %recipient.name, sid = %receipt.sid, status = %receipt.status, "SMS sent");
                DeliveryDetail {
                    contact_id: recipient.contact_id,
                    contact: recipient.name.clone(),
                    phone: to,
                    success: true,
                    sid: Some(receipt.sid),
                    failure: None,
                    error: None,
                }
            }
            Err(err) => {
                let failure = SendFailure::from(&err);
                tracing::error!(contact = %recipient.name, error = ?err, ?failure, "SMS send failed");
                DeliveryDetail {
                    contact_id: recipient.contact_id,
                    contact: recipient.name.clone(),
                    phone: to,
                    success: false,
                    sid: None,
                    failure: Some(failure),
                    error: Some(failure.description()),
                }
            }
        }
    }
}
