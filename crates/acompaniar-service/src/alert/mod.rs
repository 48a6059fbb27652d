//! Emergency alerts: the server-side dispatch flow and ingestion of reports
//! for messages the device already sent.

mod dispatcher;
mod report;

use chrono::{DateTime, Utc};
use serde::Serialize;

use acompaniar_core::types::GeoPoint;
use acompaniar_db::db::enums::AlertState;

use crate::error::ServiceError;

pub use dispatcher::{AlertDispatcher, AlertOutcome};
pub use report::{AuditWriteError, DeliveryReport, ReportAck, ReportedResult};

pub const ALERT_SENT_MESSAGE: &str = "Alerta enviada exitosamente";
pub const ALERT_PARTIAL_MESSAGE: &str = "Error al enviar algunas alertas";
pub const DEFAULT_SENDER_NAME: &str = "Un usuario";
pub const UNKNOWN_CONTACT_NAME: &str = "Desconocido";
pub const MAX_HISTORY_LIMIT: i64 = 100;

/// ## Summary
/// Parses contact ids sent by a client, dropping malformed entries.
///
/// An absent or empty list yields `Ok(None)`, which targets every contact.
///
/// ## Errors
/// Returns `NoRecipients` if ids were given but none of them parses.
pub fn parse_contact_ids(
    raw: Option<Vec<String>>,
) -> Result<Option<Vec<uuid::Uuid>>, ServiceError> {
    let Some(raw) = raw.filter(|ids| !ids.is_empty()) else {
        return Ok(None);
    };

    let parsed: Vec<uuid::Uuid> = raw
        .iter()
        .filter_map(|id| {
            uuid::Uuid::parse_str(id.trim())
                .inspect_err(|_err| tracing::debug!(contact_id = %id, "Dropping malformed contact id"))
                .ok()
        })
        .collect();

    if parsed.is_empty() {
        return Err(ServiceError::NoRecipients);
    }
    Ok(Some(parsed))
}

/// A request to alert the user's contacts.
#[derive(Debug, Clone, Default)]
pub struct AlertRequest {
    /// `None` or empty alerts every contact.
    pub contact_ids: Option<Vec<uuid::Uuid>>,
    pub location: Option<GeoPoint>,
    pub message: Option<String>,
}

/// Client-facing result of an alert. Recipient failures show up here as
/// `success: false`, never as an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlertSummary {
    pub success: bool,
    pub message: String,
    pub peticiones_creadas: usize,
    pub sms_enviados: usize,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlertStatus {
    pub can_send_alert: bool,
    pub wait_seconds: u64,
    pub recent_alerts: usize,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationView {
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryItem {
    pub id: uuid::Uuid,
    pub alert_id: uuid::Uuid,
    pub contact: String,
    pub status: AlertState,
    pub sent_at: DateTime<Utc>,
    pub location: Option<LocationView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryView {
    pub total: usize,
    pub alerts: Vec<HistoryItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestSmsResult {
    pub success: bool,
    pub message: String,
    pub contact: String,
    pub phone: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contact_id_parsing() {
        assert!(matches!(parse_contact_ids(None), Ok(None)));
        assert!(matches!(parse_contact_ids(Some(Vec::new())), Ok(None)));
        assert!(matches!(
            parse_contact_ids(Some(vec!["x".to_string()])),
            Err(ServiceError::NoRecipients)
        ));

        let id = uuid::Uuid::now_v7();
        let parsed = parse_contact_ids(Some(vec!["x".to_string(), format!(" {id} ")]))
            .expect("valid ids");
        assert_eq!(parsed, Some(vec![id]));
    }
}
