use salvo::{Depot, Request, Response, Router, handler, http::StatusCode, writing::Json};
use serde::{Deserialize, Serialize};

use super::EMERGENCY_ROUTE_COMPONENT;
use super::response::{parse_body, render_error, render_service_error, require_user, services};
use acompaniar_core::types::GeoPoint;
use acompaniar_service::alert::{
    AlertRequest, AuditWriteError, DeliveryReport, ReportedResult, parse_contact_ids,
};
use acompaniar_service::error::ServiceError;

const NO_VALID_CONTACTS: &str = "No se encontraron contactos válidos";

/// Location as sent by the mobile client.
#[derive(Debug, Deserialize)]
pub struct LocationBody {
    pub direccion: String,
    pub latitud: f64,
    pub longitud: f64,
}

impl LocationBody {
    fn into_point(self) -> Result<GeoPoint, acompaniar_core::error::CoreError> {
        GeoPoint::new(&self.direccion, self.latitud, self.longitud)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AlertBody {
    #[serde(default)]
    pub contacto_ids: Option<Vec<String>>,
    #[serde(default)]
    pub ubicacion: Option<LocationBody>,
    #[serde(default)]
    pub mensaje: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReportBody {
    #[serde(default)]
    pub contacto_ids: Option<Vec<String>>,
    #[serde(default)]
    pub ubicacion: Option<LocationBody>,
    #[serde(default)]
    pub mensaje: Option<String>,
    #[serde(default)]
    pub resultados: Vec<ReportedResult>,
}

#[derive(Debug, Serialize)]
pub struct ReportResponse {
    pub success: bool,
    pub report_id: Option<uuid::Uuid>,
    pub peticiones_registradas: usize,
    pub message: String,
}

/// ## Summary
/// POST /emergency/alert - Notifies the user's contacts by SMS
///
/// ## Side Effects
/// Writes one audit record per recipient before anything is sent and marks
/// delivered ones `sent` in the background.
///
/// ## Errors
/// Returns HTTP 429 inside the rate window, 400 for invalid input or when no
/// contact can be alerted, 500 if the audit trail cannot be written.
#[handler]
async fn send_alert(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let Some(user) = require_user(depot, res) else {
        return;
    };
    let Some(body) = parse_body::<AlertBody>(req, res).await else {
        return;
    };
    let Some(services) = services(depot, res) else {
        return;
    };

    let Ok(contact_ids) = parse_contact_ids(body.contacto_ids) else {
        render_error(res, StatusCode::BAD_REQUEST, NO_VALID_CONTACTS);
        return;
    };
    let location = match body.ubicacion.map(LocationBody::into_point).transpose() {
        Ok(location) => location,
        Err(e) => {
            render_service_error(res, &ServiceError::from(e));
            return;
        }
    };

    let explicit_recipients = contact_ids.is_some();
    let request = AlertRequest {
        contact_ids,
        location,
        message: body.mensaje,
    };

    match services.alerts.dispatch(&user, request).await {
        Ok(outcome) => res.render(Json(outcome.summary)),
        Err(ServiceError::RateLimited { wait_seconds }) => {
            if let Err(e) = res.add_header("Retry-After", wait_seconds.to_string(), true) {
                tracing::warn!(error = ?e, "Failed to set Retry-After header");
            }
            render_error(
                res,
                StatusCode::TOO_MANY_REQUESTS,
                format!(
                    "Por seguridad, debes esperar {wait_seconds} segundos antes de enviar otra alerta"
                ),
            );
        }
        Err(ServiceError::NoRecipients) if explicit_recipients => {
            render_error(res, StatusCode::BAD_REQUEST, NO_VALID_CONTACTS);
        }
        Err(e) => render_service_error(res, &e),
    }
}

/// ## Summary
/// GET /emergency/alert/status - Whether an alert may be sent right now
#[handler]
async fn alert_status(depot: &mut Depot, res: &mut Response) {
    let Some(user) = require_user(depot, res) else {
        return;
    };
    let Some(services) = services(depot, res) else {
        return;
    };

    match services.alerts.status(user.id).await {
        Ok(status) => res.render(Json(status)),
        Err(e) => render_service_error(res, &e),
    }
}

/// ## Summary
/// GET /emergency/history?limit= - Recent audit records, newest first
#[handler]
async fn history(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let Some(user) = require_user(depot, res) else {
        return;
    };
    let Some(services) = services(depot, res) else {
        return;
    };

    let limit = req.query::<i64>("limit");
    match services.alerts.history(user.id, limit).await {
        Ok(view) => res.render(Json(view)),
        Err(e) => render_service_error(res, &e),
    }
}

/// ## Summary
/// POST /emergency/test-sms?contact_id= - Sends a diagnostic SMS
///
/// ## Errors
/// Returns HTTP 403 for contacts the user does not own and 429 once the
/// diagnostic budget is used up.
#[handler]
async fn test_sms(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let Some(user) = require_user(depot, res) else {
        return;
    };
    let Some(services) = services(depot, res) else {
        return;
    };

    let Some(contact_id) = req
        .query::<String>("contact_id")
        .and_then(|raw| uuid::Uuid::parse_str(raw.trim()).ok())
    else {
        render_error(res, StatusCode::BAD_REQUEST, "contact_id inválido");
        return;
    };

    match services.alerts.send_test(user.id, contact_id).await {
        Ok(result) => res.render(Json(result)),
        Err(e) => render_service_error(res, &e),
    }
}

/// ## Summary
/// POST /emergency/report - Records an alert the device sent itself
///
/// The messages already went out, so any failure to record them is logged
/// and the response still reports success with a null `report_id`.
#[handler]
async fn report(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let Some(user) = require_user(depot, res) else {
        return;
    };
    let Some(body) = parse_body::<ReportBody>(req, res).await else {
        return;
    };
    let Some(services) = services(depot, res) else {
        return;
    };

    let location = body.ubicacion.and_then(|raw| {
        raw.into_point()
            .inspect_err(|e| tracing::warn!(error = %e, "Dropping invalid report location"))
            .ok()
    });

    let delivery = DeliveryReport {
        contact_ids: body.contacto_ids,
        location,
        message: body.mensaje,
        results: body.resultados,
    };

    let response = match services.alerts.ingest_report(user.id, delivery).await {
        Ok(ack) => ReportResponse {
            success: true,
            report_id: Some(ack.report_id),
            peticiones_registradas: ack.records,
            message: "Reporte registrado".to_string(),
        },
        Err(e) => {
            match &e {
                AuditWriteError::NoRecipients => {
                    tracing::warn!(user_id = %user.id, "Report names no known contact, not recorded");
                }
                AuditWriteError::Persistence(inner) => {
                    tracing::warn!(user_id = %user.id, error = ?inner, "Failed to record delivery report");
                }
            }
            ReportResponse {
                success: true,
                report_id: None,
                peticiones_registradas: 0,
                message: "Reporte recibido".to_string(),
            }
        }
    };

    res.render(Json(response));
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path(EMERGENCY_ROUTE_COMPONENT)
        .push(
            Router::with_path("alert")
                .post(send_alert)
                .push(Router::with_path("status").get(alert_status)),
        )
        .push(Router::with_path("history").get(history))
        .push(Router::with_path("test-sms").post(test_sms))
        .push(Router::with_path("report").post(report))
}

