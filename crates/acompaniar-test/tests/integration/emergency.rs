//! Tests for the server-side alert flow, its status and history.

use chrono::Duration;
use salvo::http::StatusCode;
use serde_json::json;

use acompaniar_db::db::enums::AlertState;
use acompaniar_service::notify::ProviderError;

use super::helpers::*;

async fn user_with_contacts(app: &TestApp) -> (String, Vec<String>) {
    let token = registered_token(app, "ana@mail.com", "Ana").await;
    let mut ids = Vec::new();
    for (name, phone) in [("Mamá", "3815551111"), ("Papá", "3815552222"), ("Tía", "3815553333")] {
        ids.push(add_contact(app, &token, name, phone).await);
    }
    (token, ids)
}

async fn send_alert(app: &TestApp, token: &str, body: serde_json::Value) -> TestResponse {
    TestRequest::post(&api("/emergency/alert"))
        .bearer(token)
        .json(body)
        .send(&app.service)
        .await
}

async fn alert_status(app: &TestApp, token: &str) -> serde_json::Value {
    TestRequest::get(&api("/emergency/alert/status"))
        .bearer(token)
        .send(&app.service)
        .await
        .assert_status(StatusCode::OK)
        .json()
}

#[test_log::test(tokio::test)]
async fn alert_notifies_every_contact_and_marks_records_sent() {
    let app = TestApp::new();
    let (token, _ids) = user_with_contacts(&app).await;
    let user = user_id(&app, &token).await;

    let res = send_alert(
        &app,
        &token,
        json!({
            "ubicacion": {"direccion": "San Martín 100", "latitud": -26.8083, "longitud": -65.2176},
            "mensaje": "Estoy en la plaza",
        }),
    )
    .await
    .assert_status(StatusCode::OK)
    .json();

    assert_eq!(res["success"], true);
    assert_eq!(res["message"], "Alerta enviada exitosamente");
    assert_eq!(res["peticiones_creadas"], 3);
    assert_eq!(res["sms_enviados"], 3);

    let sent = app.sms.sent();
    assert_eq!(sent.len(), 3);
    assert!(sent.iter().any(|m| m.to == "+543815551111"));
    assert!(sent[0].body.contains("Ana necesita ayuda URGENTE."));
    assert!(sent[0].body.contains("Estoy en la plaza"));
    assert!(sent[0].body.contains("https://maps.google.com/?q=-26.8083,-65.2176"));

    eventually(|| {
        app.store
            .records_for_user(user)
            .iter()
            .all(|r| r.state_code == AlertState::Sent)
    })
    .await;
    assert_eq!(app.store.location_count(), 1);
}

#[test_log::test(tokio::test)]
async fn partial_failure_reports_and_leaves_failed_record_pending() {
    let app = TestApp::new();
    let (token, _ids) = user_with_contacts(&app).await;
    let user = user_id(&app, &token).await;
    app.sms.fail_number(
        "+543815552222",
        ProviderError::Rejected {
            code: Some(21_211),
            message: "invalid".to_string(),
        },
    );

    let res = send_alert(&app, &token, json!({}))
        .await
        .assert_status(StatusCode::OK)
        .json();

    assert_eq!(res["success"], false);
    assert_eq!(res["message"], "Error al enviar algunas alertas");
    assert_eq!(res["peticiones_creadas"], 3);
    assert_eq!(res["sms_enviados"], 2);

    eventually(|| {
        app.store
            .records_for_user(user)
            .iter()
            .filter(|r| r.state_code == AlertState::Sent)
            .count()
            == 2
    })
    .await;

    let pending: Vec<_> = app
        .store
        .records_for_user(user)
        .into_iter()
        .filter(|r| r.state_code == AlertState::Pending)
        .collect();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].contact_name, "Papá");
}

#[test_log::test(tokio::test)]
async fn second_alert_inside_window_is_rate_limited() {
    let app = TestApp::new();
    let (token, _ids) = user_with_contacts(&app).await;

    send_alert(&app, &token, json!({}))
        .await
        .assert_status(StatusCode::OK);

    app.clock.advance(Duration::seconds(20));
    let res = send_alert(&app, &token, json!({}))
        .await
        .assert_status(StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        res.error(),
        "Por seguridad, debes esperar 40 segundos antes de enviar otra alerta"
    );
    assert_eq!(res.retry_after.as_deref(), Some("40"));
    assert_eq!(app.sms.attempts(), 3);

    app.clock.advance(Duration::seconds(41));
    send_alert(&app, &token, json!({}))
        .await
        .assert_status(StatusCode::OK);
    assert_eq!(app.sms.attempts(), 6);
}

#[test_log::test(tokio::test)]
async fn status_reflects_the_window() {
    let app = TestApp::new();
    let (token, _ids) = user_with_contacts(&app).await;

    let before = alert_status(&app, &token).await;
    assert_eq!(before["can_send_alert"], true);
    assert_eq!(before["wait_seconds"], 0);

    send_alert(&app, &token, json!({}))
        .await
        .assert_status(StatusCode::OK);
    app.clock.advance(Duration::seconds(30));

    let after = alert_status(&app, &token).await;
    assert_eq!(after["can_send_alert"], false);
    assert_eq!(after["wait_seconds"], 30);
    assert_eq!(after["recent_alerts"], 1);
}

#[test_log::test(tokio::test)]
async fn user_without_contacts_gets_bad_request() {
    let app = TestApp::new();
    let token = anonymous_token(&app).await;

    let res = send_alert(&app, &token, json!({}))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        res.error(),
        "No tienes contactos configurados. Agrega al menos un contacto de emergencia."
    );
    assert_eq!(app.sms.attempts(), 0);
}

#[test_log::test(tokio::test)]
async fn unknown_or_malformed_contact_ids_are_rejected() {
    let app = TestApp::new();
    let (token, _ids) = user_with_contacts(&app).await;

    let res = send_alert(&app, &token, json!({"contacto_ids": ["basura"]}))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(res.error(), "No se encontraron contactos válidos");

    let foreign = uuid::Uuid::now_v7().to_string();
    let res = send_alert(&app, &token, json!({"contacto_ids": [foreign]}))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(res.error(), "No se encontraron contactos válidos");
    assert_eq!(app.sms.attempts(), 0);
}

#[test_log::test(tokio::test)]
async fn selected_contacts_only() {
    let app = TestApp::new();
    let (token, ids) = user_with_contacts(&app).await;

    let res = send_alert(&app, &token, json!({"contacto_ids": [ids[2], "basura"]}))
        .await
        .assert_status(StatusCode::OK)
        .json();

    assert_eq!(res["peticiones_creadas"], 1);
    let sent = app.sms.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "+543815553333");
}

#[test_log::test(tokio::test)]
async fn audit_failure_aborts_before_sending() {
    let app = TestApp::new();
    let (token, _ids) = user_with_contacts(&app).await;
    let user = user_id(&app, &token).await;
    app.store.fail_audit_record_at(Some(1));

    send_alert(&app, &token, json!({}))
        .await
        .assert_status(StatusCode::INTERNAL_SERVER_ERROR);

    assert_eq!(app.sms.attempts(), 0);
    assert!(app.store.records_for_user(user).is_empty());
    assert_eq!(app.store.location_count(), 0);
}

#[test_log::test(tokio::test)]
async fn invalid_payloads_are_rejected() {
    let app = TestApp::new();
    let (token, _ids) = user_with_contacts(&app).await;

    send_alert(&app, &token, json!({"mensaje": "x".repeat(161)}))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    send_alert(
        &app,
        &token,
        json!({"ubicacion": {"direccion": "Plaza", "latitud": 91.0, "longitud": 0.0}}),
    )
    .await
    .assert_status(StatusCode::BAD_REQUEST);

    assert_eq!(app.sms.attempts(), 0);
}

#[test_log::test(tokio::test)]
async fn history_lists_newest_first_with_location() {
    let app = TestApp::new();
    let (token, _ids) = user_with_contacts(&app).await;

    send_alert(
        &app,
        &token,
        json!({"ubicacion": {"direccion": "San Martín 100", "latitud": -26.8, "longitud": -65.2}}),
    )
    .await
    .assert_status(StatusCode::OK);

    let history = TestRequest::get(&api("/emergency/history"))
        .bearer(&token)
        .send(&app.service)
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(history["total"], 3);
    assert_eq!(history["alerts"][0]["location"]["address"], "San Martín 100");

    let limited = TestRequest::get(&api("/emergency/history?limit=1"))
        .bearer(&token)
        .send(&app.service)
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(limited["total"], 1);
}

#[test_log::test(tokio::test)]
async fn test_sms_is_owned_and_limited() {
    let app = TestApp::new();
    let (token, ids) = user_with_contacts(&app).await;
    let intruder = anonymous_token(&app).await;

    let res = TestRequest::post(&api(&format!("/emergency/test-sms?contact_id={}", ids[0])))
        .bearer(&token)
        .send(&app.service)
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(res["success"], true);
    assert_eq!(res["contact"], "Mamá");
    assert_eq!(res["message"], "SMS de prueba enviado a Mamá");

    TestRequest::post(&api(&format!("/emergency/test-sms?contact_id={}", ids[0])))
        .bearer(&intruder)
        .send(&app.service)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    for _ in 0..2 {
        TestRequest::post(&api(&format!("/emergency/test-sms?contact_id={}", ids[1])))
            .bearer(&token)
            .send(&app.service)
            .await
            .assert_status(StatusCode::OK);
    }
    TestRequest::post(&api(&format!("/emergency/test-sms?contact_id={}", ids[1])))
        .bearer(&token)
        .send(&app.service)
        .await
        .assert_status(StatusCode::TOO_MANY_REQUESTS);

    TestRequest::post(&api("/emergency/test-sms"))
        .bearer(&token)
        .send(&app.service)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}
