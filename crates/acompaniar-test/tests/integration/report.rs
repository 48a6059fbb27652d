//! Tests for ingestion of delivery reports sent from the device.

use salvo::http::StatusCode;
use serde_json::json;

use acompaniar_db::db::enums::AlertState;

use super::helpers::*;

async fn report(app: &TestApp, token: &str, body: serde_json::Value) -> serde_json::Value {
    TestRequest::post(&api("/emergency/report"))
        .bearer(token)
        .json(body)
        .send(&app.service)
        .await
        .assert_status(StatusCode::OK)
        .json()
}

#[test_log::test(tokio::test)]
async fn report_records_and_marks_successful_recipients() {
    let app = TestApp::new();
    let token = anonymous_token(&app).await;
    let user = user_id(&app, &token).await;
    let mama = add_contact(&app, &token, "Mamá", "3815551111").await;
    let papa = add_contact(&app, &token, "Papá", "3815552222").await;

    let res = report(
        &app,
        &token,
        json!({
            "contacto_ids": [mama, papa],
            "ubicacion": {"direccion": "Plaza Independencia", "latitud": -26.83, "longitud": -65.2},
            "mensaje": "Enviado desde el teléfono",
            "resultados": [
                {"contacto_id": mama, "success": true},
                {"telefono": "381 555 2222", "success": false, "error": "sin señal"},
            ],
        }),
    )
    .await;

    assert_eq!(res["success"], true);
    assert_eq!(res["peticiones_registradas"], 2);
    assert_eq!(res["message"], "Reporte registrado");
    assert!(res["report_id"].is_string());

    let records = app.store.records_for_user(user);
    let sent: Vec<_> = records
        .iter()
        .filter(|r| r.state_code == AlertState::Sent)
        .map(|r| r.contact_name.as_str())
        .collect();
    assert_eq!(sent, vec!["Mamá"]);
    assert_eq!(app.store.location_count(), 1);
    assert_eq!(app.sms.attempts(), 0);
}

#[test_log::test(tokio::test)]
async fn malformed_ids_still_answer_success() {
    let app = TestApp::new();
    let token = anonymous_token(&app).await;
    let user = user_id(&app, &token).await;
    add_contact(&app, &token, "Mamá", "3815551111").await;

    let res = report(&app, &token, json!({"contacto_ids": ["no-es-un-id"]})).await;

    assert_eq!(res["success"], true);
    assert!(res["report_id"].is_null());
    assert_eq!(res["peticiones_registradas"], 0);
    assert!(app.store.records_for_user(user).is_empty());
}

#[test_log::test(tokio::test)]
async fn persistence_failure_is_swallowed() {
    let app = TestApp::new();
    let token = anonymous_token(&app).await;
    add_contact(&app, &token, "Mamá", "3815551111").await;
    app.store.fail_audit_record_at(Some(0));

    let res = report(&app, &token, json!({"resultados": []})).await;

    assert_eq!(res["success"], true);
    assert!(res["report_id"].is_null());
    assert_eq!(res["message"], "Reporte recibido");
}

#[test_log::test(tokio::test)]
async fn reports_ignore_the_alert_rate_limit() {
    let app = TestApp::new();
    let token = anonymous_token(&app).await;
    add_contact(&app, &token, "Mamá", "3815551111").await;

    for _ in 0..3 {
        let res = report(&app, &token, json!({})).await;
        assert_eq!(res["peticiones_registradas"], 1);
    }
}

#[test_log::test(tokio::test)]
async fn invalid_location_is_dropped() {
    let app = TestApp::new();
    let token = anonymous_token(&app).await;
    add_contact(&app, &token, "Mamá", "3815551111").await;

    let res = report(
        &app,
        &token,
        json!({"ubicacion": {"direccion": "", "latitud": 0.0, "longitud": 0.0}}),
    )
    .await;

    assert_eq!(res["peticiones_registradas"], 1);
    assert_eq!(app.store.location_count(), 0);
}

#[test_log::test(tokio::test)]
async fn report_requires_a_session() {
    let app = TestApp::new();

    TestRequest::post(&api("/emergency/report"))
        .json(json!({}))
        .send(&app.service)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}
