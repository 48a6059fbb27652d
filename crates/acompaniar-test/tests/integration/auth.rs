//! Tests for sessions and the account endpoints.

use salvo::http::StatusCode;
use serde_json::json;

use super::helpers::*;

#[test_log::test(tokio::test)]
async fn health_is_public() {
    let app = TestApp::new();

    let res = TestRequest::get("/health").send(&app.service).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, "OK");
}

#[test_log::test(tokio::test)]
async fn register_login_and_me() {
    let app = TestApp::new();
    let token = registered_token(&app, "Ana@Mail.com", "Ana Pérez").await;

    let me = TestRequest::get(&api("/users/me"))
        .bearer(&token)
        .send(&app.service)
        .await
        .assert_status(StatusCode::OK)
        .json();

    assert_eq!(me["email"], "ana@mail.com");
    assert_eq!(me["full_name"], "Ana Pérez");
    assert_eq!(me["is_anonymous"], false);
}

#[test_log::test(tokio::test)]
async fn duplicate_email_conflicts() {
    let app = TestApp::new();
    registered_token(&app, "ana@mail.com", "Ana").await;

    TestRequest::post(&api("/auth/register"))
        .json(json!({"email": "ANA@mail.com", "password": "otraclave"}))
        .send(&app.service)
        .await
        .assert_status(StatusCode::CONFLICT);
}

#[test_log::test(tokio::test)]
async fn registration_requires_credentials() {
    let app = TestApp::new();

    TestRequest::post(&api("/auth/register"))
        .json(json!({"full_name": "Sin datos"}))
        .send(&app.service)
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    TestRequest::post(&api("/auth/register"))
        .json(json!({"email": "a@b.com", "password": "123"}))
        .send(&app.service)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[test_log::test(tokio::test)]
async fn wrong_password_is_unauthorized_then_limited() {
    let app = TestApp::new();
    registered_token(&app, "ana@mail.com", "Ana").await;

    let res = TestRequest::post(&api("/auth/login"))
        .json(json!({"email": "ana@mail.com", "password": "incorrecta"}))
        .send(&app.service)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(res.error(), "Credenciales inválidas");

    // One successful login already reset the budget; four more failures use it up.
    for _ in 0..4 {
        TestRequest::post(&api("/auth/login"))
            .json(json!({"email": "ana@mail.com", "password": "incorrecta"}))
            .send(&app.service)
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    let res = TestRequest::post(&api("/auth/login"))
        .json(json!({"email": "ana@mail.com", "password": "secreto123"}))
        .send(&app.service)
        .await
        .assert_status(StatusCode::TOO_MANY_REQUESTS);
    assert!(res.retry_after.is_some());
}

#[test_log::test(tokio::test)]
async fn protected_routes_need_a_token() {
    let app = TestApp::new();

    TestRequest::get(&api("/users/me"))
        .send(&app.service)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    TestRequest::get(&api("/contacts"))
        .bearer("not-a-token")
        .send(&app.service)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[test_log::test(tokio::test)]
async fn anonymous_session_upgrades_in_place() {
    let app = TestApp::new();
    let token = anonymous_token(&app).await;
    let anonymous_id = user_id(&app, &token).await;
    add_contact(&app, &token, "Mamá", "3815551111").await;

    let res = TestRequest::post(&api("/auth/complete"))
        .bearer(&token)
        .json(json!({"email": "nueva@mail.com", "password": "secreto123", "full_name": "Lu"}))
        .send(&app.service)
        .await
        .assert_status(StatusCode::OK);
    let upgraded = res.json()["access_token"].as_str().unwrap_or_default().to_string();

    assert_eq!(user_id(&app, &upgraded).await, anonymous_id);

    let contacts = TestRequest::get(&api("/contacts"))
        .bearer(&upgraded)
        .send(&app.service)
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(contacts["total"], 1);

    TestRequest::post(&api("/auth/complete"))
        .bearer(&upgraded)
        .json(json!({"email": "otra@mail.com", "password": "secreto123"}))
        .send(&app.service)
        .await
        .assert_status(StatusCode::CONFLICT);
}

#[test_log::test(tokio::test)]
async fn deactivated_accounts_lose_access() {
    let app = TestApp::new();
    let token = registered_token(&app, "ana@mail.com", "Ana").await;

    let res = TestRequest::delete(&api("/users/me"))
        .bearer(&token)
        .send(&app.service)
        .await
        .assert_status(StatusCode::OK);
    assert_eq!(res.json()["is_active"], false);

    TestRequest::get(&api("/users/me"))
        .bearer(&token)
        .send(&app.service)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[test_log::test(tokio::test)]
async fn profile_update_changes_name() {
    let app = TestApp::new();
    let token = registered_token(&app, "ana@mail.com", "Ana").await;

    let res = TestRequest::put(&api("/users/me"))
        .bearer(&token)
        .json(json!({"full_name": "Ana María"}))
        .send(&app.service)
        .await
        .assert_status(StatusCode::OK);
    assert_eq!(res.json()["full_name"], "Ana María");
}
