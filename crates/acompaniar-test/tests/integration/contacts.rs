//! Tests for the emergency contact list.

use salvo::http::StatusCode;
use serde_json::json;

use super::helpers::*;

#[test_log::test(tokio::test)]
async fn contacts_are_listed_in_order_with_first_primary() {
    let app = TestApp::new();
    let token = anonymous_token(&app).await;

    add_contact(&app, &token, "Mamá", "0381 555-1111").await;
    add_contact(&app, &token, "Papá", "3815552222").await;

    let list = TestRequest::get(&api("/contacts"))
        .bearer(&token)
        .send(&app.service)
        .await
        .assert_status(StatusCode::OK)
        .json();

    assert_eq!(list["total"], 2);
    assert_eq!(list["max_allowed"], 3);
    assert_eq!(list["contacts"][0]["nombre"], "Mamá");
    assert_eq!(list["contacts"][0]["telefono"], "543815551111");
    assert_eq!(list["contacts"][0]["is_primary"], true);
    assert_eq!(list["contacts"][1]["is_primary"], false);
}

#[test_log::test(tokio::test)]
async fn fourth_contact_is_rejected() {
    let app = TestApp::new();
    let token = anonymous_token(&app).await;
    for (name, phone) in [("A", "3815551111"), ("B", "3815552222"), ("C", "3815553333")] {
        add_contact(&app, &token, name, phone).await;
    }

    let res = TestRequest::post(&api("/contacts"))
        .bearer(&token)
        .json(json!({"nombre": "D", "telefono": "3815554444"}))
        .send(&app.service)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(res.error(), "Máximo 3 contactos de emergencia permitidos");
}

#[test_log::test(tokio::test)]
async fn invalid_input_is_rejected() {
    let app = TestApp::new();
    let token = anonymous_token(&app).await;

    TestRequest::post(&api("/contacts"))
        .bearer(&token)
        .json(json!({"nombre": "A", "telefono": "12"}))
        .send(&app.service)
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    TestRequest::post(&api("/contacts"))
        .bearer(&token)
        .json(json!({"nombre": "   ", "telefono": "3815551111"}))
        .send(&app.service)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[test_log::test(tokio::test)]
async fn other_users_contacts_are_forbidden() {
    let app = TestApp::new();
    let owner = anonymous_token(&app).await;
    let intruder = anonymous_token(&app).await;
    let id = add_contact(&app, &owner, "Mamá", "3815551111").await;

    TestRequest::get(&api(&format!("/contacts/{id}")))
        .bearer(&intruder)
        .send(&app.service)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    TestRequest::delete(&api(&format!("/contacts/{id}")))
        .bearer(&intruder)
        .send(&app.service)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let missing = uuid::Uuid::now_v7();
    TestRequest::get(&api(&format!("/contacts/{missing}")))
        .bearer(&owner)
        .send(&app.service)
        .await
        .assert_status(StatusCode::NOT_FOUND);

    TestRequest::get(&api("/contacts/no-es-un-id"))
        .bearer(&owner)
        .send(&app.service)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[test_log::test(tokio::test)]
async fn update_and_delete() {
    let app = TestApp::new();
    let token = anonymous_token(&app).await;
    let first = add_contact(&app, &token, "Mamá", "3815551111").await;
    let second = add_contact(&app, &token, "Papá", "3815552222").await;

    let updated = TestRequest::put(&api(&format!("/contacts/{second}")))
        .bearer(&token)
        .json(json!({"telefono": "+5491122223333"}))
        .send(&app.service)
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(updated["nombre"], "Papá");
    assert_eq!(updated["telefono"], "+5491122223333");

    let deleted = TestRequest::delete(&api(&format!("/contacts/{first}")))
        .bearer(&token)
        .send(&app.service)
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(deleted["id"], first.as_str());

    let list = TestRequest::get(&api("/contacts"))
        .bearer(&token)
        .send(&app.service)
        .await
        .json();
    assert_eq!(list["total"], 1);
    assert_eq!(list["contacts"][0]["id"], second.as_str());
    assert_eq!(list["contacts"][0]["is_primary"], true);
}

#[test_log::test(tokio::test)]
async fn set_primary_keeps_ids() {
    let app = TestApp::new();
    let token = anonymous_token(&app).await;
    let a = add_contact(&app, &token, "A", "3815551111").await;
    let b = add_contact(&app, &token, "B", "3815552222").await;
    let c = add_contact(&app, &token, "C", "3815553333").await;

    let res = TestRequest::post(&api(&format!("/contacts/{c}/set-primary")))
        .bearer(&token)
        .send(&app.service)
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(res["id"], c.as_str());
    assert_eq!(res["is_primary"], true);

    let list = TestRequest::get(&api("/contacts"))
        .bearer(&token)
        .send(&app.service)
        .await
        .json();
    let order: Vec<&str> = list["contacts"]
        .as_array()
        .map(|contacts| contacts.iter().filter_map(|c| c["id"].as_str()).collect())
        .unwrap_or_default();
    assert_eq!(order, vec![c.as_str(), a.as_str(), b.as_str()]);
}

#[test_log::test(tokio::test)]
async fn sync_replaces_the_list() {
    let app = TestApp::new();
    let token = anonymous_token(&app).await;
    add_contact(&app, &token, "Viejo", "3815551111").await;

    let res = TestRequest::post(&api("/contacts/sync"))
        .bearer(&token)
        .json(json!({"contacts": [
            {"nombre": "Nuevo 1", "telefono": "3815552222"},
            {"nombre": "Nuevo 2", "telefono": "3815553333"},
        ]}))
        .send(&app.service)
        .await
        .assert_status(StatusCode::OK)
        .json();

    assert_eq!(res["synced"], 2);
    assert_eq!(res["contacts"][0]["nombre"], "Nuevo 1");
    assert_eq!(res["contacts"][0]["is_primary"], true);

    TestRequest::post(&api("/contacts/sync"))
        .bearer(&token)
        .json(json!({"contacts": [
            {"nombre": "1", "telefono": "3815551111"},
            {"nombre": "2", "telefono": "3815552222"},
            {"nombre": "3", "telefono": "3815553333"},
            {"nombre": "4", "telefono": "3815554444"},
        ]}))
        .send(&app.service)
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let list = TestRequest::get(&api("/contacts"))
        .bearer(&token)
        .send(&app.service)
        .await
        .json();
    assert_eq!(list["total"], 2);
}
