//! Tests for the public help-center directory.

use salvo::http::StatusCode;

use acompaniar_service::help_center::HelpCenterView;

use super::helpers::*;

fn center(name: &str) -> HelpCenterView {
    HelpCenterView {
        id: uuid::Uuid::now_v7(),
        name: name.to_string(),
        description: format!("Atención en {name}"),
        category: Some("salud".to_string()),
        category_description: Some("Centro de salud".to_string()),
        address: "24 de Septiembre 500".to_string(),
        latitude: -26.83,
        longitude: -65.2,
        phones: vec!["3814000000".to_string()],
        images: Vec::new(),
    }
}

#[test_log::test(tokio::test)]
async fn centers_are_listed_by_name_without_a_session() {
    let app = TestApp::new();
    app.store.insert_help_center(center("Zona Norte"));
    app.store.insert_help_center(center("Centro"));
    app.store.insert_help_center(center("Banda"));

    let list = TestRequest::get(&api("/centros"))
        .send(&app.service)
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(list["total"], 3);
    assert_eq!(list["centros"][0]["nombre"], "Banda");
    assert_eq!(list["centros"][0]["categoria"], "salud");

    let page = TestRequest::get(&api("/centros?skip=1&limit=1"))
        .send(&app.service)
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(page["total"], 3);
    assert_eq!(page["centros"][0]["nombre"], "Centro");
    assert_eq!(page["centros"].as_array().map(Vec::len), Some(1));
}

#[test_log::test(tokio::test)]
async fn center_detail_and_missing() {
    let app = TestApp::new();
    let known = center("Centro");
    let id = known.id;
    app.store.insert_help_center(known);

    let detail = TestRequest::get(&api(&format!("/centros/{id}")))
        .send(&app.service)
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(detail["telefonos"][0], "3814000000");

    let res = TestRequest::get(&api(&format!("/centros/{}", uuid::Uuid::now_v7())))
        .send(&app.service)
        .await
        .assert_status(StatusCode::NOT_FOUND);
    assert_eq!(res.error(), "Centro de ayuda no encontrado");
}
