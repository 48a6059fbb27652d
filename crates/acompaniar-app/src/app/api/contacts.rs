use salvo::{Depot, Request, Response, Router, handler, http::StatusCode, writing::Json};
use serde::{Deserialize, Serialize};

use super::CONTACTS_ROUTE_COMPONENT;
use super::response::{parse_body, path_id, render_service_error, require_user, services};
use acompaniar_service::contact::{ContactPatch, ContactView};

#[derive(Debug, Deserialize)]
pub struct ContactRequest {
    pub nombre: String,
    pub telefono: String,
}

#[derive(Debug, Deserialize)]
pub struct ContactUpdateRequest {
    #[serde(default)]
    pub nombre: Option<String>,
    #[serde(default)]
    pub telefono: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SyncRequest {
    #[serde(default)]
    pub contacts: Vec<ContactRequest>,
}

#[derive(Debug, Serialize)]
pub struct ContactListResponse {
    pub contacts: Vec<ContactView>,
    pub total: usize,
    pub max_allowed: usize,
}

#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub synced: usize,
    pub contacts: Vec<ContactView>,
    pub message: String,
}

/// ## Summary
/// GET /contacts - Lists the user's contacts, primary first
#[handler]
async fn list_contacts(depot: &mut Depot, res: &mut Response) {
    let Some(user) = require_user(depot, res) else {
        return;
    };
    let Some(services) = services(depot, res) else {
        return;
    };

    match services.contacts.list(user.id).await {
        Ok(contacts) => res.render(Json(ContactListResponse {
            total: contacts.len(),
            contacts,
            max_allowed: services.contacts.max_contacts(),
        })),
        Err(e) => render_service_error(res, &e),
    }
}

/// ## Summary
/// POST /contacts - Appends a contact to the user's list
///
/// ## Errors
/// Returns HTTP 400 for invalid input or when the list is full.
#[handler]
async fn create_contact(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let Some(user) = require_user(depot, res) else {
        return;
    };
    let Some(body) = parse_body::<ContactRequest>(req, res).await else {
        return;
    };
    let Some(services) = services(depot, res) else {
        return;
    };

    match services
        .contacts
        .create(user.id, &body.nombre, &body.telefono)
        .await
    {
        Ok(contact) => {
            res.status_code(StatusCode::CREATED);
            res.render(Json(contact));
        }
        Err(e) => render_service_error(res, &e),
    }
}

/// ## Summary
/// POST /contacts/sync - Replaces the whole list in one step
///
/// ## Side Effects
/// Audit records of removed contacts keep their snapshot and lose the
/// contact reference.
#[handler]
async fn sync_contacts(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let Some(user) = require_user(depot, res) else {
        return;
    };
    let Some(body) = parse_body::<SyncRequest>(req, res).await else {
        return;
    };
    let Some(services) = services(depot, res) else {
        return;
    };

    let entries: Vec<(String, String)> = body
        .contacts
        .into_iter()
        .map(|c| (c.nombre, c.telefono))
        .collect();

    match services.contacts.sync(user.id, &entries).await {
        Ok(contacts) => res.render(Json(SyncResponse {
            synced: contacts.len(),
            message: format!("{} contactos sincronizados", contacts.len()),
            contacts,
        })),
        Err(e) => render_service_error(res, &e),
    }
}

/// ## Summary
/// GET /contacts/{id}
#[handler]
async fn get_contact(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let Some(user) = require_user(depot, res) else {
        return;
    };
    let Some(id) = path_id(req, res, "id") else {
        return;
    };
    let Some(services) = services(depot, res) else {
        return;
    };

    match services.contacts.get(user.id, id).await {
        Ok(contact) => res.render(Json(contact)),
        Err(e) => render_service_error(res, &e),
    }
}

/// ## Summary
/// PUT /contacts/{id} - Changes name and/or phone
#[handler]
async fn update_contact(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let Some(user) = require_user(depot, res) else {
        return;
    };
    let Some(id) = path_id(req, res, "id") else {
        return;
    };
    let Some(body) = parse_body::<ContactUpdateRequest>(req, res).await else {
        return;
    };
    let Some(services) = services(depot, res) else {
        return;
    };

    let patch = ContactPatch {
        nombre: body.nombre,
        telefono: body.telefono,
    };
    match services.contacts.update(user.id, id, patch).await {
        Ok(contact) => res.render(Json(contact)),
        Err(e) => render_service_error(res, &e),
    }
}

/// ## Summary
/// DELETE /contacts/{id} - Removes a contact and returns it
#[handler]
async fn delete_contact(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let Some(user) = require_user(depot, res) else {
        return;
    };
    let Some(id) = path_id(req, res, "id") else {
        return;
    };
    let Some(services) = services(depot, res) else {
        return;
    };

    match services.contacts.delete(user.id, id).await {
        Ok(contact) => res.render(Json(contact)),
        Err(e) => render_service_error(res, &e),
    }
}

/// ## Summary
/// POST /contacts/{id}/set-primary - Moves a contact to the front
#[handler]
async fn set_primary(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let Some(user) = require_user(depot, res) else {
        return;
    };
    let Some(id) = path_id(req, res, "id") else {
        return;
    };
    let Some(services) = services(depot, res) else {
        return;
    };

    match services.contacts.set_primary(user.id, id).await {
        Ok(contact) => res.render(Json(contact)),
        Err(e) => render_service_error(res, &e),
    }
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path(CONTACTS_ROUTE_COMPONENT)
        .get(list_contacts)
        .post(create_contact)
        .push(Router::with_path("sync").post(sync_contacts))
        .push(
            Router::with_path("{id}")
                .get(get_contact)
                .put(update_contact)
                .delete(delete_contact)
                .push(Router::with_path("set-primary").post(set_primary)),
        )
}
