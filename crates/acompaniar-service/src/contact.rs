//! Contact management on top of a [`ContactStore`].

use std::sync::Arc;

use serde::Serialize;

use acompaniar_core::constants::CONTACT_NAME_MAX_CHARS;
use acompaniar_core::util::phone::PhoneRules;
use acompaniar_db::model::contact::Contact;

use crate::error::{ServiceError, ServiceResult};
use crate::store::{ContactDraft, ContactStore};

/// A contact as exposed by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactView {
    pub id: uuid::Uuid,
    pub nombre: String,
    pub telefono: String,
    pub is_primary: bool,
}

impl From<Contact> for ContactView {
    fn from(contact: Contact) -> Self {
        let is_primary = contact.is_primary();
        Self {
            id: contact.id,
            nombre: contact.name,
            telefono: contact.phone,
            is_primary,
        }
    }
}

/// Partial update. `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct ContactPatch {
    pub nombre: Option<String>,
    pub telefono: Option<String>,
}

/// Validates and normalizes contact input, and enforces ownership.
pub struct ContactService {
    store: Arc<dyn ContactStore>,
    phone_rules: PhoneRules,
    max_contacts: usize,
}

impl ContactService {
    #[must_use]
    pub fn new(store: Arc<dyn ContactStore>, phone_rules: PhoneRules, max_contacts: usize) -> Self {
        Self {
            store,
            phone_rules,
            max_contacts,
        }
    }

    #[must_use]
    pub const fn max_contacts(&self) -> usize {
        self.max_contacts
    }

    /// ## Summary
    /// Trims the name and normalizes the phone for storage.
    ///
    /// ## Errors
    /// Returns `ValidationError` for an empty or too long name, and the phone
    /// normalization error for unusable numbers.
    pub fn draft(&self, name: &str, phone: &str) -> ServiceResult<ContactDraft> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::ValidationError(
                "El nombre del contacto es obligatorio".to_string(),
            ));
        }
        if name.chars().count() > CONTACT_NAME_MAX_CHARS {
            return Err(ServiceError::ValidationError(format!(
                "El nombre no puede superar {CONTACT_NAME_MAX_CHARS} caracteres"
            )));
        }

        Ok(ContactDraft {
            name: name.to_string(),
            phone: self.phone_rules.normalize_for_storage(phone)?,
        })
    }

    /// ## Summary
    /// Loads a contact and checks it belongs to `user_id`.
    ///
    /// ## Errors
    /// `NotFound` if it does not exist, `Forbidden` if someone else owns it.
    pub async fn owned(&self, user_id: uuid::Uuid, id: uuid::Uuid) -> ServiceResult<Contact> {
        let contact = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Contacto no encontrado".to_string()))?;

        if contact.user_id != user_id {
            tracing::warn!(%user_id, contact_id = %id, "Access to foreign contact denied");
            return Err(ServiceError::Forbidden(
                "No tienes permiso para acceder a este contacto".to_string(),
            ));
        }
        Ok(contact)
    }

    #[tracing::instrument(skip(self))]
    pub async fn list(&self, user_id: uuid::Uuid) -> ServiceResult<Vec<ContactView>> {
        Ok(self
            .store
            .list(user_id)
            .await?
            .into_iter()
            .map(ContactView::from)
            .collect())
    }

    /// ## Errors
    /// Returns `LimitExceeded` once the user has the maximum number of
    /// contacts, or a validation error.
    #[tracing::instrument(skip(self, name, phone))]
    pub async fn create(
        &self,
        user_id: uuid::Uuid,
        name: &str,
        phone: &str,
    ) -> ServiceResult<ContactView> {
        let draft = self.draft(name, phone)?;
        let contact = self.store.create(user_id, draft, self.max_contacts).await?;

        tracing::info!(contact_id = %contact.id, "Contact created");
        Ok(contact.into())
    }

    pub async fn get(&self, user_id: uuid::Uuid, id: uuid::Uuid) -> ServiceResult<ContactView> {
        Ok(self.owned(user_id, id).await?.into())
    }

    #[tracing::instrument(skip(self, patch))]
    pub async fn update(
        &self,
        user_id: uuid::Uuid,
        id: uuid::Uuid,
        patch: ContactPatch,
    ) -> ServiceResult<ContactView> {
        let current = self.owned(user_id, id).await?;
        let draft = self.draft(
            patch.nombre.as_deref().unwrap_or(&current.name),
            patch.telefono.as_deref().unwrap_or(&current.phone),
        )?;

        Ok(self.store.update(id, draft).await?.into())
    }

    /// ## Summary
    /// Deletes a contact and returns its last state. The next contact in
    /// order becomes primary if the deleted one was.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, user_id: uuid::Uuid, id: uuid::Uuid) -> ServiceResult<ContactView> {
        let contact = self.owned(user_id, id).await?;
        self.store.delete(id).await?;

        tracing::info!(contact_id = %id, "Contact deleted");
        Ok(contact.into())
    }

    #[tracing::instrument(skip(self))]
    pub async fn set_primary(
        &self,
        user_id: uuid::Uuid,
        id: uuid::Uuid,
    ) -> ServiceResult<ContactView> {
        self.owned(user_id, id).await?;

        self.store
            .set_primary(user_id, id)
            .await?
            .into_iter()
            .find(|c| c.id == id)
            .map(ContactView::from)
            .ok_or(ServiceError::InvariantViolation(
                "contact missing after reordering",
            ))
    }

    /// ## Summary
    /// Replaces the user's list. The first entry becomes primary.
    ///
    /// ## Errors
    /// Every entry is validated before anything is written. More entries than
    /// allowed fail with `LimitExceeded` and leave the list unchanged.
    #[tracing::instrument(skip(self, entries), fields(entries = entries.len()))]
    pub async fn sync(
        &self,
        user_id: uuid::Uuid,
        entries: &[(String, String)],
    ) -> ServiceResult<Vec<ContactView>> {
        if entries.len() > self.max_contacts {
            return Err(ServiceError::LimitExceeded {
                max: self.max_contacts,
            });
        }

        let drafts = entries
            .iter()
            .map(|(name, phone)| self.draft(name, phone))
            .collect::<ServiceResult<Vec<_>>>()?;

        let stored = self
            .store
            .replace_all(user_id, drafts, self.max_contacts)
            .await?;

        tracing::info!(synced = stored.len(), "Contacts synchronized");
        Ok(stored.into_iter().map(ContactView::from).collect())
    }
}

impl std::fmt::Debug for ContactService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContactService")
            .field("max_contacts", &self.max_contacts)
            .finish_non_exhaustive()
    }
}
