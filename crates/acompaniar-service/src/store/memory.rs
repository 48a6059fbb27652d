//! In-memory stores and a scripted SMS provider.
//!
//! `MemoryStore` keeps every table behind one mutex so each operation is
//! atomic, matching the transactional behavior of the PostgreSQL stores.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use salvo::async_trait;

use acompaniar_core::clock::Clock;
use acompaniar_db::db::enums::AlertState;
use acompaniar_db::model::{
    alert::AlertRecord, contact::Contact, location::Location, user::User,
};

use super::{
    AccountChanges, AlertDraft, AuditLedger, ContactDraft, ContactStore, CreatedAlert,
    HelpCenterDirectory, HistoryEntry, NewAccount, UserStore,
};
use crate::error::{ServiceError, ServiceResult};
use crate::help_center::HelpCenterView;
use crate::notify::provider::{ProviderError, ProviderReceipt, SmsProvider};

#[derive(Debug, Default)]
struct Tables {
    users: Vec<User>,
    contacts: Vec<Contact>,
    locations: Vec<Location>,
    records: Vec<AlertRecord>,
    centers: Vec<HelpCenterView>,
    /// Index of the audit record whose write fails, if any.
    fail_record_at: Option<usize>,
    fail_mark_sent: bool,
}

impl Tables {
    fn contacts_of(&self, user_id: uuid::Uuid) -> Vec<Contact> {
        let mut owned: Vec<Contact> = self
            .contacts
            .iter()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect();
        owned.sort_by_key(|c| c.position);
        owned
    }

    fn renumber(&mut self, user_id: uuid::Uuid, ordered_ids: &[uuid::Uuid]) {
        for contact in self.contacts.iter_mut().filter(|c| c.user_id == user_id) {
            if let Some(index) = ordered_ids.iter().position(|id| *id == contact.id) {
                contact.position = i32::try_from(index).unwrap_or(i32::MAX);
            }
        }
    }

    fn email_taken(&self, email: &str, except: Option<uuid::Uuid>) -> bool {
        self.users
            .iter()
            .any(|u| u.email.as_deref() == Some(email) && Some(u.id) != except)
    }
}

/// All store traits over shared in-process tables.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    clock: Arc<dyn Clock>,
}

impl MemoryStore {
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            tables: Arc::new(Mutex::new(Tables::default())),
            clock,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Makes the audit write of the record at `index` (0-based, within one
    /// alert) fail. `None` restores normal behavior.
    pub fn fail_audit_record_at(&self, index: Option<usize>) {
        self.lock().fail_record_at = index;
    }

    /// Makes every `mark_sent` call fail while set.
    pub fn fail_mark_sent(&self, fail: bool) {
        self.lock().fail_mark_sent = fail;
    }

    #[must_use]
    pub fn records_for_user(&self, user_id: uuid::Uuid) -> Vec<AlertRecord> {
        self.lock()
            .records
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn location_count(&self) -> usize {
        self.lock().locations.len()
    }

    pub fn insert_help_center(&self, center: HelpCenterView) {
        self.lock().centers.push(center);
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create(&self, account: NewAccount) -> ServiceResult<User> {
        let now = self.clock.now();
        let mut tables = self.lock();

        if let Some(email) = &account.email
            && tables.email_taken(email, None)
        {
            return Err(ServiceError::Conflict("El email ya está registrado".to_string()));
        }

        let user = User {
            id: uuid::Uuid::now_v7(),
            email: account.email,
            full_name: account.full_name,
            password_hash: account.password_hash,
            is_active: true,
            is_anonymous: account.is_anonymous,
            created_at: now,
            updated_at: now,
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: uuid::Uuid) -> ServiceResult<Option<User>> {
        Ok(self.lock().users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> ServiceResult<Option<User>> {
        Ok(self
            .lock()
            .users
            .iter()
            .find(|u| u.email.as_deref() == Some(email))
            .cloned())
    }

    async fn update(&self, id: uuid::Uuid, changes: AccountChanges) -> ServiceResult<User> {
        let now = self.clock.now();
        let mut tables = self.lock();

        if let Some(email) = &changes.email
            && tables.email_taken(email, Some(id))
        {
            return Err(ServiceError::Conflict("El email ya está registrado".to_string()));
        }

        let user = tables
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| ServiceError::NotFound("Usuario no encontrado".to_string()))?;

        if let Some(email) = changes.email {
            user.email = Some(email);
        }
        if let Some(full_name) = changes.full_name {
            user.full_name = Some(full_name);
        }
        if let Some(password_hash) = changes.password_hash {
            user.password_hash = Some(password_hash);
        }
        if let Some(is_active) = changes.is_active {
            user.is_active = is_active;
        }
        if let Some(is_anonymous) = changes.is_anonymous {
            user.is_anonymous = is_anonymous;
        }
        user.updated_at = now;

        Ok(user.clone())
    }
}

#[async_trait]
impl ContactStore for MemoryStore {
    async fn list(&self, user_id: uuid::Uuid) -> ServiceResult<Vec<Contact>> {
        Ok(self.lock().contacts_of(user_id))
    }

    async fn get(&self, id: uuid::Uuid) -> ServiceResult<Option<Contact>> {
        Ok(self.lock().contacts.iter().find(|c| c.id == id).cloned())
    }

    async fn create(
        &self,
        user_id: uuid::Uuid,
        draft: ContactDraft,
        max: usize,
    ) -> ServiceResult<Contact> {
        let now = self.clock.now();
        let mut tables = self.lock();

        let count = tables.contacts_of(user_id).len();
        if count >= max {
            return Err(ServiceError::LimitExceeded { max });
        }

        let contact = Contact {
            id: uuid::Uuid::now_v7(),
            user_id,
            name: draft.name,
            phone: draft.phone,
            position: i32::try_from(count)
                .map_err(|_err| ServiceError::InvariantViolation("contact position overflow"))?,
            created_at: now,
        };
        tables.contacts.push(contact.clone());
        Ok(contact)
    }

    async fn update(&self, id: uuid::Uuid, draft: ContactDraft) -> ServiceResult<Contact> {
        let mut tables = self.lock();
        let contact = tables
            .contacts
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| ServiceError::NotFound("Contacto no encontrado".to_string()))?;

        contact.name = draft.name;
        contact.phone = draft.phone;
        Ok(contact.clone())
    }

    async fn delete(&self, id: uuid::Uuid) -> ServiceResult<()> {
        let mut tables = self.lock();
        let index = tables
            .contacts
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| ServiceError::NotFound("Contacto no encontrado".to_string()))?;

        let removed = tables.contacts.remove(index);
        for record in tables.records.iter_mut().filter(|r| r.contact_id == Some(id)) {
            record.contact_id = None;
        }

        let remaining: Vec<uuid::Uuid> = tables
            .contacts_of(removed.user_id)
            .iter()
            .map(|c| c.id)
            .collect();
        tables.renumber(removed.user_id, &remaining);
        Ok(())
    }

    async fn set_primary(
        &self,
        user_id: uuid::Uuid,
        id: uuid::Uuid,
    ) -> ServiceResult<Vec<Contact>> {
        let mut tables = self.lock();
        let mut ordered: Vec<uuid::Uuid> = tables.contacts_of(user_id).iter().map(|c| c.id).collect();
        let index = ordered
            .iter()
            .position(|c| *c == id)
            .ok_or_else(|| ServiceError::NotFound("Contacto no encontrado".to_string()))?;

        let chosen = ordered.remove(index);
        ordered.insert(0, chosen);
        tables.renumber(user_id, &ordered);
        Ok(tables.contacts_of(user_id))
    }

    async fn replace_all(
        &self,
        user_id: uuid::Uuid,
        drafts: Vec<ContactDraft>,
        max: usize,
    ) -> ServiceResult<Vec<Contact>> {
        if drafts.len() > max {
            return Err(ServiceError::LimitExceeded { max });
        }

        let now = self.clock.now();
        let mut tables = self.lock();

        let removed: Vec<uuid::Uuid> = tables.contacts_of(user_id).iter().map(|c| c.id).collect();
        tables.contacts.retain(|c| c.user_id != user_id);
        for record in tables
            .records
            .iter_mut()
            .filter(|r| r.contact_id.is_some_and(|id| removed.contains(&id)))
        {
            record.contact_id = None;
        }

        let mut stored = Vec::with_capacity(drafts.len());
        for (index, draft) in drafts.into_iter().enumerate() {
            let contact = Contact {
                id: uuid::Uuid::now_v7(),
                user_id,
                name: draft.name,
                phone: draft.phone,
                position: i32::try_from(index).unwrap_or(i32::MAX),
                created_at: now,
            };
            tables.contacts.push(contact.clone());
            stored.push(contact);
        }
        Ok(stored)
    }
}

#[async_trait]
impl AuditLedger for MemoryStore {
    async fn create_alert_records(&self, draft: AlertDraft) -> ServiceResult<CreatedAlert> {
        let mut tables = self.lock();

        let contacts: Vec<Contact> = tables
            .contacts_of(draft.user_id)
            .into_iter()
            .filter(|c| {
                draft
                    .contact_ids
                    .as_ref()
                    .is_none_or(|ids| ids.contains(&c.id))
            })
            .collect();
        if contacts.is_empty() {
            return Err(ServiceError::NoRecipients);
        }

        // Rows are staged and only committed once every write has succeeded.
        let location = draft.location.as_ref().map(|point| Location {
            id: uuid::Uuid::now_v7(),
            address: point.address.clone(),
            latitude: point.latitude,
            longitude: point.longitude,
            created_at: draft.created_at,
        });
        let location_id = location.as_ref().map(|l| l.id);

        let mut staged = Vec::with_capacity(contacts.len());
        for (index, contact) in contacts.iter().enumerate() {
            if tables.fail_record_at == Some(index) {
                return Err(ServiceError::Storage(format!(
                    "write of audit record {index} failed"
                )));
            }
            staged.push(AlertRecord {
                id: uuid::Uuid::now_v7(),
                alert_id: draft.alert_id,
                user_id: draft.user_id,
                contact_id: Some(contact.id),
                contact_name: contact.name.clone(),
                contact_phone: contact.phone.clone(),
                location_id,
                message: draft.message.clone(),
                state_code: AlertState::Pending,
                created_at: draft.created_at,
                updated_at: draft.created_at,
            });
        }

        if let Some(location) = location {
            tables.locations.push(location);
        }
        tables.records.extend(staged.iter().cloned());

        Ok(CreatedAlert {
            alert_id: draft.alert_id,
            location_id,
            records: staged,
        })
    }

    async fn mark_sent(&self, record_ids: &[uuid::Uuid]) -> ServiceResult<usize> {
        let now = self.clock.now();
        let mut tables = self.lock();
        if tables.fail_mark_sent {
            return Err(ServiceError::Storage("state transition failed".to_string()));
        }

        let mut changed = 0;
        for record in tables
            .records
            .iter_mut()
            .filter(|r| record_ids.contains(&r.id) && r.state_code == AlertState::Pending)
        {
            record.state_code = AlertState::Sent;
            record.updated_at = now;
            changed += 1;
        }
        Ok(changed)
    }

    async fn alert_times_since(
        &self,
        user_id: uuid::Uuid,
        since: DateTime<Utc>,
    ) -> ServiceResult<Vec<DateTime<Utc>>> {
        let tables = self.lock();

        let mut per_alert: HashMap<uuid::Uuid, DateTime<Utc>> = HashMap::new();
        for record in tables
            .records
            .iter()
            .filter(|r| r.user_id == user_id && r.created_at >= since)
        {
            let entry = per_alert.entry(record.alert_id).or_insert(record.created_at);
            *entry = (*entry).max(record.created_at);
        }

        let mut times: Vec<DateTime<Utc>> = per_alert.into_values().collect();
        times.sort_unstable_by(|a, b| b.cmp(a));
        Ok(times)
    }

    async fn history(&self, user_id: uuid::Uuid, limit: i64) -> ServiceResult<Vec<HistoryEntry>> {
        let tables = self.lock();

        let mut records: Vec<&AlertRecord> =
            tables.records.iter().filter(|r| r.user_id == user_id).collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));

        Ok(records
            .into_iter()
            .take(usize::try_from(limit).unwrap_or(0))
            .map(|record| HistoryEntry {
                record: record.clone(),
                location: record
                    .location_id
                    .and_then(|id| tables.locations.iter().find(|l| l.id == id).cloned()),
            })
            .collect())
    }
}

#[async_trait]
impl HelpCenterDirectory for MemoryStore {
    async fn list(&self, offset: i64, limit: i64) -> ServiceResult<(Vec<HelpCenterView>, i64)> {
        let tables = self.lock();

        let mut centers = tables.centers.clone();
        centers.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        let total = i64::try_from(centers.len()).unwrap_or(i64::MAX);

        let page = centers
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(0))
            .take(usize::try_from(limit).unwrap_or(0))
            .collect();
        Ok((page, total))
    }

    async fn get(&self, id: uuid::Uuid) -> ServiceResult<Option<HelpCenterView>> {
        Ok(self.lock().centers.iter().find(|c| c.id == id).cloned())
    }
}

/// A message handed to [`ScriptedSmsProvider`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub to: String,
    pub body: String,
}

#[derive(Debug, Default)]
struct Script {
    failures: HashMap<String, ProviderError>,
    fail_all: Option<ProviderError>,
    delay: Option<Duration>,
    accepted: Vec<SentMessage>,
    attempts: usize,
}

/// SMS provider whose outcomes are set per destination number.
#[derive(Debug, Default)]
pub struct ScriptedSmsProvider {
    script: Mutex<Script>,
}

impl ScriptedSmsProvider {
    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Rejects every message to `to` (in dispatch form, e.g. `+54381...`).
    pub fn fail_number(&self, to: &str, error: ProviderError) {
        self.lock().failures.insert(to.to_string(), error);
    }

    pub fn fail_all(&self, error: Option<ProviderError>) {
        self.lock().fail_all = error;
    }

    /// Delays every send by `delay` before answering.
    pub fn set_delay(&self, delay: Duration) {
        self.lock().delay = Some(delay);
    }

    /// Messages the provider accepted, in order.
    #[must_use]
    pub fn sent(&self) -> Vec<SentMessage> {
        self.lock().accepted.clone()
    }

    #[must_use]
    pub fn attempts(&self) -> usize {
        self.lock().attempts
    }
}

#[async_trait]
impl SmsProvider for ScriptedSmsProvider {
    async fn send(&self, to: &str, body: &str) -> Result<ProviderReceipt, ProviderError> {
        let delay = {
            let mut script = self.lock();
            script.attempts += 1;
            script.delay
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut script = self.lock();
        if let Some(error) = script.fail_all.clone().or_else(|| script.failures.get(to).cloned()) {
            return Err(error);
        }

        script.accepted.push(SentMessage {
            to: to.to_string(),
            body: body.to_string(),
        });
        Ok(ProviderReceipt {
            sid: format!("SM{:032}", script.accepted.len()),
            status: "queued".to_string(),
        })
    }
}
