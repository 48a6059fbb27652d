//! Persistence seams used by the services.
//!
//! Each trait has a PostgreSQL implementation in [`pg`]. The in-memory
//! implementation in `memory` backs unit and HTTP tests.

use chrono::{DateTime, Utc};
use salvo::async_trait;

use acompaniar_core::types::GeoPoint;
use acompaniar_db::model::{alert::AlertRecord, contact::Contact, location::Location, user::User};

use crate::error::ServiceResult;
use crate::help_center::HelpCenterView;

#[cfg(any(test, feature = "testing"))]
pub mod memory;
pub mod pg;

/// Fields for a new account.
#[derive(Debug, Clone, Default)]
pub struct NewAccount {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub password_hash: Option<String>,
    pub is_anonymous: bool,
}

/// Account changes. `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct AccountChanges {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub password_hash: Option<String>,
    pub is_active: Option<bool>,
    pub is_anonymous: Option<bool>,
}

/// A validated, normalized contact ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactDraft {
    pub name: String,
    pub phone: String,
}

/// Everything needed to write the audit trail of one alert.
#[derive(Debug, Clone)]
pub struct AlertDraft {
    pub alert_id: uuid::Uuid,
    pub user_id: uuid::Uuid,
    /// `None` targets every contact the user owns. Ids the user does not own
    /// are dropped.
    pub contact_ids: Option<Vec<uuid::Uuid>>,
    pub location: Option<GeoPoint>,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Records written for one alert, in contact position order.
#[derive(Debug, Clone)]
pub struct CreatedAlert {
    pub alert_id: uuid::Uuid,
    pub location_id: Option<uuid::Uuid>,
    pub records: Vec<AlertRecord>,
}

#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub record: AlertRecord,
    pub location: Option<Location>,
}

#[async_trait]
pub trait UserStore: Send + Sync + std::fmt::Debug {
    /// ## Errors
    /// Returns `Conflict` if the email is already registered.
    async fn create(&self, account: NewAccount) -> ServiceResult<User>;

    async fn find_by_id(&self, id: uuid::Uuid) -> ServiceResult<Option<User>>;

    async fn find_by_email(&self, email: &str) -> ServiceResult<Option<User>>;

    /// ## Errors
    /// Returns `NotFound` if the user does not exist and `Conflict` if a new
    /// email is already taken.
    async fn update(&self, id: uuid::Uuid, changes: AccountChanges) -> ServiceResult<User>;
}

/// Ordered per-user contact lists. Position 0 is the primary contact and
/// positions are always contiguous from 0.
#[async_trait]
pub trait ContactStore: Send + Sync + std::fmt::Debug {
    async fn list(&self, user_id: uuid::Uuid) -> ServiceResult<Vec<Contact>>;

    async fn get(&self, id: uuid::Uuid) -> ServiceResult<Option<Contact>>;

    /// Appends a contact at the end of the user's list.
    ///
    /// ## Errors
    /// Returns `LimitExceeded` if the user already has `max` contacts.
    async fn create(
        &self,
        user_id: uuid::Uuid,
        draft: ContactDraft,
        max: usize,
    ) -> ServiceResult<Contact>;

    async fn update(&self, id: uuid::Uuid, draft: ContactDraft) -> ServiceResult<Contact>;

    /// Removes a contact and closes the gap in positions.
    async fn delete(&self, id: uuid::Uuid) -> ServiceResult<()>;

    /// Moves a contact to position 0 keeping the relative order of the rest.
    /// Contact ids are unchanged.
    async fn set_primary(&self, user_id: uuid::Uuid, id: uuid::Uuid)
    -> ServiceResult<Vec<Contact>>;

    /// Atomically replaces the user's whole list.
    ///
    /// ## Errors
    /// Returns `LimitExceeded` without touching the stored list if more than
    /// `max` drafts are given.
    async fn replace_all(
        &self,
        user_id: uuid::Uuid,
        drafts: Vec<ContactDraft>,
        max: usize,
    ) -> ServiceResult<Vec<Contact>>;
}

/// Durable audit trail of alerts.
#[async_trait]
pub trait AuditLedger: Send + Sync + std::fmt::Debug {
    /// Writes one location and one pending record per recipient in a single
    /// transaction.
    ///
    /// ## Errors
    /// Returns `NoRecipients` if no owned contact is targeted. Any other error
    /// means nothing was written.
    async fn create_alert_records(&self, draft: AlertDraft) -> ServiceResult<CreatedAlert>;

    /// Moves pending records to `sent`. Returns how many changed; records in
    /// any other state are skipped.
    async fn mark_sent(&self, record_ids: &[uuid::Uuid]) -> ServiceResult<usize>;

    /// One timestamp per alert created at or after `since`, newest first.
    async fn alert_times_since(
        &self,
        user_id: uuid::Uuid,
        since: DateTime<Utc>,
    ) -> ServiceResult<Vec<DateTime<Utc>>>;

    async fn history(&self, user_id: uuid::Uuid, limit: i64) -> ServiceResult<Vec<HistoryEntry>>;
}

#[async_trait]
pub trait HelpCenterDirectory: Send + Sync + std::fmt::Debug {
    /// A page of centers plus the total count.
    async fn list(&self, offset: i64, limit: i64) -> ServiceResult<(Vec<HelpCenterView>, i64)>;

    async fn get(&self, id: uuid::Uuid) -> ServiceResult<Option<HelpCenterView>>;
}
