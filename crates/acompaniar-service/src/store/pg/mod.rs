//! PostgreSQL-backed stores.

use std::sync::Arc;

use acompaniar_core::clock::Clock;
use acompaniar_db::db::{DbProvider, connection::DbConnection};

use crate::error::ServiceResult;

mod contact;
mod help_center;
mod ledger;
mod user;

/// Implements every store trait on top of a connection provider.
#[derive(Clone)]
pub struct PgStore {
    provider: Arc<dyn DbProvider>,
    clock: Arc<dyn Clock>,
}

impl PgStore {
    #[must_use]
    pub fn new(provider: Arc<dyn DbProvider>, clock: Arc<dyn Clock>) -> Self {
        Self { provider, clock }
    }

    async fn conn(&self) -> ServiceResult<DbConnection<'_>> {
        Ok(self.provider.get_connection().await?)
    }
}

impl std::fmt::Debug for PgStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgStore").finish_non_exhaustive()
    }
}
