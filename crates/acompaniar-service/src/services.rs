//! Wiring of every service from configuration and stores.

use std::sync::Arc;

use acompaniar_core::clock::{Clock, SystemClock};
use acompaniar_core::config::Settings;
use acompaniar_core::util::phone::PhoneRules;
use acompaniar_db::db::DbProvider;

use crate::account::AccountService;
use crate::alert::AlertDispatcher;
use crate::auth::TokenIssuer;
use crate::contact::ContactService;
use crate::error::ServiceResult;
use crate::notify::{NotificationGateway, SmsProvider};
use crate::rate_limit::RateLimiter;
use crate::store::pg::PgStore;
use crate::store::{AuditLedger, ContactStore, HelpCenterDirectory, UserStore};

/// Backing stores. One type may implement several of them.
#[derive(Debug, Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub contacts: Arc<dyn ContactStore>,
    pub ledger: Arc<dyn AuditLedger>,
    pub help_centers: Arc<dyn HelpCenterDirectory>,
}

impl Stores {
    /// Uses one value for every store.
    #[must_use]
    pub fn shared<S>(store: S) -> Self
    where
        S: UserStore + ContactStore + AuditLedger + HelpCenterDirectory + 'static,
    {
        let store = Arc::new(store);
        Self {
            users: store.clone(),
            contacts: store.clone(),
            ledger: store.clone(),
            help_centers: store,
        }
    }
}

/// Everything request handlers need, shared across requests.
#[derive(Debug, Clone)]
pub struct Services {
    pub accounts: Arc<AccountService>,
    pub contacts: Arc<ContactService>,
    pub alerts: Arc<AlertDispatcher>,
    pub help_centers: Arc<dyn HelpCenterDirectory>,
    pub users: Arc<dyn UserStore>,
    pub tokens: Arc<TokenIssuer>,
}

/// How SMS are delivered.
#[derive(Debug)]
pub enum SmsBackend {
    /// Build the provider from `sms` settings; disabled without credentials.
    FromConfig,
    /// Use this provider regardless of settings.
    Provider(Arc<dyn SmsProvider>),
    Disabled,
}

impl Services {
    /// ## Summary
    /// Builds every service over the given stores.
    ///
    /// ## Errors
    /// Returns `InvalidConfiguration` for an unusable token secret or if the
    /// SMS client cannot be built.
    pub fn new(
        settings: &Settings,
        stores: Stores,
        sms: SmsBackend,
        clock: Arc<dyn Clock>,
    ) -> ServiceResult<Self> {
        let phone_rules = PhoneRules::from(&settings.phone);
        let tokens = Arc::new(TokenIssuer::new(&settings.auth, Arc::clone(&clock))?);

        let gateway = match sms {
            SmsBackend::FromConfig => {
                NotificationGateway::from_config(&settings.sms, &settings.phone, Arc::clone(&clock))?
            }
            SmsBackend::Provider(provider) => NotificationGateway::new(
                Some(provider),
                &settings.sms,
                phone_rules.clone(),
                Arc::clone(&clock),
            ),
            SmsBackend::Disabled => NotificationGateway::new(
                None,
                &settings.sms,
                phone_rules.clone(),
                Arc::clone(&clock),
            ),
        };

        let accounts = AccountService::new(
            Arc::clone(&stores.users),
            Arc::clone(&tokens),
            RateLimiter::from_config(&settings.login, Arc::clone(&clock)),
        );
        let contacts = ContactService::new(
            Arc::clone(&stores.contacts),
            phone_rules.clone(),
            settings.emergency.max_contacts,
        );
        let alerts = AlertDispatcher::new(
            Arc::clone(&stores.contacts),
            Arc::clone(&stores.ledger),
            Arc::new(gateway),
            phone_rules,
            Arc::clone(&clock),
            settings.emergency.clone(),
            RateLimiter::from_config(&settings.test_sms, clock),
        );

        Ok(Self {
            accounts: Arc::new(accounts),
            contacts: Arc::new(contacts),
            alerts: Arc::new(alerts),
            help_centers: stores.help_centers,
            users: stores.users,
            tokens,
        })
    }

    /// ## Summary
    /// Production wiring: PostgreSQL stores, SMS from settings, wall clock.
    ///
    /// ## Errors
    /// See [`Services::new`].
    pub fn postgres(settings: &Settings, provider: Arc<dyn DbProvider>) -> ServiceResult<Self> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let stores = Stores::shared(PgStore::new(provider, Arc::clone(&clock)));

        Self::new(settings, stores, SmsBackend::FromConfig, clock)
    }
}
