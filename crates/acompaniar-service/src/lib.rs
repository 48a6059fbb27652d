//! Emergency-alert subsystem: contact management, audit ledger, SMS
//! notification, rate limiting and the dispatcher that ties them together.

pub mod account;
pub mod alert;
pub mod auth;
pub mod contact;
pub mod error;
pub mod help_center;
pub mod notify;
pub mod rate_limit;
pub mod services;
pub mod store;
