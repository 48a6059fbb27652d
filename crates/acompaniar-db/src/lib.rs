//! PostgreSQL persistence for users, contacts, alert audit records and the
//! help-center directory.

pub mod db;
pub mod error;
pub mod model;
