//! Query functions grouped by table. Each takes an open connection so callers
//! can compose them inside a transaction.

pub mod alert_record;
pub mod contact;
pub mod help_center;
pub mod location;
pub mod user;
