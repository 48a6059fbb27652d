pub mod alert;
pub mod contact;
pub mod help_center;
pub mod location;
pub mod user;
