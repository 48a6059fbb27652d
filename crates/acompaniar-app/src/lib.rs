//! HTTP surface of the Acompañar emergency backend.

pub mod app;
pub mod error;
pub mod middleware;
pub mod services_handler;
