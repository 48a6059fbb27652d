//! Shared building blocks for the Acompañar backend: configuration, errors,
//! route constants, time source and value types.

pub mod clock;
pub mod config;
pub mod constants;
pub mod error;
pub mod types;
pub mod util;
