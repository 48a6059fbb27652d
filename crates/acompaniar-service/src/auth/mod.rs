//! Authentication.
//!
//! - `authenticate`: bearer token to active user
//! - `password`: Argon2 hashing and verification
//! - `token`: signed session tokens

pub mod authenticate;
pub mod password;
pub mod token;

pub use authenticate::{authenticate, bearer_token};
pub use token::{Claims, TokenIssuer};
