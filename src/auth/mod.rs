//! Authentication module for MicroLend
//!
//! Provides email/password authentication with bcrypt hashing and
//! JWT token issuance and validation.

mod jwt;
mod service;

pub use jwt::{generate_token, verify_token, Claims, JwtError};
pub use service::AuthService;
