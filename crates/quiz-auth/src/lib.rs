//! Quiz App Authentication and Access Control
//!
//! This crate verifies credentials, issues HMAC-signed JWTs and gates
//! protected requests by validating those tokens.
//!
//! - [`Authenticator`] turns a username/password pair into a signed token.
//! - [`TokenGate`] admits or rejects a request based on its token and can
//!   resolve the user the token names.

pub mod authenticator;
pub mod error;
pub mod gate;
pub mod jwt;
pub mod middleware;
pub mod password;

#[cfg(test)]
mod testing;

pub use authenticator::{AuthenticatedUser, Authenticator, validate_credentials};
pub use error::{AuthError, AuthErrorKind, StatusClass};
pub use gate::TokenGate;
pub use jwt::{Claims, DEFAULT_TOKEN_TTL_MINUTES, JwtManager};
pub use middleware::{AuthUser, require_token};
pub use password::{hash_password, verify_password};
