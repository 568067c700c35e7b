//! Authentication error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use quiz_db::DbError;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error};

/// Machine-checkable category of an [`AuthError`]
///
/// Callers branch on the kind, never on the formatted message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthErrorKind {
    Validation,
    InvalidCredentials,
    NotFound,
    TokenMissing,
    Malformed,
    ExpiredOrNotYetValid,
    SecretUnavailable,
    SigningKeyUnavailable,
    TokenCreationFailed,
    ClaimsUnavailable,
    Storage,
    PasswordHash,
}

impl AuthErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthErrorKind::Validation => "validation",
            AuthErrorKind::InvalidCredentials => "invalid_credentials",
            AuthErrorKind::NotFound => "not_found",
            AuthErrorKind::TokenMissing => "token_missing",
            AuthErrorKind::Malformed => "malformed",
            AuthErrorKind::ExpiredOrNotYetValid => "expired_or_not_yet_valid",
            AuthErrorKind::SecretUnavailable => "secret_unavailable",
            AuthErrorKind::SigningKeyUnavailable => "signing_key_unavailable",
            AuthErrorKind::TokenCreationFailed => "token_creation_failed",
            AuthErrorKind::ClaimsUnavailable => "claims_unavailable",
            AuthErrorKind::Storage => "storage",
            AuthErrorKind::PasswordHash => "password_hash",
        }
    }
}

/// Externally visible outcome class of a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// The caller sent no input, or input that could not be decoded
    ClientFormat,
    /// The caller's credentials or token were rejected
    Forbidden,
    /// A server-side fault; details stay in the logs
    Internal,
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("User {0} no longer exists")]
    IdentityGone(i64),

    #[error("Missing authorization token")]
    TokenMissing,

    #[error("Malformed token: {0}")]
    Malformed(String),

    #[error("Token expired or not yet valid: {0}")]
    ExpiredOrNotYetValid(String),

    #[error("Token secret is not configured")]
    SecretUnavailable,

    #[error("Signing key is not configured")]
    SigningKeyUnavailable,

    #[error("Token creation failed: {0}")]
    TokenCreationFailed(#[source] jsonwebtoken::errors::Error),

    #[error("Token lifetime rejected: {0}")]
    TokenLifetime(String),

    #[error("Token carries no user ID")]
    ClaimsUnavailable,

    #[error("Storage error: {0}")]
    Storage(#[from] DbError),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),
}

impl AuthError {
    pub fn kind(&self) -> AuthErrorKind {
        match self {
            AuthError::Validation(_) => AuthErrorKind::Validation,
            AuthError::InvalidCredentials => AuthErrorKind::InvalidCredentials,
            AuthError::UserNotFound(_) | AuthError::IdentityGone(_) => AuthErrorKind::NotFound,
            AuthError::TokenMissing => AuthErrorKind::TokenMissing,
            AuthError::Malformed(_) => AuthErrorKind::Malformed,
            AuthError::ExpiredOrNotYetValid(_) => AuthErrorKind::ExpiredOrNotYetValid,
            AuthError::SecretUnavailable => AuthErrorKind::SecretUnavailable,
            AuthError::SigningKeyUnavailable => AuthErrorKind::SigningKeyUnavailable,
            AuthError::TokenCreationFailed(_) | AuthError::TokenLifetime(_) => {
                AuthErrorKind::TokenCreationFailed
            }
            AuthError::ClaimsUnavailable => AuthErrorKind::ClaimsUnavailable,
            AuthError::Storage(_) => AuthErrorKind::Storage,
            AuthError::PasswordHash(_) => AuthErrorKind::PasswordHash,
        }
    }

    /// Map the failure onto the status class shown to the caller
    ///
    /// An unknown username during login is indistinguishable from a wrong
    /// password. A missing user behind an already-verified token is a
    /// server-side anomaly.
    pub fn status_class(&self) -> StatusClass {
        match self {
            AuthError::Validation(_) | AuthError::TokenMissing | AuthError::Malformed(_) => {
                StatusClass::ClientFormat
            }
            AuthError::InvalidCredentials
            | AuthError::UserNotFound(_)
            | AuthError::ExpiredOrNotYetValid(_) => StatusClass::Forbidden,
            AuthError::IdentityGone(_)
            | AuthError::SecretUnavailable
            | AuthError::SigningKeyUnavailable
            | AuthError::TokenCreationFailed(_)
            | AuthError::TokenLifetime(_)
            | AuthError::ClaimsUnavailable
            | AuthError::Storage(_)
            | AuthError::PasswordHash(_) => StatusClass::Internal,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match (self.status_class(), &self) {
            (StatusClass::ClientFormat, AuthError::Validation(msg)) => {
                (StatusCode::BAD_REQUEST, msg.as_str())
            }
            (StatusClass::ClientFormat, AuthError::TokenMissing) => {
                (StatusCode::BAD_REQUEST, "Missing authorization token")
            }
            (StatusClass::ClientFormat, _) => (StatusCode::BAD_REQUEST, "Malformed token"),
            (StatusClass::Forbidden, AuthError::ExpiredOrNotYetValid(_)) => {
                (StatusCode::FORBIDDEN, "Token expired or not yet valid")
            }
            (StatusClass::Forbidden, _) => (StatusCode::FORBIDDEN, "Unable to authenticate user"),
            (StatusClass::Internal, _) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        if status.is_server_error() {
            error!(kind = self.kind().as_str(), "Authentication failure: {}", self);
        } else {
            debug!(kind = self.kind().as_str(), "Request rejected: {}", self);
        }

        let body = axum::Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
