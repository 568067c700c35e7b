//! Authentication middleware for Axum

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::error::AuthError;
use crate::gate::TokenGate;
use crate::jwt::Claims;

/// Authenticated caller as named by a validated token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
}

impl AuthUser {
    /// Create from JWT claims
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            id: claims.user_id,
            username: claims.username.clone(),
        }
    }
}

/// Token gate middleware
///
/// Short-circuits the request unless it carries a valid token. Admitted
/// requests get an [`AuthUser`] in their extensions.
pub async fn require_token(
    State(gate): State<Arc<TokenGate>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let claims = gate.is_authenticated(request.headers())?;
    let user = AuthUser::from_claims(&claims);

    debug!("Authenticated user: {} ({})", user.username, user.id);

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}
