//! Per-request token gate
//!
//! A request moves through `NoToken -> TokenPresent -> {Malformed | Parsed}
//! -> {Rejected | Admitted}`. [`TokenGate::is_authenticated`] stops at the
//! admission decision; [`TokenGate::resolve_identity`] additionally loads the
//! user the token names.

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use quiz_db::{User, UserStore};
use std::sync::Arc;
use tracing::debug;

use crate::error::AuthError;
use crate::jwt::{Claims, JwtManager};

/// Admits or rejects requests based on the token they carry
pub struct TokenGate {
    jwt: Arc<JwtManager>,
    store: Arc<dyn UserStore>,
}

impl TokenGate {
    pub fn new(jwt: Arc<JwtManager>, store: Arc<dyn UserStore>) -> Self {
        Self { jwt, store }
    }

    /// Read the raw token from the `Authorization` header
    ///
    /// The header normally holds the bare token; a `Bearer ` prefix is
    /// tolerated.
    pub fn extract_token(headers: &HeaderMap) -> Result<&str, AuthError> {
        let value = match headers.get(AUTHORIZATION) {
            Some(value) => value
                .to_str()
                .map_err(|_| AuthError::Malformed("authorization header is not ASCII".to_string()))?,
            None => return Err(AuthError::TokenMissing),
        };

        let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();
        if token.is_empty() {
            return Err(AuthError::TokenMissing);
        }
        Ok(token)
    }

    /// Verify a token's structure, signature and validity window
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        self.jwt.validate_token(token)
    }

    /// Gate decision: `Ok` admits the request
    pub fn is_authenticated(&self, headers: &HeaderMap) -> Result<Claims, AuthError> {
        let result = Self::extract_token(headers).and_then(|token| self.validate_token(token));

        if let Err(e) = &result {
            metrics::counter!("quiz_auth_gate_rejections_total", "reason" => e.kind().as_str())
                .increment(1);
        }
        result
    }

    /// Admit the request and load the user its token names
    pub async fn resolve_identity(&self, headers: &HeaderMap) -> Result<User, AuthError> {
        let claims = self.is_authenticated(headers)?;

        if claims.user_id == 0 {
            return Err(AuthError::ClaimsUnavailable);
        }

        let user = self
            .store
            .find_by_id(claims.user_id)
            .await?
            .ok_or(AuthError::IdentityGone(claims.user_id))?;

        debug!("Resolved identity: {} ({})", user.username, user.id);
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AuthErrorKind, StatusClass};
    use crate::jwt::DEFAULT_TOKEN_TTL_MINUTES;
    use crate::testing::FailingStore;
    use axum::http::HeaderValue;
    use chrono::{Duration, Utc};
    use quiz_db::{MemoryUserStore, NewUser};

    const SECRET: &str = "hello";

    fn setup(secret: Option<&str>) -> (Arc<MemoryUserStore>, TokenGate) {
        let store = Arc::new(MemoryUserStore::new());
        store
            .insert_user(NewUser {
                username: "munens".to_string(),
                password_hash: "unused".to_string(),
            })
            .unwrap();
        let jwt = Arc::new(JwtManager::new(
            secret,
            Duration::minutes(DEFAULT_TOKEN_TTL_MINUTES),
        ));
        let gate = TokenGate::new(jwt, store.clone());
        (store, gate)
    }

    fn signer() -> JwtManager {
        JwtManager::new(Some(SECRET), Duration::minutes(DEFAULT_TOKEN_TTL_MINUTES))
    }

    fn headers_with(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(token).unwrap());
        headers
    }

    #[test]
    fn test_extract_token() {
        assert_eq!(
            TokenGate::extract_token(&HeaderMap::new()).unwrap_err().kind(),
            AuthErrorKind::TokenMissing
        );
        assert_eq!(
            TokenGate::extract_token(&headers_with("")).unwrap_err().kind(),
            AuthErrorKind::TokenMissing
        );
        assert_eq!(
            TokenGate::extract_token(&headers_with("Bearer ")).unwrap_err().kind(),
            AuthErrorKind::TokenMissing
        );
        assert_eq!(
            TokenGate::extract_token(&headers_with("abc.def.ghi")).unwrap(),
            "abc.def.ghi"
        );
        assert_eq!(
            TokenGate::extract_token(&headers_with("Bearer abc.def.ghi")).unwrap(),
            "abc.def.ghi"
        );
    }

    #[test]
    fn test_missing_token_is_client_format() {
        let (_, gate) = setup(Some(SECRET));

        let err = gate.is_authenticated(&HeaderMap::new()).unwrap_err();
        assert_eq!(err.kind(), AuthErrorKind::TokenMissing);
        assert_eq!(err.status_class(), StatusClass::ClientFormat);
    }

    #[test]
    fn test_malformed_token_is_client_format() {
        let (_, gate) = setup(Some(SECRET));

        let err = gate.is_authenticated(&headers_with("hello.hello")).unwrap_err();
        assert_eq!(err.kind(), AuthErrorKind::Malformed);
        assert_eq!(err.status_class(), StatusClass::ClientFormat);
    }

    #[test]
    fn test_expired_token_is_forbidden() {
        let (_, gate) = setup(Some(SECRET));
        let mut claims = signer().issue_claims(1, "munens").unwrap();
        claims.exp = Utc::now().timestamp() - 1;
        let token = signer().sign_claims(&claims).unwrap();

        let err = gate.is_authenticated(&headers_with(&token)).unwrap_err();
        assert_eq!(err.kind(), AuthErrorKind::ExpiredOrNotYetValid);
        assert_eq!(err.status_class(), StatusClass::Forbidden);
    }

    #[test]
    fn test_unconfigured_secret_is_internal() {
        let (_, gate) = setup(None);
        let token = signer().generate_token(1, "munens").unwrap();

        let err = gate.is_authenticated(&headers_with(&token)).unwrap_err();
        assert_eq!(err.kind(), AuthErrorKind::SecretUnavailable);
        assert_eq!(err.status_class(), StatusClass::Internal);
    }

    #[test]
    fn test_valid_token_admitted() {
        let (_, gate) = setup(Some(SECRET));
        let token = signer().generate_token(1, "munens").unwrap();

        let claims = gate.is_authenticated(&headers_with(&token)).unwrap();
        assert_eq!(claims.user_id, 1);
    }

    #[tokio::test]
    async fn test_resolve_identity() {
        let (_, gate) = setup(Some(SECRET));
        let token = signer().generate_token(1, "munens").unwrap();
        let headers = headers_with(&token);

        let first = gate.resolve_identity(&headers).await.unwrap();
        let second = gate.resolve_identity(&headers).await.unwrap();

        assert_eq!(first.username, "munens");
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_resolve_identity_without_user_id() {
        let (_, gate) = setup(Some(SECRET));
        let token = signer().generate_token(0, "").unwrap();

        let err = gate.resolve_identity(&headers_with(&token)).await.unwrap_err();
        assert_eq!(err.kind(), AuthErrorKind::ClaimsUnavailable);
        assert_eq!(err.status_class(), StatusClass::Internal);
    }

    #[tokio::test]
    async fn test_resolve_identity_for_deleted_user() {
        let (store, gate) = setup(Some(SECRET));
        let token = signer().generate_token(1, "munens").unwrap();
        assert!(store.remove_user(1));

        let err = gate.resolve_identity(&headers_with(&token)).await.unwrap_err();
        assert_eq!(err.kind(), AuthErrorKind::NotFound);
        assert_eq!(err.status_class(), StatusClass::Internal);
    }

    #[tokio::test]
    async fn test_resolve_identity_storage_failure_is_internal() {
        let jwt = Arc::new(signer());
        let gate = TokenGate::new(jwt, Arc::new(FailingStore::new("munens", "pw")));
        let token = signer().generate_token(1, "munens").unwrap();

        let err = gate.resolve_identity(&headers_with(&token)).await.unwrap_err();
        assert_eq!(err.kind(), AuthErrorKind::Storage);
        assert_eq!(err.status_class(), StatusClass::Internal);
    }

    #[tokio::test]
    async fn test_resolve_identity_rejects_before_lookup() {
        let (_, gate) = setup(Some(SECRET));

        let err = gate.resolve_identity(&HeaderMap::new()).await.unwrap_err();
        assert_eq!(err.kind(), AuthErrorKind::TokenMissing);
    }
}
