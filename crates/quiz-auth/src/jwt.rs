//! JWT token management

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, decode_header, encode,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AuthError;

/// Lifetime of a freshly issued token
pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 120;

/// Signing schemes accepted when validating. Anything else is treated as a
/// substitution attempt.
const HMAC_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

/// JWT claims
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Username
    #[serde(default)]
    pub username: String,
    /// User ID; zero when the token names no user
    #[serde(rename = "userId", default)]
    pub user_id: i64,
    /// Issued at (Unix timestamp)
    #[serde(default)]
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.iat, 0)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

#[derive(Clone)]
struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

/// JWT manager for token generation and validation
///
/// The secret is fixed at construction. Without one, issuing fails with
/// [`AuthError::SigningKeyUnavailable`] and validation with
/// [`AuthError::SecretUnavailable`].
#[derive(Clone)]
pub struct JwtManager {
    keys: Option<SigningKeys>,
    token_ttl: Duration,
}

impl JwtManager {
    /// Create a new JWT manager
    pub fn new(secret: Option<&str>, token_ttl: Duration) -> Self {
        Self {
            keys: secret.map(|secret| SigningKeys {
                encoding: EncodingKey::from_secret(secret.as_bytes()),
                decoding: DecodingKey::from_secret(secret.as_bytes()),
            }),
            token_ttl,
        }
    }

    pub fn has_secret(&self) -> bool {
        self.keys.is_some()
    }

    pub fn token_ttl(&self) -> Duration {
        self.token_ttl
    }

    /// Build claims for a user, valid from now for the configured lifetime
    ///
    /// Fails if the lifetime is not positive or pushes `exp` past the
    /// representable date range.
    pub fn issue_claims(&self, user_id: i64, username: &str) -> Result<Claims, AuthError> {
        if self.token_ttl <= Duration::zero() {
            return Err(AuthError::TokenLifetime(format!(
                "lifetime {} is not positive",
                self.token_ttl
            )));
        }

        let now = Utc::now();
        let exp = now.checked_add_signed(self.token_ttl).ok_or_else(|| {
            AuthError::TokenLifetime(format!("lifetime {} is out of range", self.token_ttl))
        })?;

        Ok(Claims {
            username: username.to_string(),
            user_id,
            iat: now.timestamp(),
            exp: exp.timestamp(),
        })
    }

    /// Generate a JWT token for a user
    pub fn generate_token(&self, user_id: i64, username: &str) -> Result<String, AuthError> {
        let claims = self.issue_claims(user_id, username)?;

        debug!("Generating token for user: {}", username);

        self.sign_claims(&claims)
    }

    /// Sign arbitrary claims with HS256
    pub fn sign_claims(&self, claims: &Claims) -> Result<String, AuthError> {
        let keys = self.keys.as_ref().ok_or(AuthError::SigningKeyUnavailable)?;

        encode(&Header::new(Algorithm::HS256), claims, &keys.encoding)
            .map_err(AuthError::TokenCreationFailed)
    }

    /// Validate a JWT token and return claims
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let header = decode_header(token).map_err(|e| AuthError::Malformed(e.to_string()))?;

        if !HMAC_ALGORITHMS.contains(&header.alg) {
            return Err(AuthError::Malformed(format!(
                "unexpected signing algorithm {:?}",
                header.alg
            )));
        }
        check_signature_encoding(token, header.alg)?;

        let keys = self.keys.as_ref().ok_or(AuthError::SecretUnavailable)?;

        let mut validation = Validation::new(header.alg);
        validation.leeway = 0;

        let token_data = decode::<Claims>(token, &keys.decoding, &validation).map_err(classify)?;
        let claims = token_data.claims;

        // `exp` must lie strictly in the future, `iat` must not.
        let now = Utc::now().timestamp();
        if claims.exp <= now {
            return Err(AuthError::ExpiredOrNotYetValid(format!(
                "expired at {}",
                claims.exp
            )));
        }
        if claims.iat > now {
            return Err(AuthError::ExpiredOrNotYetValid(format!(
                "issued in the future at {}",
                claims.iat
            )));
        }

        Ok(claims)
    }
}

/// Reject signature segments that are not base64url or have the wrong length
/// for the algorithm. The decoder reports those as signature mismatches.
fn check_signature_encoding(token: &str, alg: Algorithm) -> Result<(), AuthError> {
    let expected_len = match alg {
        Algorithm::HS384 => 48,
        Algorithm::HS512 => 64,
        _ => 32,
    };

    let (_, signature) = token
        .rsplit_once('.')
        .ok_or_else(|| AuthError::Malformed("token has no signature segment".to_string()))?;
    let decoded = URL_SAFE_NO_PAD
        .decode(signature)
        .map_err(|e| AuthError::Malformed(format!("signature is not base64url: {}", e)))?;

    if decoded.len() != expected_len {
        return Err(AuthError::Malformed(format!(
            "signature is {} bytes, expected {} for {:?}",
            decoded.len(),
            expected_len,
            alg
        )));
    }
    Ok(())
}

/// Split decoder failures into structural and verification errors
fn classify(err: jsonwebtoken::errors::Error) -> AuthError {
    match err.kind() {
        ErrorKind::ExpiredSignature | ErrorKind::ImmatureSignature | ErrorKind::InvalidSignature => {
            AuthError::ExpiredOrNotYetValid(err.to_string())
        }
        _ => AuthError::Malformed(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuthErrorKind;

    // base64url of {"alg":"RS256","typ":"JWT"} and {"alg":"ES256","typ":"JWT"}
    const RS256_HEADER: &str = "eyJhbGciOiJSUzI1NiIsInR5cCI6IkpXVCJ9";
    const ES256_HEADER: &str = "eyJhbGciOiJFUzI1NiIsInR5cCI6IkpXVCJ9";

    fn manager(secret: &str) -> JwtManager {
        JwtManager::new(Some(secret), Duration::minutes(DEFAULT_TOKEN_TTL_MINUTES))
    }

    #[test]
    fn test_token_generation_and_validation() {
        let manager = manager("test-secret-key");

        let token = manager.generate_token(1, "testuser").unwrap();
        let claims = manager.validate_token(&token).unwrap();

        assert_eq!(claims.user_id, 1);
        assert_eq!(claims.username, "testuser");
        assert_eq!(claims.exp - claims.iat, 2 * 3600);
    }

    #[test]
    fn test_claims_wire_names() {
        let claims = Claims {
            username: "alice".to_string(),
            user_id: 5,
            iat: 10,
            exp: 20,
        };
        let value = serde_json::to_value(&claims).unwrap();

        assert_eq!(value["userId"], 5);
        assert_eq!(value["username"], "alice");
        assert_eq!(value["iat"], 10);
        assert_eq!(value["exp"], 20);
    }

    #[test]
    fn test_invalid_token() {
        let manager = manager("test-secret-key");

        for token in ["", "invalid-token", "hello.hello", "a.b.c"] {
            let err = manager.validate_token(token).unwrap_err();
            assert_eq!(err.kind(), AuthErrorKind::Malformed, "token {:?}", token);
        }
    }

    #[test]
    fn test_expired_token_rejected() {
        let manager = manager("test-secret-key");
        let now = Utc::now().timestamp();
        let claims = Claims {
            username: "alice".to_string(),
            user_id: 1,
            iat: now - 7200,
            exp: now - 1,
        };
        let token = manager.sign_claims(&claims).unwrap();

        let err = manager.validate_token(&token).unwrap_err();
        assert_eq!(err.kind(), AuthErrorKind::ExpiredOrNotYetValid);
    }

    #[test]
    fn test_expired_token_with_foreign_signature_rejected() {
        let now = Utc::now().timestamp();
        let claims = Claims {
            username: "alice".to_string(),
            user_id: 1,
            iat: now - 7200,
            exp: now - 1,
        };
        let token = manager("other-secret").sign_claims(&claims).unwrap();

        let err = manager("test-secret-key").validate_token(&token).unwrap_err();
        assert_eq!(err.kind(), AuthErrorKind::ExpiredOrNotYetValid);
    }

    #[test]
    fn test_future_issued_at_rejected() {
        let manager = manager("test-secret-key");
        let now = Utc::now().timestamp();
        let claims = Claims {
            username: "alice".to_string(),
            user_id: 1,
            iat: now + 600,
            exp: now + 7200,
        };
        let token = manager.sign_claims(&claims).unwrap();

        let err = manager.validate_token(&token).unwrap_err();
        assert_eq!(err.kind(), AuthErrorKind::ExpiredOrNotYetValid);
    }

    #[test]
    fn test_different_secrets_reject() {
        let token = manager("secret1").generate_token(1, "alice").unwrap();

        let err = manager("secret2").validate_token(&token).unwrap_err();
        assert_eq!(err.kind(), AuthErrorKind::ExpiredOrNotYetValid);
    }

    #[test]
    fn test_garbled_signature_is_malformed() {
        let manager = manager("test-secret-key");
        let token = manager.generate_token(1, "alice").unwrap();
        let (unsigned, signature) = token.rsplit_once('.').unwrap();

        let garbled = format!("{}.!!!not~base64***", unsigned);
        let err = manager.validate_token(&garbled).unwrap_err();
        assert_eq!(err.kind(), AuthErrorKind::Malformed);

        let empty = format!("{}.", unsigned);
        let err = manager.validate_token(&empty).unwrap_err();
        assert_eq!(err.kind(), AuthErrorKind::Malformed);

        // Well-formed but a few bytes short of an HS256 digest
        let truncated = format!("{}.{}", unsigned, &signature[..signature.len() - 8]);
        let err = manager.validate_token(&truncated).unwrap_err();
        assert_eq!(err.kind(), AuthErrorKind::Malformed);
    }

    #[test]
    fn test_token_lifetime_out_of_range() {
        for ttl in [
            Duration::zero(),
            Duration::minutes(-5),
            Duration::minutes(1_000_000_000_000),
        ] {
            let manager = JwtManager::new(Some("test-secret-key"), ttl);
            let err = manager.generate_token(1, "alice").unwrap_err();
            assert_eq!(err.kind(), AuthErrorKind::TokenCreationFailed);
            assert_eq!(err.status_class(), crate::error::StatusClass::Internal);
        }
    }

    #[test]
    fn test_non_hmac_algorithm_is_malformed() {
        let manager = manager("test-secret-key");
        let token = manager.generate_token(1, "alice").unwrap();
        let mut parts = token.split('.');
        let _header = parts.next().unwrap();
        let payload = parts.next().unwrap();
        let signature = parts.next().unwrap();

        for forged_header in [RS256_HEADER, ES256_HEADER] {
            let forged = format!("{}.{}.{}", forged_header, payload, signature);
            let err = manager.validate_token(&forged).unwrap_err();
            assert_eq!(err.kind(), AuthErrorKind::Malformed);
        }
    }

    #[test]
    fn test_other_hmac_variants_accepted() {
        let manager = manager("test-secret-key");
        let claims = manager.issue_claims(9, "carol").unwrap();
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(b"test-secret-key"),
        )
        .unwrap();

        assert_eq!(manager.validate_token(&token).unwrap(), claims);
    }

    #[test]
    fn test_missing_user_id_still_parses() {
        let manager = manager("test-secret-key");
        let exp = Utc::now().timestamp() + 3600;
        let token = encode(
            &Header::new(Algorithm::HS256),
            &serde_json::json!({ "exp": exp }),
            &EncodingKey::from_secret(b"test-secret-key"),
        )
        .unwrap();

        let claims = manager.validate_token(&token).unwrap();
        assert_eq!(claims.user_id, 0);
        assert!(claims.username.is_empty());
    }

    #[test]
    fn test_missing_secret() {
        let signer = manager("test-secret-key");
        let token = signer.generate_token(1, "alice").unwrap();

        let unconfigured = JwtManager::new(None, Duration::minutes(DEFAULT_TOKEN_TTL_MINUTES));
        assert!(!unconfigured.has_secret());
        assert_eq!(
            unconfigured.generate_token(1, "alice").unwrap_err().kind(),
            AuthErrorKind::SigningKeyUnavailable
        );
        assert_eq!(
            unconfigured.validate_token(&token).unwrap_err().kind(),
            AuthErrorKind::SecretUnavailable
        );
        // Structure is checked before the secret is needed
        assert_eq!(
            unconfigured.validate_token("garbage").unwrap_err().kind(),
            AuthErrorKind::Malformed
        );
    }
}
