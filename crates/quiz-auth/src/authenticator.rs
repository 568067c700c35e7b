//! Credential authentication

use chrono::Utc;
use quiz_db::{User, UserStore};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::AuthError;
use crate::jwt::JwtManager;
use crate::password::verify_password;

/// Maximum allowed username length
const MAX_USERNAME_LENGTH: usize = 64;
/// Maximum allowed password length (prevent DoS with very large passwords)
const MAX_PASSWORD_LENGTH: usize = 256;

/// Verified against when the username is unknown so that both failure paths
/// pay the same hashing cost. It never matches any password.
const DUMMY_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$dGltaW5nX2F0dGFja19wcmV2ZW50aW9u$K8rI5T7VdQ8xkO0GqK5K2w";

/// Result of a successful login
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user: User,
    pub token: String,
}

/// Reject empty or oversized login input before any lookup happens
pub fn validate_credentials(username: &str, password: &str) -> Result<(), AuthError> {
    if username.is_empty() || password.is_empty() {
        return Err(AuthError::Validation(
            "Username and password are required".to_string(),
        ));
    }
    if username.len() > MAX_USERNAME_LENGTH {
        return Err(AuthError::Validation(format!(
            "Username exceeds maximum length of {} characters",
            MAX_USERNAME_LENGTH
        )));
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(AuthError::Validation(format!(
            "Password exceeds maximum length of {} characters",
            MAX_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

/// Turns a username/password pair into a signed token
pub struct Authenticator {
    store: Arc<dyn UserStore>,
    jwt: Arc<JwtManager>,
}

impl Authenticator {
    pub fn new(store: Arc<dyn UserStore>, jwt: Arc<JwtManager>) -> Self {
        Self { store, jwt }
    }

    /// Authenticate a user and record the login
    ///
    /// Input is expected to have passed [`validate_credentials`]. Nothing is
    /// written unless the password matches.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AuthenticatedUser, AuthError> {
        let result = self.try_authenticate(username, password).await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(e) => e.kind().as_str(),
        };
        metrics::counter!("quiz_auth_logins_total", "outcome" => outcome).increment(1);

        result
    }

    async fn try_authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AuthenticatedUser, AuthError> {
        debug!("Login attempt for user: {}", username);

        let Some(credentials) = self.store.find_by_username_with_hash(username).await? else {
            let _ = verify_password(password, DUMMY_HASH);
            return Err(AuthError::UserNotFound(username.to_string()));
        };

        if !verify_password(password, &credentials.password_hash)? {
            warn!("Invalid password for user: {}", username);
            return Err(AuthError::InvalidCredentials);
        }

        let user = credentials.user;
        let token = self.jwt.generate_token(user.id, &user.username)?;

        self.store.touch_last_login(user.id, Utc::now()).await?;

        // Re-read so the response carries the stored last-login value
        let refreshed = self
            .store
            .find_by_username(&user.username)
            .await?
            .ok_or(AuthError::IdentityGone(user.id))?;

        info!("User {} logged in successfully", user.username);

        Ok(AuthenticatedUser {
            user: User {
                id: user.id,
                username: user.username,
                created_at: user.created_at,
                last_login_at: refreshed.last_login_at,
            },
            token,
        })
    }
}
