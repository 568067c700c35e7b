//! Request/Response DTOs

use chrono::{DateTime, Utc};
use quiz_auth::AuthenticatedUser;
use quiz_db::User;
use serde::{Deserialize, Serialize};

/// Login request
///
/// Missing fields deserialize as empty strings and are rejected by
/// validation, not by the JSON decoder.
#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// User response (without password)
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            created_at: user.created_at,
            last_login_at: user.last_login_at,
        }
    }
}

/// Login response
#[derive(Serialize)]
pub struct LoginResponse {
    pub user: UserResponse,
    pub token: String,
}

impl From<AuthenticatedUser> for LoginResponse {
    fn from(authenticated: AuthenticatedUser) -> Self {
        Self {
            user: authenticated.user.into(),
            token: authenticated.token,
        }
    }
}
