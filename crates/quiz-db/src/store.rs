//! User store trait

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::DbError;
use crate::models::{User, UserCredentials};

/// User store trait
///
/// The read and write operations the authentication layer needs from
/// persistence. Implementations must be safe to share across concurrent
/// requests; the SQLite implementation relies on its connection pool for that.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Find a user by username
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DbError>;

    /// Find a user by username, including the stored password hash
    async fn find_by_username_with_hash(
        &self,
        username: &str,
    ) -> Result<Option<UserCredentials>, DbError>;

    /// Find a user by ID
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, DbError>;

    /// Record a successful login
    ///
    /// Fails with [`DbError::NotFound`] when no user has the given ID.
    async fn touch_last_login(&self, id: i64, at: DateTime<Utc>) -> Result<(), DbError>;
}
