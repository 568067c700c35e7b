//! Store doubles for exercising storage failure paths

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quiz_db::{DbError, User, UserCredentials, UserStore};

use crate::password::hash_password;

/// Knows a single user by name but fails every write and every lookup by ID
pub(crate) struct FailingStore {
    credentials: UserCredentials,
}

impl FailingStore {
    pub(crate) fn new(username: &str, password: &str) -> Self {
        Self {
            credentials: UserCredentials {
                user: User {
                    id: 1,
                    username: username.to_string(),
                    created_at: Utc::now(),
                    last_login_at: None,
                },
                password_hash: hash_password(password).unwrap(),
            },
        }
    }
}

#[async_trait]
impl UserStore for FailingStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DbError> {
        Ok(self
            .find_by_username_with_hash(username)
            .await?
            .map(|c| c.user))
    }

    async fn find_by_username_with_hash(
        &self,
        username: &str,
    ) -> Result<Option<UserCredentials>, DbError> {
        Ok((self.credentials.user.username == username).then(|| self.credentials.clone()))
    }

    async fn find_by_id(&self, _id: i64) -> Result<Option<User>, DbError> {
        Err(DbError::Connection(sqlx::Error::PoolTimedOut))
    }

    async fn touch_last_login(&self, id: i64, _at: DateTime<Utc>) -> Result<(), DbError> {
        Err(DbError::NotFound(format!("User {}", id)))
    }
}
