//! In-memory user store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::BTreeMap;

use crate::error::DbError;
use crate::models::{NewUser, User, UserCredentials};
use crate::store::UserStore;

/// In-memory [`UserStore`]
///
/// Mirrors the SQLite repository's behavior (sequential IDs, unique
/// usernames, `NotFound` on touching a missing user) without any I/O.
#[derive(Default)]
pub struct MemoryUserStore {
    inner: RwLock<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    last_id: i64,
    users: BTreeMap<i64, UserCredentials>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new user
    pub fn insert_user(&self, user: NewUser) -> Result<User, DbError> {
        let mut state = self.inner.write();

        if state
            .users
            .values()
            .any(|c| c.user.username == user.username)
        {
            return Err(DbError::Duplicate(format!(
                "User '{}' already exists",
                user.username
            )));
        }

        state.last_id += 1;
        let stored = User {
            id: state.last_id,
            username: user.username,
            created_at: Utc::now(),
            last_login_at: None,
        };
        state.users.insert(
            stored.id,
            UserCredentials {
                user: stored.clone(),
                password_hash: user.password_hash,
            },
        );
        Ok(stored)
    }

    /// Remove a user, returning whether it existed
    pub fn remove_user(&self, id: i64) -> bool {
        self.inner.write().users.remove(&id).is_some()
    }

    fn find_credentials(&self, username: &str) -> Option<UserCredentials> {
        self.inner
            .read()
            .users
            .values()
            .find(|c| c.user.username == username)
            .cloned()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DbError> {
        Ok(self.find_credentials(username).map(|c| c.user))
    }

    async fn find_by_username_with_hash(
        &self,
        username: &str,
    ) -> Result<Option<UserCredentials>, DbError> {
        Ok(self.find_credentials(username))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, DbError> {
        Ok(self.inner.read().users.get(&id).map(|c| c.user.clone()))
    }

    async fn touch_last_login(&self, id: i64, at: DateTime<Utc>) -> Result<(), DbError> {
        let mut state = self.inner.write();
        let credentials = state
            .users
            .get_mut(&id)
            .ok_or_else(|| DbError::NotFound(format!("User {}", id)))?;
        credentials.user.last_login_at = Some(at);
        Ok(())
    }
}
