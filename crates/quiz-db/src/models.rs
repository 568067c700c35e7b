//! Database models

use crate::utils::{parse_datetime_or_now, parse_optional_datetime};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Row;

/// User model
///
/// The password hash is deliberately not part of this type; it only travels
/// inside [`UserCredentials`] while a login is being checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub created_at: DateTime<Utc>,
    /// `None` until the first successful login
    pub last_login_at: Option<DateTime<Utc>>,
}

/// A user together with the stored password hash
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
}

/// New user for insertion
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
}

// ==================== TryFrom Implementations ====================

impl TryFrom<&sqlx::sqlite::SqliteRow> for User {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        let last_login_at: Option<String> = row.try_get("last_login_at")?;
        Ok(User {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            created_at: parse_datetime_or_now(&row.try_get::<String, _>("created_at")?),
            last_login_at: parse_optional_datetime(last_login_at.as_deref()),
        })
    }
}

impl TryFrom<&sqlx::sqlite::SqliteRow> for UserCredentials {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        Ok(UserCredentials {
            user: User::try_from(row)?,
            password_hash: row.try_get("password_hash")?,
        })
    }
}
