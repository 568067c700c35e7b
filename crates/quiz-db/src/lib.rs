//! Quiz App Database Layer
//!
//! This crate owns user persistence for the quiz backend. It exposes the
//! [`UserStore`] capability consumed by the authentication layer, backed by
//! SQLite via sqlx in production and by [`MemoryUserStore`] in tests.

pub mod error;
pub mod memory;
pub mod models;
pub mod repository;
pub mod store;
pub mod utils;

pub use error::DbError;
pub use memory::MemoryUserStore;
pub use models::*;
pub use repository::Database;
pub use store::UserStore;

/// Re-export sqlx types for convenience
pub use sqlx::SqlitePool;
