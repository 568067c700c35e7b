//! Quiz App REST API
//!
//! This crate provides the Axum-based HTTP surface: the login endpoint,
//! token-gated user routes, health checks and Prometheus metrics.

pub mod cors;
pub mod error;
pub mod extract;
pub mod routes;
pub mod state;

pub use cors::cors_layer;
pub use error::ApiError;
pub use routes::create_router;
pub use state::{AppState, MetricsHandle};
