//! Application state

use quiz_auth::{Authenticator, JwtManager, TokenGate};
use quiz_db::UserStore;
use std::sync::Arc;

/// Prometheus handle used to render `/metrics`
pub type MetricsHandle = metrics_exporter_prometheus::PrometheusHandle;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn UserStore>,
    pub authenticator: Arc<Authenticator>,
    pub gate: Arc<TokenGate>,
}

impl AppState {
    /// Wire both auth components to the same store and signing secret
    pub fn new(store: Arc<dyn UserStore>, jwt: Arc<JwtManager>) -> Self {
        Self {
            authenticator: Arc::new(Authenticator::new(store.clone(), jwt.clone())),
            gate: Arc::new(TokenGate::new(jwt, store.clone())),
            store,
        }
    }
}
