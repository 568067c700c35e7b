//! CORS policy

use axum::http::{HeaderValue, Method, header};
use std::time::Duration;
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tracing::warn;

/// Build the CORS layer for the configured origins
///
/// Credentials are allowed, so headers are mirrored from the preflight
/// request instead of using a wildcard. Origins that are not valid header
/// values are skipped.
pub fn cors_layer(allowed_origins: &[String], max_age: Duration) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
        .expose_headers([header::AUTHORIZATION, header::ACCESS_CONTROL_ALLOW_ORIGIN])
        .max_age(max_age)
}
