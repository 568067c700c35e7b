//! Request extractors

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use quiz_db::User;

use crate::error::ApiError;
use crate::state::AppState;

/// Extractor for the user named by the request's token (required)
///
/// Runs the full identity resolution: the token must validate and the user it
/// names must still exist.
pub struct CurrentUser(pub User);

impl<S> FromRequestParts<S> for CurrentUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let user = app_state.gate.resolve_identity(&parts.headers).await?;
        Ok(CurrentUser(user))
    }
}
