//! Login and user routes

use axum::{
    Extension, Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    middleware::from_fn_with_state,
    routing::{get, post},
};
use quiz_auth::{AuthUser, require_token, validate_credentials};
use quiz_db::UserStore;
use tracing::debug;

use crate::error::ApiError;
use crate::extract::CurrentUser;
use crate::state::AppState;

use super::types::{LoginRequest, LoginResponse, UserResponse};

/// POST /user/authenticate
async fn authenticate(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| {
        debug!("Rejected login body: {}", e);
        ApiError::BadRequest("Invalid request body".to_string())
    })?;

    validate_credentials(&request.username, &request.password)?;

    let authenticated = state
        .authenticator
        .authenticate(&request.username, &request.password)
        .await?;

    Ok(Json(authenticated.into()))
}

/// GET /users/{username}
async fn get_user(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(username): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    debug!("User {} looking up {}", caller.username, username);

    let user = state
        .store
        .find_by_username(&username)
        .await?
        .ok_or_else(|| ApiError::NotFound("Error finding user".to_string()))?;

    Ok(Json(user.into()))
}

/// GET /user/me
async fn me(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(user.into())
}

/// Create login and user routes
pub fn routes(state: AppState) -> Router<AppState> {
    let gated = Router::new()
        .route("/users/{username}", get(get_user))
        .route_layer(from_fn_with_state(state.gate.clone(), require_token));

    Router::new()
        .route("/user/authenticate", post(authenticate))
        .route("/user/me", get(me))
        .merge(gated)
}
