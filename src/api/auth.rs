//! Token endpoints.

use super::AppState;
use crate::{
    auth::{self, RefreshedAccess, TokenPair},
    errors::Result,
};
use axum::{Json, extract::State};
use serde::Deserialize;

/// Credentials posted to the login endpoints.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Login name
    pub username: String,
    /// Password
    pub password: String,
}

/// Body of a refresh request.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    /// Refresh token from a previous login
    pub refresh: String,
}

/// `POST /api/auth/login`
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<TokenPair>> {
    let pair = auth::login(&state.db, &state.settings.auth, &body.username, &body.password).await?;
    Ok(Json(pair))
}

/// `POST /api/auth/refresh`
pub async fn refresh(
    State(state): State<AppState>,
    Json(body): Json<RefreshRequest>,
) -> Result<Json<RefreshedAccess>> {
    let access = auth::refresh(&state.db, &state.settings.auth, &body.refresh).await?;
    Ok(Json(access))
}
