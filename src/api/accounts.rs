//! Administrator registration, profile and tenant management endpoints.

use super::{AppState, extract::AuthUser};
use crate::{
    core::account::{self, AccountView, NewAccount, TenantUpdate},
    errors::Result,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

/// `POST /api/register-admin`
pub async fn register_admin(
    State(state): State<AppState>,
    Json(body): Json<NewAccount>,
) -> Result<(StatusCode, Json<AccountView>)> {
    let admin = account::register_admin(&state.db, body).await?;
    Ok((StatusCode::CREATED, Json(admin.into())))
}

/// `GET /api/me`
pub async fn me(State(state): State<AppState>, user: AuthUser) -> Result<Json<AccountView>> {
    let profile = account::profile(&state.db, &user.caller()).await?;
    Ok(Json(profile.into()))
}

/// `GET /api/tenants`
pub async fn list_tenants(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<AccountView>>> {
    let tenants = account::list_tenants(&state.db, &user.caller()).await?;
    Ok(Json(tenants.into_iter().map(AccountView::from).collect()))
}

/// `POST /api/tenants`
pub async fn create_tenant(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<NewAccount>,
) -> Result<(StatusCode, Json<AccountView>)> {
    let tenant = account::create_tenant(&state.db, &user.caller(), body).await?;
    Ok((StatusCode::CREATED, Json(tenant.into())))
}

/// `GET /api/tenants/{id}`
pub async fn get_tenant(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<AccountView>> {
    let tenant = account::get_tenant(&state.db, &user.caller(), id).await?;
    Ok(Json(tenant.into()))
}

/// `PUT /api/tenants/{id}`
pub async fn update_tenant(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    Json(body): Json<TenantUpdate>,
) -> Result<Json<AccountView>> {
    let tenant = account::update_tenant(&state.db, &user.caller(), id, body).await?;
    Ok(Json(tenant.into()))
}

/// `DELETE /api/tenants/{id}`
pub async fn delete_tenant(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    account::delete_tenant(&state.db, &user.caller(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
