//! Property catalog endpoints.

use super::{AppState, extract::AuthUser};
use crate::{
    core::property::{self, PropertyInput, PropertyView},
    errors::Result,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

/// `GET /api/properties`
pub async fn list(State(state): State<AppState>, user: AuthUser) -> Result<Json<Vec<PropertyView>>> {
    let properties = property::list_properties(&state.db, &user.caller()).await?;
    Ok(Json(
        properties
            .into_iter()
            .map(|p| PropertyView::new(p, &state.media))
            .collect(),
    ))
}

/// `POST /api/properties`
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<PropertyInput>,
) -> Result<(StatusCode, Json<PropertyView>)> {
    let created = property::create_property(&state.db, &state.media, &user.caller(), body).await?;
    Ok((StatusCode::CREATED, Json(PropertyView::new(created, &state.media))))
}

/// `GET /api/properties/{id}`
pub async fn get(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<PropertyView>> {
    let found = property::get_property(&state.db, &user.caller(), id).await?;
    Ok(Json(PropertyView::new(found, &state.media)))
}

/// `PUT /api/properties/{id}`
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    Json(body): Json<PropertyInput>,
) -> Result<Json<PropertyView>> {
    let updated =
        property::update_property(&state.db, &state.media, &user.caller(), id, body).await?;
    Ok(Json(PropertyView::new(updated, &state.media)))
}

/// `DELETE /api/properties/{id}`
pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    property::delete_property(&state.db, &user.caller(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
