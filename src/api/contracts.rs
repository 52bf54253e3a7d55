//! Contract endpoints.

use super::{AppState, extract::AuthUser};
use crate::{
    core::contract::{self, ContractUpdate, ContractView, NewContract},
    errors::Result,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

/// `GET /api/contracts`
pub async fn list(State(state): State<AppState>, user: AuthUser) -> Result<Json<Vec<ContractView>>> {
    let contracts = contract::list_contracts(&state.db, &user.caller()).await?;
    Ok(Json(
        contracts
            .into_iter()
            .map(|c| ContractView::new(c, &state.media))
            .collect(),
    ))
}

/// `POST /api/contracts`
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<NewContract>,
) -> Result<(StatusCode, Json<ContractView>)> {
    let created = contract::create_contract(&state.db, &state.media, &user.caller(), body).await?;
    Ok((StatusCode::CREATED, Json(ContractView::new(created, &state.media))))
}

/// `GET /api/contracts/{id}`
pub async fn get(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<ContractView>> {
    let found = contract::get_contract(&state.db, &user.caller(), id).await?;
    Ok(Json(ContractView::new(found, &state.media)))
}

/// `PUT /api/contracts/{id}`
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    Json(body): Json<ContractUpdate>,
) -> Result<Json<ContractView>> {
    let updated =
        contract::update_contract(&state.db, &state.media, &user.caller(), id, body).await?;
    Ok(Json(ContractView::new(updated, &state.media)))
}

/// `DELETE /api/contracts/{id}`
pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    contract::delete_contract(&state.db, &user.caller(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
