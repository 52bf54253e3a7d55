//! Payment ledger endpoints, including validation and notification retry.

use super::{AppState, extract::AuthUser};
use crate::{
    core::payment::{self, NewPayment, PaymentUpdate, PaymentView},
    errors::Result,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Serialize;

/// Response to a successful validation.
#[derive(Debug, Serialize)]
pub struct ValidationResponse {
    /// Human-readable outcome
    pub message: &'static str,
    /// Absolute URL of the generated receipt
    pub receipt_url: Option<String>,
    /// The validated payment
    pub payment: PaymentView,
}

/// `GET /api/payments`
pub async fn list(State(state): State<AppState>, user: AuthUser) -> Result<Json<Vec<PaymentView>>> {
    let payments = payment::list_payments(&state.db, &user.caller()).await?;
    Ok(Json(
        payments
            .into_iter()
            .map(|p| PaymentView::new(p, &state.media))
            .collect(),
    ))
}

/// `POST /api/payments`
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<NewPayment>,
) -> Result<(StatusCode, Json<PaymentView>)> {
    let created = payment::create_payment(&state.db, &user.caller(), body).await?;
    Ok((StatusCode::CREATED, Json(PaymentView::new(created, &state.media))))
}

/// `GET /api/payments/{id}`
pub async fn get(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<PaymentView>> {
    let found = payment::get_payment(&state.db, &user.caller(), id).await?;
    Ok(Json(PaymentView::new(found, &state.media)))
}

/// `PUT /api/payments/{id}`
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    Json(body): Json<PaymentUpdate>,
) -> Result<Json<PaymentView>> {
    let updated = payment::update_payment(&state.db, &user.caller(), id, body).await?;
    Ok(Json(PaymentView::new(updated, &state.media)))
}

/// `DELETE /api/payments/{id}`
pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    payment::delete_payment(&state.db, &user.caller(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/payments/{id}/validate`
pub async fn validate(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<ValidationResponse>> {
    let validated = payment::validate_payment(&state.db, state.receipting(), &user.caller(), id).await?;
    let view = PaymentView::new(validated, &state.media);
    Ok(Json(ValidationResponse {
        message: "Payment validated, receipt generated and sent",
        receipt_url: view.receipt_url.clone(),
        payment: view,
    }))
}

/// `POST /api/payments/{id}/notify`
pub async fn notify(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<ValidationResponse>> {
    let notified = payment::resend_receipt(&state.db, state.receipting(), &user.caller(), id).await?;
    let view = PaymentView::new(notified, &state.media);
    Ok(Json(ValidationResponse {
        message: "Receipt sent",
        receipt_url: view.receipt_url.clone(),
        payment: view,
    }))
}
