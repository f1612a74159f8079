use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

use crate::error::AppError;
use crate::payments::{
    CheckoutRequest, CheckoutResponse, IntentRequest, IntentResponse, PaymentStatus, StripeClient,
};
use crate::services::payments::{confirmation_target, record_payment, PaymentConfirmation};
use crate::AppState;

fn payments(state: &AppState) -> Result<&Arc<StripeClient>, AppError> {
    state
        .payments
        .as_ref()
        .ok_or_else(|| AppError::Configuration("payments are not configured".to_string()))
}

async fn create_checkout(
    State(state): State<AppState>,
    Json(req): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>, AppError> {
    Ok(Json(payments(&state)?.create_checkout(&req).await?))
}

async fn create_intent(
    State(state): State<AppState>,
    Json(req): Json<IntentRequest>,
) -> Result<Json<IntentResponse>, AppError> {
    Ok(Json(payments(&state)?.create_intent(&req).await?))
}

async fn payment_status(
    State(state): State<AppState>,
    Path(intent_id): Path<String>,
) -> Result<Json<PaymentStatus>, AppError> {
    Ok(Json(payments(&state)?.payment_status(&intent_id).await?))
}

/// Verify a completed checkout and mark its row as paid
async fn confirm(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<PaymentConfirmation>, AppError> {
    let session = payments(&state)?.checkout_session(&session_id).await?;
    let (spreadsheet_id, row) = confirmation_target(&session)?;
    let confirmation =
        record_payment(state.sheets.as_ref(), &spreadsheet_id, row, &session.id).await?;
    Ok(Json(confirmation))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/payments", post(create_checkout))
        .route("/api/payments/intents", post(create_intent))
        .route("/api/payments/:id", get(payment_status))
        .route("/api/payments/:id/confirm", post(confirm))
}
