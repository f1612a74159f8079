use axum::{
    extract::{Path, State},
    http::HeaderMap,
    routing::post,
    Json, Router,
};
use instapp_core::Submission;
use instapp_formula::ShiftMode;
use serde::{Deserialize, Serialize};

use super::context;
use crate::error::AppError;
use crate::payments::{CheckoutRequest, CheckoutResponse};
use crate::services::entries::{append_entry, AppendOutcome};
use crate::services::upload::{upload_csv, UploadSummary};
use crate::AppState;

/// Request to add an entry
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendEntryRequest {
    pub values: Submission,
    #[serde(default)]
    pub shift_mode: ShiftMode,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendEntryResponse {
    #[serde(flatten)]
    pub entry: AppendOutcome,
    pub checkout: Option<CheckoutResponse>,
}

/// Append an entry; starts a checkout when the entry has a price
async fn create_entry(
    State(state): State<AppState>,
    Path((id, sheet)): Path<(String, String)>,
    headers: HeaderMap,
    Json(req): Json<AppendEntryRequest>,
) -> Result<Json<AppendEntryResponse>, AppError> {
    let ctx = context(id, Some(sheet), &headers);
    let entry = append_entry(state.sheets.as_ref(), &ctx, &req.values, req.shift_mode).await?;

    let checkout = match (entry.payment_amount, &state.payments) {
        (Some(amount), Some(payments)) => {
            let request = CheckoutRequest {
                amount,
                currency: "usd".to_string(),
                spreadsheet_id: ctx.spreadsheet_id.clone(),
                row_number: entry.row,
            };
            Some(payments.create_checkout(&request).await?)
        }
        (Some(amount), None) => {
            tracing::warn!(
                amount,
                row = entry.row,
                "Entry needs payment but payments are disabled"
            );
            None
        }
        (None, _) => None,
    };

    Ok(Json(AppendEntryResponse { entry, checkout }))
}

/// Replace sheet contents with an uploaded CSV body
async fn upload(
    State(state): State<AppState>,
    Path((id, sheet)): Path<(String, String)>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<UploadSummary>, AppError> {
    let ctx = context(id, Some(sheet), &headers);
    Ok(Json(upload_csv(state.sheets.as_ref(), &ctx, &body).await?))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/spreadsheets/:id/sheets/:sheet/entries", post(create_entry))
        .route("/api/spreadsheets/:id/sheets/:sheet/upload", post(upload))
}
