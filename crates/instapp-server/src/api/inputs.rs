use axum::{
    extract::{Path, State},
    http::HeaderMap,
    routing::{get, put},
    Json, Router,
};
use instapp_core::InputValue;
use serde::{Deserialize, Serialize};

use super::context;
use crate::error::AppError;
use crate::services::inputs::{input_field, update_input, InputField};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdateInputRequest {
    pub value: InputValue,
}

#[derive(Debug, Serialize)]
pub struct UpdateInputResponse {
    pub written: String,
}

async fn get_input(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Option<InputField>>, AppError> {
    let ctx = context(id, None, &headers);
    Ok(Json(input_field(state.sheets.as_ref(), &ctx).await?))
}

async fn set_input(
    State(state): State<AppState>,
    Path((id, row)): Path<(String, u32)>,
    headers: HeaderMap,
    Json(req): Json<UpdateInputRequest>,
) -> Result<Json<UpdateInputResponse>, AppError> {
    let ctx = context(id, None, &headers);
    let written = update_input(state.sheets.as_ref(), &ctx, row, &req.value).await?;
    Ok(Json(UpdateInputResponse { written }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/spreadsheets/:id/inputs", get(get_input))
        .route("/api/spreadsheets/:id/inputs/:row", put(set_input))
}
