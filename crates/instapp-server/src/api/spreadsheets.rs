use axum::{
    extract::{Path, State},
    http::HeaderMap,
    routing::get,
    Json, Router,
};

use super::context;
use crate::error::AppError;
use crate::services::sheets::{self, EntryForm, SheetView};
use crate::store::SpreadsheetFile;
use crate::AppState;

/// List spreadsheets shared with the service account
async fn list_spreadsheets(
    State(state): State<AppState>,
) -> Result<Json<Vec<SpreadsheetFile>>, AppError> {
    Ok(Json(sheets::list_spreadsheets(state.sheets.as_ref()).await?))
}

/// List sheet names of a spreadsheet
async fn list_sheets(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Vec<String>>, AppError> {
    let ctx = context(id, None, &headers);
    Ok(Json(sheets::list_sheets(state.sheets.as_ref(), &ctx).await?))
}

/// Read a sheet with classified cells
async fn get_sheet(
    State(state): State<AppState>,
    Path((id, sheet)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Json<SheetView>, AppError> {
    let ctx = context(id, Some(sheet), &headers);
    Ok(Json(sheets::read_sheet(state.sheets.as_ref(), &ctx).await?))
}

/// Describe the new-entry form for a sheet
async fn get_form(
    State(state): State<AppState>,
    Path((id, sheet)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Json<EntryForm>, AppError> {
    let ctx = context(id, Some(sheet), &headers);
    Ok(Json(sheets::entry_form(state.sheets.as_ref(), &ctx).await?))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/spreadsheets", get(list_spreadsheets))
        .route("/api/spreadsheets/:id/sheets", get(list_sheets))
        .route("/api/spreadsheets/:id/sheets/:sheet", get(get_sheet))
        .route("/api/spreadsheets/:id/sheets/:sheet/form", get(get_form))
}
