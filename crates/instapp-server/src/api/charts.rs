use axum::{
    extract::{Path, State},
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use instapp_core::ChartDefinition;

use super::context;
use crate::error::AppError;
use crate::services::charts::{list_charts, run_sweep, SweepResult};
use crate::AppState;

async fn get_charts(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Vec<ChartDefinition>>, AppError> {
    let ctx = context(id, None, &headers);
    Ok(Json(list_charts(state.sheets.as_ref(), &ctx).await?))
}

/// Run a chart's parameter sweep against the live sheet
async fn sweep(
    State(state): State<AppState>,
    Path((id, name)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Json<SweepResult>, AppError> {
    let ctx = context(id, None, &headers);
    let result = run_sweep(state.sheets.as_ref(), &ctx, &name, state.sweep_settle).await?;
    Ok(Json(result))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/spreadsheets/:id/charts", get(get_charts))
        .route("/api/spreadsheets/:id/charts/:name/sweep", post(sweep))
}
