use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusResponse {
    connected: bool,
    client_email: String,
    payments_enabled: bool,
    error: Option<String>,
}

/// Whether the service account can currently authenticate
async fn connection_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let error = state.sheets.check_connection().await.err().map(|e| {
        tracing::warn!(error = %e, "Connection check failed");
        e.to_string()
    });

    Json(StatusResponse {
        connected: error.is_none(),
        client_email: state.sheets.client_email().to_string(),
        payments_enabled: state.payments.is_some(),
        error,
    })
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/status", get(connection_status))
}
