mod charts;
mod entries;
mod health;
mod inputs;
mod payments;
mod spreadsheets;

use axum::http::HeaderMap;
use axum::Router;

use crate::session::RequestContext;
use crate::AppState;

/// Header naming the user an entry is added on behalf of
pub const USER_HEADER: &str = "x-instapp-user";

/// Create the API router
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(spreadsheets::router())
        .merge(entries::router())
        .merge(inputs::router())
        .merge(charts::router())
        .merge(payments::router())
}

fn context(spreadsheet_id: String, sheet: Option<String>, headers: &HeaderMap) -> RequestContext {
    let username = headers
        .get(USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string());
    let ctx = RequestContext::new(spreadsheet_id).with_username(username);
    match sheet {
        Some(sheet) => ctx.with_sheet(sheet),
        None => ctx,
    }
}
