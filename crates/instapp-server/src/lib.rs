pub mod api;
pub mod auth;
pub mod config;
pub mod credentials;
pub mod error;
pub mod payments;
pub mod retry;
pub mod services;
pub mod session;
pub mod sheets;
pub mod store;

use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::error::AppError;
use crate::payments::StripeClient;
use crate::retry::RetryPolicy;
use crate::sheets::SheetsClient;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub sheets: Arc<SheetsClient>,
    /// `None` when no Stripe keys are configured
    pub payments: Option<Arc<StripeClient>>,
    pub sweep_settle: Duration,
}

impl AppState {
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let retry = RetryPolicy::new(config.retry_attempts, config.retry_base_delay);
        let sheets = SheetsClient::new(config.service_account.clone(), retry, config.read_timeout)?;
        let payments = match &config.stripe {
            Some(keys) => Some(Arc::new(StripeClient::new(keys.clone(), &config.public_base_url)?)),
            None => {
                tracing::warn!("Stripe keys not set, payments disabled");
                None
            }
        };

        Ok(Self {
            sheets: Arc::new(sheets),
            payments,
            sweep_settle: config.sweep_settle,
        })
    }
}

/// Build the router with its middleware
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(api::router())
        .layer(
            ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            ),
        )
        .with_state(state)
}

/// Run the server with the given configuration
pub async fn run_server(config: Config) -> anyhow::Result<()> {
    let state = AppState::from_config(&config)?;
    tracing::info!(
        client_email = %state.sheets.client_email(),
        payments = state.payments.is_some(),
        "Clients initialised"
    );

    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app(state)).await?;

    Ok(())
}
