use anyhow::Context;
use std::env;
use std::time::Duration;

use crate::credentials::{key_prefix, ServiceAccountKey, StripeKeys};

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Google service-account key
    pub service_account: ServiceAccountKey,
    /// Payments are disabled without keys
    pub stripe: Option<StripeKeys>,
    /// Base for checkout success and cancel URLs
    pub public_base_url: String,
    pub retry_attempts: u32,
    pub retry_base_delay: Duration,
    pub read_timeout: Duration,
    /// Pause between writing a sweep input and reading outputs
    pub sweep_settle: Duration,
}

fn var_or<T: std::str::FromStr>(name: &str, default: T) -> anyhow::Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw.trim().parse().with_context(|| format!("invalid {name}: {raw}")),
        Err(_) => Ok(default),
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = var_or("PORT", 3000u16)?;

        let key_json = match env::var("GOOGLE_SERVICE_ACCOUNT_JSON") {
            Ok(json) => json,
            Err(_) => {
                let path = env::var("GOOGLE_SERVICE_ACCOUNT_FILE").context(
                    "GOOGLE_SERVICE_ACCOUNT_JSON or GOOGLE_SERVICE_ACCOUNT_FILE must be set",
                )?;
                std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read service account file {path}"))?
            }
        };
        let service_account = ServiceAccountKey::from_json(&key_json)?;

        let stripe = match (env::var("STRIPE_SECRET_KEY"), env::var("STRIPE_PUBLISHABLE_KEY")) {
            (Ok(secret), Ok(publishable)) => {
                let keys = StripeKeys::new(secret, publishable)?;
                tracing::info!(
                    secret = %key_prefix(&keys.secret_key),
                    publishable = %key_prefix(&keys.publishable_key),
                    "Stripe keys loaded"
                );
                Some(keys)
            }
            (Err(_), Err(_)) => None,
            _ => anyhow::bail!("STRIPE_SECRET_KEY and STRIPE_PUBLISHABLE_KEY must be set together"),
        };

        let public_base_url = env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("http://localhost:{port}"))
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            host,
            port,
            service_account,
            stripe,
            public_base_url,
            retry_attempts: var_or("SHEETS_RETRY_ATTEMPTS", 3u32)?,
            retry_base_delay: Duration::from_millis(var_or("SHEETS_RETRY_BASE_MS", 1000u64)?),
            read_timeout: Duration::from_secs(var_or("SHEETS_READ_TIMEOUT_SECS", 30u64)?),
            sweep_settle: Duration::from_millis(var_or("SWEEP_SETTLE_MS", 1000u64)?),
        })
    }
}
