//! Stripe checkout sessions and payment intents.

use instapp_core::ValidationError;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::credentials::{key_prefix, StripeKeys};
use crate::error::AppError;

const STRIPE_API: &str = "https://api.stripe.com/v1";

/// Dollars to integer cents
pub fn to_cents(amount: f64) -> Result<i64, ValidationError> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(ValidationError::InvalidNumber {
            field: "amount".to_string(),
            value: amount.to_string(),
        });
    }
    Ok((amount * 100.0).round() as i64)
}

pub fn from_cents(cents: i64) -> f64 {
    cents as f64 / 100.0
}

/// What the checkout is paying for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub amount: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub spreadsheet_id: String,
    /// Sheet row the payment settles
    pub row_number: u32,
}

fn default_currency() -> String {
    "usd".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub session_id: String,
    pub session_url: Option<String>,
    pub publishable_key: String,
    pub success_url: String,
    pub cancel_url: String,
}

/// A checkout session as Stripe reports it
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: Option<String>,
    pub status: Option<String>,
    pub payment_status: Option<String>,
    pub amount_total: Option<i64>,
    pub currency: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl CheckoutSession {
    pub fn is_paid(&self) -> bool {
        self.payment_status.as_deref() == Some("paid")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentStatus {
    pub status: String,
    /// Dollars
    pub amount: f64,
    pub currency: String,
}

/// Amount and currency for a bare payment intent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentRequest {
    pub amount: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentResponse {
    pub intent_id: String,
    pub client_secret: Option<String>,
    pub publishable_key: String,
}

#[derive(Deserialize)]
struct PaymentIntent {
    id: String,
    status: String,
    amount: i64,
    currency: String,
    client_secret: Option<String>,
}

#[derive(Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Deserialize)]
struct StripeErrorDetail {
    message: Option<String>,
}

pub struct StripeClient {
    http: reqwest::Client,
    keys: StripeKeys,
    public_base_url: String,
}

impl StripeClient {
    pub fn new(keys: StripeKeys, public_base_url: &str) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| AppError::Configuration(format!("failed to build HTTP client: {e}")))?;
        tracing::info!(
            secret = %key_prefix(&keys.secret_key),
            publishable = %key_prefix(&keys.publishable_key),
            "Payment client initialised"
        );
        Ok(Self {
            http,
            keys,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn publishable_key(&self) -> &str {
        &self.keys.publishable_key
    }

    fn return_urls(&self) -> (String, String) {
        (
            format!(
                "{}/?payment=success&session_id={{CHECKOUT_SESSION_ID}}",
                self.public_base_url
            ),
            format!("{}/?payment=cancelled", self.public_base_url),
        )
    }

    fn url(&self, segments: &[&str]) -> Result<Url, AppError> {
        let mut url = Url::parse(STRIPE_API).map_err(|e| AppError::Internal(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| AppError::Internal(format!("cannot extend {STRIPE_API}")))?
            .extend(segments);
        Ok(url)
    }

    async fn parse<T: for<'de> Deserialize<'de>>(resp: reqwest::Response) -> Result<T, AppError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp.json().await?);
        }
        if status.is_server_error() {
            return Err(AppError::TransientNetwork(format!("payment gateway returned {status}")));
        }
        let message = resp
            .json::<StripeErrorBody>()
            .await
            .ok()
            .and_then(|body| body.error.message)
            .unwrap_or_else(|| status.to_string());
        tracing::error!(%status, %message, "Stripe request failed");
        Err(AppError::Payment(message))
    }

    /// Create a one-line-item card checkout for `request.amount` dollars.
    pub async fn create_checkout(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutResponse, AppError> {
        let cents = to_cents(request.amount)?;
        let (success_url, cancel_url) = self.return_urls();

        let form: Vec<(&str, String)> = vec![
            ("mode", "payment".to_string()),
            ("payment_method_types[0]", "card".to_string()),
            ("line_items[0][quantity]", "1".to_string()),
            ("line_items[0][price_data][currency]", request.currency.clone()),
            ("line_items[0][price_data][unit_amount]", cents.to_string()),
            ("line_items[0][price_data][product_data][name]", "Payment".to_string()),
            (
                "line_items[0][price_data][product_data][description]",
                "Form submission payment".to_string(),
            ),
            ("success_url", success_url.clone()),
            ("cancel_url", cancel_url.clone()),
            ("metadata[spreadsheet_id]", request.spreadsheet_id.clone()),
            ("metadata[row_number]", request.row_number.to_string()),
        ];

        let resp = self
            .http
            .post(self.url(&["checkout", "sessions"])?)
            .bearer_auth(&self.keys.secret_key)
            .form(&form)
            .send()
            .await?;
        let session: CheckoutSession = Self::parse(resp).await?;

        tracing::info!(
            session_id = %session.id,
            cents,
            row = request.row_number,
            "Created checkout session"
        );
        Ok(CheckoutResponse {
            session_id: session.id,
            session_url: session.url,
            publishable_key: self.keys.publishable_key.clone(),
            success_url,
            cancel_url,
        })
    }

    /// Create a card payment intent for `request.amount` dollars.
    pub async fn create_intent(&self, request: &IntentRequest) -> Result<IntentResponse, AppError> {
        let cents = to_cents(request.amount)?;
        let form = [
            ("amount", cents.to_string()),
            ("currency", request.currency.clone()),
            ("payment_method_types[0]", "card".to_string()),
        ];

        let resp = self
            .http
            .post(self.url(&["payment_intents"])?)
            .bearer_auth(&self.keys.secret_key)
            .form(&form)
            .send()
            .await?;
        let intent: PaymentIntent = Self::parse(resp).await?;

        tracing::info!(intent_id = %intent.id, cents, "Created payment intent");
        Ok(IntentResponse {
            intent_id: intent.id,
            client_secret: intent.client_secret,
            publishable_key: self.keys.publishable_key.clone(),
        })
    }

    pub async fn checkout_session(&self, session_id: &str) -> Result<CheckoutSession, AppError> {
        let resp = self
            .http
            .get(self.url(&["checkout", "sessions", session_id])?)
            .bearer_auth(&self.keys.secret_key)
            .send()
            .await?;
        Self::parse(resp).await
    }

    /// Status of a payment intent, amount converted back to dollars.
    pub async fn payment_status(&self, intent_id: &str) -> Result<PaymentStatus, AppError> {
        let resp = self
            .http
            .get(self.url(&["payment_intents", intent_id])?)
            .bearer_auth(&self.keys.secret_key)
            .send()
            .await?;
        let intent: PaymentIntent = Self::parse(resp).await?;
        Ok(PaymentStatus {
            status: intent.status,
            amount: from_cents(intent.amount),
            currency: intent.currency,
        })
    }
}
