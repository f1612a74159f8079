//! OAuth2 access tokens for a service account (JWT bearer grant).

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::credentials::ServiceAccountKey;
use crate::error::AppError;

pub const SCOPES: [&str; 3] = [
    "https://www.googleapis.com/auth/spreadsheets.readonly",
    "https://www.googleapis.com/auth/spreadsheets",
    "https://www.googleapis.com/auth/drive.metadata.readonly",
];

const GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME: i64 = 3600;
/// Refresh this long before the token actually expires
const EXPIRY_MARGIN: i64 = 60;

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: String,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - Duration::seconds(EXPIRY_MARGIN) > now
    }
}

/// Signs assertions with the service-account key and caches the bearer token.
pub struct TokenProvider {
    key: ServiceAccountKey,
    cache: Mutex<Option<CachedToken>>,
}

impl TokenProvider {
    pub fn new(key: ServiceAccountKey) -> Self {
        Self {
            key,
            cache: Mutex::new(None),
        }
    }

    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    /// A valid access token, fetching a new one when the cached token is
    /// missing or close to expiry.
    pub async fn token(&self, http: &reqwest::Client) -> Result<String, AppError> {
        let mut cache = self.cache.lock().await;
        let now = Utc::now();
        if let Some(token) = cache.as_ref().filter(|t| t.is_fresh(now)) {
            return Ok(token.value.clone());
        }

        let assertion = self.assertion(now)?;
        let resp = http
            .post(&self.key.token_uri)
            .form(&[("grant_type", GRANT_TYPE), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::error!(%status, "Token request rejected");
            return Err(AppError::Connection(format!(
                "authentication failed ({status}), check service account credentials: {body}"
            )));
        }

        let issued: TokenResponse = resp.json().await?;
        tracing::debug!(expires_in = issued.expires_in, "Fetched access token");
        let token = CachedToken {
            value: issued.access_token,
            expires_at: now + Duration::seconds(issued.expires_in),
        };
        let value = token.value.clone();
        *cache = Some(token);
        Ok(value)
    }

    fn assertion(&self, now: DateTime<Utc>) -> Result<String, AppError> {
        let claims = Claims {
            iss: &self.key.client_email,
            scope: SCOPES.join(" "),
            aud: &self.key.token_uri,
            iat: now.timestamp(),
            exp: now.timestamp() + ASSERTION_LIFETIME,
        };
        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(self.key.private_key_id.clone());

        let signing_key = EncodingKey::from_rsa_pem(self.key.private_key.as_bytes())
            .map_err(|e| AppError::Configuration(format!("unusable private key: {e}")))?;
        jsonwebtoken::encode(&header, &claims, &signing_key)
            .map_err(|e| AppError::Configuration(format!("failed to sign token request: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_freshness_margin() {
        let now = Utc::now();
        let fresh = CachedToken {
            value: "t".into(),
            expires_at: now + Duration::seconds(600),
        };
        let stale = CachedToken {
            value: "t".into(),
            expires_at: now + Duration::seconds(30),
        };
        assert!(fresh.is_fresh(now));
        assert!(!stale.is_fresh(now));
    }

    #[test]
    fn test_bad_pem_is_configuration_error() {
        let key: ServiceAccountKey =
            serde_json::from_value(crate::credentials::tests::sample_key_json()).unwrap();
        let provider = TokenProvider::new(key);
        assert!(matches!(
            provider.assertion(Utc::now()),
            Err(AppError::Configuration(_))
        ));
    }
}
