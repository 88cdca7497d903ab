//! Service-account OAuth.
//!
//! A JWT signed with the account's RSA key is exchanged at the token
//! endpoint for a short-lived bearer token.

use async_trait::async_trait;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use super::error::SheetsError;

/// Spreadsheet read/write.
pub const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
/// File management, needed for the folder move.
pub const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: usize = 3600;
// Refresh this long before the reported expiry.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Source of bearer tokens for the API client.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<String, SheetsError>;
}

/// Fixed token, for tests and pre-issued credentials.
#[derive(Debug, Clone)]
pub struct StaticToken(pub String);

#[async_trait]
impl AccessTokenProvider for StaticToken {
    async fn access_token(&self) -> Result<String, SheetsError> {
        Ok(self.0.clone())
    }
}

/// JWT assertion claims.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AssertionClaims {
    /// Service-account email
    pub iss: String,
    /// Space-separated scopes
    pub scope: String,
    /// Token endpoint
    pub aud: String,
    /// Issued at (Unix timestamp)
    pub iat: usize,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

struct CachedToken {
    token: String,
    expires_at: Instant,
}

/// Service-account token provider with an in-memory cache.
pub struct ServiceAccountAuth {
    email: String,
    key: EncodingKey,
    token_url: String,
    scopes: Vec<String>,
    http: reqwest::Client,
    cached: Mutex<Option<CachedToken>>,
}

impl ServiceAccountAuth {
    /// Build from the account email and an RSA private key in PEM form.
    pub fn new(
        email: impl Into<String>,
        private_key_pem: &str,
        token_url: impl Into<String>,
        http: reqwest::Client,
    ) -> Result<Self, SheetsError> {
        let key = EncodingKey::from_rsa_pem(private_key_pem.as_bytes())
            .map_err(|e| SheetsError::InvalidKey(e.to_string()))?;

        Ok(Self {
            email: email.into(),
            key,
            token_url: token_url.into(),
            scopes: vec![SPREADSHEETS_SCOPE.to_string(), DRIVE_SCOPE.to_string()],
            http,
            cached: Mutex::new(None),
        })
    }

    /// Claims for an assertion issued at `now` (Unix seconds).
    pub fn claims(&self, now: usize) -> AssertionClaims {
        AssertionClaims {
            iss: self.email.clone(),
            scope: self.scopes.join(" "),
            aud: self.token_url.clone(),
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        }
    }

    /// Sign an RS256 assertion.
    pub fn signed_assertion(&self) -> Result<String, SheetsError> {
        let now = chrono::Utc::now().timestamp() as usize;
        encode(&Header::new(Algorithm::RS256), &self.claims(now), &self.key)
            .map_err(|e| SheetsError::Auth(e.to_string()))
    }

    async fn exchange(&self) -> Result<CachedToken, SheetsError> {
        let assertion = self.signed_assertion()?;

        let response = self
            .http
            .post(&self.token_url)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SheetsError::Auth(format!("status {}: {}", status.as_u16(), body)));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|_| SheetsError::UnexpectedResponse("token endpoint"))?;
        let lifetime = Duration::from_secs(token.expires_in.unwrap_or(3600));

        tracing::debug!(lifetime_secs = lifetime.as_secs(), "Access token issued");
        Ok(CachedToken {
            token: token.access_token,
            expires_at: Instant::now() + lifetime.saturating_sub(EXPIRY_MARGIN),
        })
    }
}

#[async_trait]
impl AccessTokenProvider for ServiceAccountAuth {
    async fn access_token(&self) -> Result<String, SheetsError> {
        let mut cached = self.cached.lock().await;
        if let Some(entry) = cached.as_ref() {
            if Instant::now() < entry.expires_at {
                return Ok(entry.token.clone());
            }
        }

        let fresh = self.exchange().await?;
        let token = fresh.token.clone();
        *cached = Some(fresh);
        Ok(token)
    }
}
