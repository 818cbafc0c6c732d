//! Non-interactive Google credentials

use std::time::{Duration, Instant};

use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Method;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info};
use weekplan_domain::constants::GOOGLE_API_SCOPES;
use weekplan_domain::{GoogleConfig, PlanError, Result, Secret};

use super::types::TokenResponse;
use crate::http::{ensure_success, HttpClient};

/// Refresh this long before the reported expiry
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Lifetime assumed when the token endpoint does not report one
const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(3600);

/// Longest lifetime Google accepts for a signed assertion
const ASSERTION_LIFETIME_SECS: i64 = 3600;

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

enum Credential {
    Static(Secret),
    ServiceAccount { client_email: String, key: EncodingKey, token_uri: String },
    Refresh {
        refresh_token: Secret,
        client_id: String,
        client_secret: Option<Secret>,
        token_uri: String,
    },
}

#[derive(Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

struct CachedToken {
    value: String,
    refresh_at: Instant,
}

/// Supplies bearer tokens for the Google APIs
///
/// A static token is returned as is. A service account signs an RS256
/// assertion for the JWT-bearer grant; a refresh token is exchanged with
/// the refresh grant. Exchanged tokens are cached until shortly before
/// they expire.
pub struct GoogleAuth {
    http_client: HttpClient,
    credential: Credential,
    cached: Mutex<Option<CachedToken>>,
}

impl GoogleAuth {
    /// Build from configuration
    ///
    /// Precedence: static access token, then service account, then refresh
    /// token.
    ///
    /// # Errors
    /// Returns `PlanError::Config` when no credential form is complete or
    /// the service account key is not a readable RSA PEM.
    pub fn from_config(config: &GoogleConfig, http_client: HttpClient) -> Result<Self> {
        let access_token = config.access_token.clone().filter(|token| !token.is_empty());
        let client_email = config.client_email.clone().filter(|email| !email.trim().is_empty());
        let private_key = config.private_key.as_ref().filter(|key| !key.is_empty());

        let credential = if let Some(token) = access_token {
            Credential::Static(token)
        } else if let (Some(client_email), Some(private_key)) = (client_email, private_key) {
            Credential::ServiceAccount {
                client_email,
                key: service_account_key(private_key)?,
                token_uri: config.token_uri.clone(),
            }
        } else {
            let refresh_token =
                config.refresh_token.clone().filter(|t| !t.is_empty()).ok_or_else(|| {
                    PlanError::config(
                        "google access token, service account or refresh token is required",
                    )
                })?;
            let client_id = config
                .client_id
                .clone()
                .filter(|id| !id.trim().is_empty())
                .ok_or_else(|| {
                    PlanError::config("google client id is required for the refresh grant")
                })?;
            Credential::Refresh {
                refresh_token,
                client_id,
                client_secret: config.client_secret.clone(),
                token_uri: config.token_uri.clone(),
            }
        };
        Ok(Self { http_client, credential, cached: Mutex::new(None) })
    }

    /// Static bearer token
    pub fn with_token(token: impl Into<String>, http_client: HttpClient) -> Self {
        Self {
            http_client,
            credential: Credential::Static(Secret::new(token)),
            cached: Mutex::new(None),
        }
    }

    /// Current bearer token, exchanging a new one when needed
    ///
    /// # Errors
    /// `PlanError::Auth` when the token endpoint rejects the grant;
    /// transport errors as usual.
    pub async fn access_token(&self) -> Result<String> {
        if let Credential::Static(token) = &self.credential {
            return Ok(token.expose().to_string());
        }

        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| Instant::now() < t.refresh_at) {
            return Ok(token.value.clone());
        }

        let fresh = self.fetch_token().await?;
        let value = fresh.value.clone();
        *cached = Some(fresh);
        Ok(value)
    }

    /// Drop a cached token so the next call exchanges a new one
    pub async fn invalidate(&self) {
        self.cached.lock().await.take();
    }

    async fn fetch_token(&self) -> Result<CachedToken> {
        match &self.credential {
            Credential::Static(token) => Ok(CachedToken {
                value: token.expose().to_string(),
                refresh_at: Instant::now() + DEFAULT_TOKEN_LIFETIME,
            }),
            Credential::ServiceAccount { client_email, key, token_uri } => {
                debug!(%token_uri, %client_email, "Requesting Google token for service account");
                let assertion = sign_assertion(client_email, key, token_uri)?;
                let form = [("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())];
                self.exchange(token_uri, &form).await
            }
            Credential::Refresh { refresh_token, client_id, client_secret, token_uri } => {
                debug!(%token_uri, "Refreshing Google access token");
                let mut form = vec![
                    ("grant_type", "refresh_token"),
                    ("refresh_token", refresh_token.expose()),
                    ("client_id", client_id.as_str()),
                ];
                if let Some(secret) = client_secret {
                    form.push(("client_secret", secret.expose()));
                }
                self.exchange(token_uri, &form).await
            }
        }
    }

    async fn exchange(&self, token_uri: &str, form: &[(&str, &str)]) -> Result<CachedToken> {
        let request = self.http_client.request(Method::POST, token_uri).form(form);
        let response =
            ensure_success(self.http_client.send(request).await?).await.map_err(|err| match err {
                PlanError::Api { status: 400, message } => {
                    PlanError::auth(format!("Token request rejected: {message}"))
                }
                other => other,
            })?;
        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| PlanError::auth(format!("Failed to parse token response: {e}")))?;

        let lifetime = token.expires_in.map_or(DEFAULT_TOKEN_LIFETIME, Duration::from_secs);
        info!(expires_in_secs = lifetime.as_secs(), "Obtained Google access token");
        Ok(CachedToken {
            value: token.access_token,
            refresh_at: Instant::now() + lifetime.saturating_sub(EXPIRY_MARGIN),
        })
    }
}

/// RSA signing key from a PEM that may carry literal `\n` sequences, as
/// keys pasted into a single environment variable often do
fn service_account_key(private_key: &Secret) -> Result<EncodingKey> {
    let pem = private_key.expose().replace("\\n", "\n");
    EncodingKey::from_rsa_pem(pem.as_bytes())
        .map_err(|e| PlanError::config(format!("google private key is not a valid RSA PEM: {e}")))
}

fn sign_assertion(client_email: &str, key: &EncodingKey, token_uri: &str) -> Result<String> {
    let iat = Utc::now().timestamp();
    let claims = AssertionClaims {
        iss: client_email,
        scope: GOOGLE_API_SCOPES,
        aud: token_uri,
        iat,
        exp: iat + ASSERTION_LIFETIME_SECS,
    };
    encode(&Header::new(Algorithm::RS256), &claims, key)
        .map_err(|e| PlanError::auth(format!("Failed to sign service account assertion: {e}")))
}
