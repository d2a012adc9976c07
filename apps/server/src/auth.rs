//! Bearer-token acquisition for the FHIR repository.
//!
//! The upstream repository sits behind an identity service; access tokens
//! come from the OAuth2 client-credentials flow. Tokens are cached
//! in-process and refreshed shortly before expiry; the identity service
//! owns actual token lifetime.

use crate::{config::FhirConfig, Error, Result};
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Refresh this long before the reported expiry.
const EXPIRY_MARGIN_SECONDS: i64 = 60;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

/// Process-wide credential handle, cloned into every request path.
#[derive(Clone)]
pub struct TokenProvider {
    http: Client,
    config: Arc<FhirConfig>,
    cache: Arc<RwLock<Option<CachedToken>>>,
}

impl TokenProvider {
    pub fn new(http: Client, config: Arc<FhirConfig>) -> Self {
        Self {
            http,
            config,
            cache: Arc::new(RwLock::new(None)),
        }
    }

    /// Current bearer token, fetching a fresh one when the cache is cold or
    /// about to expire.
    pub async fn bearer_token(&self) -> Result<String> {
        if let Some(token) = &self.config.static_token {
            return Ok(token.clone());
        }

        if let Some(cached) = self.cache.read().await.as_ref() {
            if cached.expires_at > Utc::now() {
                return Ok(cached.token.clone());
            }
        }

        let mut guard = self.cache.write().await;
        // Another request may have refreshed while we waited for the lock.
        if let Some(cached) = guard.as_ref() {
            if cached.expires_at > Utc::now() {
                return Ok(cached.token.clone());
            }
        }

        let fresh = self.fetch_token().await?;
        let token = fresh.token.clone();
        *guard = Some(fresh);
        Ok(token)
    }

    async fn fetch_token(&self) -> Result<CachedToken> {
        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("scope", self.config.scope.as_str()),
        ];

        let response = self
            .http
            .post(self.config.token_url())
            .form(&params)
            .send()
            .await
            .map_err(|e| Error::Token(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Token(format!(
                "identity service returned {status}: {body}"
            )));
        }

        let parsed: TokenResponse = response
            .json()
            .await
            .map_err(|e| Error::Token(e.to_string()))?;

        let lifetime = parsed.expires_in.unwrap_or(3600);
        let expires_at = Utc::now() + Duration::seconds((lifetime - EXPIRY_MARGIN_SECONDS).max(0));

        tracing::debug!(expires_at = %expires_at, "Acquired FHIR access token");

        Ok(CachedToken {
            token: parsed.access_token,
            expires_at,
        })
    }
}
