//! Offline-token to bearer-token exchange

#[cfg(test)]
use mockall::automock;

use std::time::Duration;

use serde::Deserialize;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::{
    DEFAULT_TOKEN_LIFETIME_SECS, HTTP_TIMEOUT_MS, ResolverConfig, TOKEN_EXPIRY_SKEW_SECS,
};
use crate::version::error::{FetchError, is_transient_status};
use crate::version::retry::RetryPolicy;

/// Source of short-lived bearer tokens for the control-plane API
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait TokenProvider: Send + Sync {
    /// Returns a bearer token valid for at least the next request
    async fn access_token(&self) -> Result<String, FetchError>;

    /// Drops `token` from the cache if it is still the current one, so the
    /// next `access_token` call performs a fresh exchange
    async fn invalidate(&self, token: &str);

    /// Worst-case wall-clock time of one `access_token` call
    fn max_duration(&self) -> Duration;
}

/// Response from the SSO token endpoint
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<u64>,
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

/// Refresh-token grant against an OpenID Connect token endpoint
pub struct SsoTokenProvider {
    client: reqwest::Client,
    token_url: String,
    client_id: String,
    offline_token: Option<String>,
    retry: RetryPolicy,
    cached: Mutex<Option<CachedToken>>,
}

impl SsoTokenProvider {
    pub fn new(
        token_url: &str,
        client_id: &str,
        offline_token: Option<String>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("cluster-version-resolver")
                .timeout(Duration::from_millis(HTTP_TIMEOUT_MS))
                .build()
                .expect("Failed to create HTTP client"),
            token_url: token_url.to_string(),
            client_id: client_id.to_string(),
            offline_token,
            retry,
            cached: Mutex::new(None),
        }
    }

    pub fn from_config(config: &ResolverConfig) -> Self {
        Self::new(
            &config.token_url,
            &config.client_id,
            config.offline_token.clone(),
            RetryPolicy::from(&config.retry),
        )
    }

    async fn exchange(&self, offline_token: &str) -> Result<CachedToken, FetchError> {
        let response = self
            .client
            .post(&self.token_url)
            .form(&[
                ("grant_type", "refresh_token"),
                ("client_id", self.client_id.as_str()),
                ("refresh_token", offline_token),
            ])
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if is_transient_status(status.as_u16()) {
                return Err(FetchError::Status {
                    status: status.as_u16(),
                    body,
                });
            }
            warn!("Token exchange rejected with status {}", status);
            return Err(FetchError::Authorization {
                status: status.as_u16(),
                body,
            });
        }

        let token: TokenResponse = response.json().await.map_err(|e| {
            warn!("Failed to parse token response: {}", e);
            FetchError::InvalidResponse(e.to_string())
        })?;

        let lifetime = token
            .expires_in
            .unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS)
            .saturating_sub(TOKEN_EXPIRY_SKEW_SECS);

        Ok(CachedToken {
            value: token.access_token,
            expires_at: Instant::now() + Duration::from_secs(lifetime),
        })
    }
}

impl Default for SsoTokenProvider {
    fn default() -> Self {
        Self::from_config(&ResolverConfig::default())
    }
}

#[async_trait::async_trait]
impl TokenProvider for SsoTokenProvider {
    async fn access_token(&self) -> Result<String, FetchError> {
        let offline_token = self
            .offline_token
            .as_deref()
            .ok_or(FetchError::MissingCredentials)?;

        // Held across the exchange so concurrent callers share one refresh
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref().filter(|t| t.expires_at > Instant::now()) {
            debug!("Reusing cached access token");
            return Ok(token.value.clone());
        }

        let fresh = self
            .retry
            .run("token exchange", || self.exchange(offline_token))
            .await?;
        info!("Obtained new access token");

        let value = fresh.value.clone();
        *cached = Some(fresh);
        Ok(value)
    }

    async fn invalidate(&self, token: &str) {
        let mut cached = self.cached.lock().await;
        if cached.as_ref().is_some_and(|t| t.value == token) {
            debug!("Discarding rejected access token");
            *cached = None;
        }
    }

    fn max_duration(&self) -> Duration {
        self.retry
            .max_total_duration(Duration::from_millis(HTTP_TIMEOUT_MS))
    }
}
