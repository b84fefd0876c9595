//! Control-plane upgrade graph API implementation

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::{info, warn};

use crate::config::{HTTP_TIMEOUT_MS, ResolverConfig};
use crate::version::error::{FetchError, is_transient_status};
use crate::version::registry::VersionSource;
use crate::version::retry::RetryPolicy;
use crate::version::token::TokenProvider;
use crate::version::types::{DEFAULT_CHANNEL, VersionRecord, VersionSet};

/// Path of the upgrade graph endpoint, relative to the API base URL
const GRAPH_PATH: &str = "/api/upgrades_info/v1/graph";

/// Response from the upgrade graph API
#[derive(Debug, Deserialize)]
struct GraphResponse {
    nodes: Vec<GraphNode>,
}

#[derive(Debug, Deserialize)]
struct GraphNode {
    version: String,
    available: Option<bool>,
    channel: Option<String>,
}

/// Version source backed by the control-plane REST API
pub struct OcmRegistry {
    client: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn TokenProvider>,
    retry: RetryPolicy,
}

impl OcmRegistry {
    /// Creates a new OcmRegistry with a custom base URL
    pub fn new(base_url: &str, tokens: Arc<dyn TokenProvider>, retry: RetryPolicy) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("cluster-version-resolver")
                .timeout(Duration::from_millis(HTTP_TIMEOUT_MS))
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens,
            retry,
        }
    }

    pub fn from_config(config: &ResolverConfig, tokens: Arc<dyn TokenProvider>) -> Self {
        Self::new(&config.api_url, tokens, RetryPolicy::from(&config.retry))
    }

    async fn fetch_graph(&self, token: &str, cluster_type: &str) -> Result<VersionSet, FetchError> {
        let url = format!("{}{}", self.base_url, GRAPH_PATH);

        let response = self
            .client
            .get(&url)
            .query(&[("type", cluster_type)])
            .bearer_auth(token)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let code = status.as_u16();
            let body = response.text().await.unwrap_or_default();

            if code == 401 || code == 403 {
                return Err(FetchError::Authorization { status: code, body });
            }
            if !is_transient_status(code) {
                warn!("Version API returned status {}: {}", status, url);
            }
            return Err(FetchError::Status { status: code, body });
        }

        let graph: GraphResponse = response.json().await.map_err(|e| {
            warn!("Failed to parse upgrade graph response: {}", e);
            FetchError::InvalidResponse(e.to_string())
        })?;

        let records = graph
            .nodes
            .into_iter()
            .map(|node| {
                VersionRecord::new(
                    &node.version,
                    node.available.unwrap_or(true),
                    node.channel.as_deref().unwrap_or(DEFAULT_CHANNEL),
                    cluster_type,
                )
            })
            .collect();

        Ok(VersionSet::new(cluster_type, records))
    }
}

#[async_trait::async_trait]
impl VersionSource for OcmRegistry {
    fn name(&self) -> &'static str {
        "ocm"
    }

    async fn fetch_versions(&self, cluster_type: &str) -> Result<VersionSet, FetchError> {
        let token = self.tokens.access_token().await?;

        let set = match self
            .retry
            .run("fetch versions", || self.fetch_graph(&token, cluster_type))
            .await
        {
            Err(FetchError::Authorization { status, .. }) => {
                // The cached token may have been revoked before it expired
                warn!(
                    "Version API rejected the access token with status {}, re-authenticating",
                    status
                );
                self.tokens.invalidate(&token).await;
                let fresh = self.tokens.access_token().await?;
                self.fetch_graph(&fresh, cluster_type).await?
            }
            result => result?,
        };

        info!(
            "Fetched {} versions for {} from the control plane",
            set.len(),
            cluster_type
        );
        Ok(set)
    }

    /// Two token acquisitions, the retried graph call and the single
    /// re-authenticated attempt
    fn max_duration(&self) -> Option<Duration> {
        let http_timeout = Duration::from_millis(HTTP_TIMEOUT_MS);
        Some(
            self.tokens.max_duration() * 2
                + self.retry.max_total_duration(http_timeout)
                + http_timeout,
        )
    }
}
