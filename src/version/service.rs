//! Version resolution service
//!
//! Groups the fetch chain and the resolution policy behind one handle that is
//! built once and passed to every consumer.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::config::ResolverConfig;
use crate::version::cache::VersionCache;
use crate::version::error::ResolveError;
use crate::version::fetcher::VersionFetcher;
use crate::version::registries::{OcmRegistry, RosaCliRegistry};
use crate::version::registry::{FallbackSource, VersionSource};
use crate::version::resolver::ResolutionPolicy;
use crate::version::token::{SsoTokenProvider, TokenProvider};
use crate::version::types::{ResolutionOutcome, ResolutionRequest, VersionSet};

/// What consumers need to know about supported versions
#[async_trait::async_trait]
pub trait VersionCatalog: Send + Sync {
    /// Supported versions for `cluster_type`, from cache when fresh
    async fn fetch_versions(
        &self,
        cluster_type: &str,
        force_refresh: bool,
    ) -> Result<Arc<VersionSet>, ResolveError>;

    fn policy(&self) -> &ResolutionPolicy;

    async fn is_supported(&self, cluster_type: &str, version: &str) -> Result<bool, ResolveError> {
        let supported = self.fetch_versions(cluster_type, false).await?;
        Ok(self.policy().is_supported(version, &supported))
    }

    async fn get_latest(&self, cluster_type: &str) -> Result<String, ResolveError> {
        let supported = self.fetch_versions(cluster_type, false).await?;
        Ok(self.policy().latest(&supported)?.identifier().to_string())
    }

    async fn resolve(
        &self,
        request: &ResolutionRequest,
    ) -> Result<ResolutionOutcome, ResolveError> {
        let supported = self.fetch_versions(&request.cluster_type, false).await?;
        self.policy().resolve(
            request.input_version.as_deref(),
            &supported,
            request.auto_discover,
        )
    }
}

pub struct VersionService {
    fetcher: VersionFetcher,
    policy: ResolutionPolicy,
}

impl VersionService {
    pub fn new(fetcher: VersionFetcher, policy: ResolutionPolicy) -> Self {
        Self { fetcher, policy }
    }

    /// Build a service with custom sources
    pub fn build(
        primary: Arc<dyn VersionSource>,
        fallback: Option<Arc<dyn FallbackSource>>,
        cache_ttl: Duration,
        channel: &str,
    ) -> Self {
        Self::new(
            VersionFetcher::new(primary, fallback, VersionCache::new(cache_ttl)),
            ResolutionPolicy::new(channel),
        )
    }

    /// Wire the production sources from configuration
    pub fn from_config(config: &ResolverConfig) -> Self {
        let tokens: Arc<dyn TokenProvider> = Arc::new(SsoTokenProvider::from_config(config));
        let primary = Arc::new(OcmRegistry::from_config(config, tokens));
        let fallback = Arc::new(RosaCliRegistry::from_config(config));

        info!(
            "Version service using {} with fallback '{}'",
            config.api_url, config.cli_path
        );

        Self::build(
            primary,
            Some(fallback),
            Duration::from_secs(config.cache_ttl_secs),
            &config.channel,
        )
    }

    pub fn cache(&self) -> &VersionCache {
        self.fetcher.cache()
    }

    /// Upper bound on one uncached version lookup across token exchange,
    /// retried API calls and the fallback, for callers budgeting timeouts
    pub fn max_fetch_duration(&self) -> Option<Duration> {
        self.fetcher.max_fetch_duration()
    }
}

#[async_trait::async_trait]
impl VersionCatalog for VersionService {
    async fn fetch_versions(
        &self,
        cluster_type: &str,
        force_refresh: bool,
    ) -> Result<Arc<VersionSet>, ResolveError> {
        self.fetcher.fetch(cluster_type, force_refresh).await
    }

    fn policy(&self) -> &ResolutionPolicy {
        &self.policy
    }
}
