//! Fetch chain for supported versions
//!
//! Order: fresh cache entry, then the primary source (which retries transient
//! failures itself), then the optional fallback. A set obtained from either
//! source is cached before it is returned.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::version::cache::VersionCache;
use crate::version::error::{FetchError, ResolveError};
use crate::version::registry::{FallbackSource, VersionSource};
use crate::version::types::VersionSet;

pub struct VersionFetcher {
    primary: Arc<dyn VersionSource>,
    fallback: Option<Arc<dyn FallbackSource>>,
    cache: VersionCache,
}

impl VersionFetcher {
    pub fn new(
        primary: Arc<dyn VersionSource>,
        fallback: Option<Arc<dyn FallbackSource>>,
        cache: VersionCache,
    ) -> Self {
        Self {
            primary,
            fallback,
            cache,
        }
    }

    pub fn cache(&self) -> &VersionCache {
        &self.cache
    }

    /// Worst-case time of an uncached `fetch`: the primary source exhausting
    /// its retries followed by the fallback running to its timeout.
    ///
    /// `None` when any configured source cannot bound its own duration.
    pub fn max_fetch_duration(&self) -> Option<Duration> {
        let primary = self.primary.max_duration()?;
        match &self.fallback {
            Some(fallback) => Some(primary + fallback.max_duration()?),
            None => Some(primary),
        }
    }

    /// Supported versions for `cluster_type`
    ///
    /// With `force_refresh` the cache is bypassed (but still updated).
    pub async fn fetch(
        &self,
        cluster_type: &str,
        force_refresh: bool,
    ) -> Result<Arc<VersionSet>, ResolveError> {
        if !force_refresh {
            if let Some(cached) = self.cache.get_fresh(cluster_type) {
                return Ok(cached);
            }
        }

        let cause = match self.primary.fetch_versions(cluster_type).await {
            Ok(set) => return Ok(self.cache.put(set)),
            Err(FetchError::Authorization { status, body }) => {
                error!(
                    "{} rejected credentials for {} with status {}",
                    self.primary.name(),
                    cluster_type,
                    status
                );
                return Err(ResolveError::Authorization { status, body });
            }
            Err(e) => {
                warn!(
                    "{} failed for {}: {}",
                    self.primary.name(),
                    cluster_type,
                    e
                );
                e
            }
        };

        let Some(fallback) = &self.fallback else {
            debug!("No fallback configured for {}", cluster_type);
            return Err(ResolveError::FetchExhausted {
                cluster_type: cluster_type.to_string(),
                source: cause,
            });
        };

        match fallback.list_versions(cluster_type).await {
            Some(set) => {
                info!(
                    "Using {} versions for {} from {}",
                    set.len(),
                    cluster_type,
                    fallback.name()
                );
                Ok(self.cache.put(set))
            }
            None => {
                error!(
                    "All version sources failed for {}; last error: {}",
                    cluster_type, cause
                );
                Err(ResolveError::FetchExhausted {
                    cluster_type: cluster_type.to_string(),
                    source: cause,
                })
            }
        }
    }
}
