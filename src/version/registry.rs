//! Traits for the sources that can list supported versions

#[cfg(test)]
use mockall::automock;

use std::time::Duration;

use crate::version::error::FetchError;
use crate::version::types::VersionSet;

/// Primary source of supported versions (the control-plane API)
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait VersionSource: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Fetches every version the source knows for `cluster_type`
    ///
    /// # Returns
    /// * `Ok(VersionSet)` - Records in the order the source returned them
    /// * `Err(FetchError)` - Transient errors have already been retried
    async fn fetch_versions(&self, cluster_type: &str) -> Result<VersionSet, FetchError>;

    /// Upper bound on one `fetch_versions` call, retries included, if known
    fn max_duration(&self) -> Option<Duration> {
        None
    }
}

/// Secondary source consulted when the primary one fails
///
/// A fallback is optional equipment: when it cannot answer it returns `None`
/// instead of an error.
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait FallbackSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn list_versions(&self, cluster_type: &str) -> Option<VersionSet>;

    /// Upper bound on one `list_versions` call, if known
    fn max_duration(&self) -> Option<Duration> {
        None
    }
}
