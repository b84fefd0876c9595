//! Version source test utilities

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use cluster_version_resolver::version::error::FetchError;
use cluster_version_resolver::version::registry::{FallbackSource, VersionSource};
use cluster_version_resolver::version::service::VersionService;
use cluster_version_resolver::version::types::VersionSet;

/// Primary source returning fixed identifiers (or failing), counting calls
pub struct MockSource {
    identifiers: Option<Vec<String>>,
    calls: Arc<AtomicUsize>,
}

impl MockSource {
    pub fn with_versions(identifiers: &[&str]) -> Self {
        Self {
            identifiers: Some(identifiers.iter().map(|v| v.to_string()).collect()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A source whose every call fails with a 503 (as after exhausted retries)
    pub fn unavailable() -> Self {
        Self {
            identifiers: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl VersionSource for MockSource {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn fetch_versions(&self, cluster_type: &str) -> Result<VersionSet, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        // Suspend like a network call so concurrent callers interleave
        tokio::task::yield_now().await;
        match &self.identifiers {
            Some(ids) => {
                let ids: Vec<&str> = ids.iter().map(String::as_str).collect();
                Ok(VersionSet::from_identifiers(cluster_type, &ids))
            }
            None => Err(FetchError::Status {
                status: 503,
                body: "service unavailable".to_string(),
            }),
        }
    }
}

/// Fallback source returning fixed identifiers (or nothing), counting calls
pub struct MockFallback {
    identifiers: Option<Vec<String>>,
    calls: Arc<AtomicUsize>,
}

impl MockFallback {
    pub fn with_versions(identifiers: &[&str]) -> Self {
        Self {
            identifiers: Some(identifiers.iter().map(|v| v.to_string()).collect()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn empty() -> Self {
        Self {
            identifiers: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl FallbackSource for MockFallback {
    fn name(&self) -> &'static str {
        "mock-cli"
    }

    async fn list_versions(&self, cluster_type: &str) -> Option<VersionSet> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let ids: Vec<&str> = self.identifiers.as_ref()?.iter().map(String::as_str).collect();
        Some(VersionSet::from_identifiers(cluster_type, &ids))
    }
}

/// Service over the given sources with the default TTL and channel
pub fn create_test_service(source: MockSource, fallback: Option<MockFallback>) -> VersionService {
    VersionService::build(
        Arc::new(source),
        fallback.map(|f| Arc::new(f) as Arc<dyn FallbackSource>),
        Duration::from_secs(3600),
        "stable",
    )
}
