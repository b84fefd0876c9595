use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::config::CACHE_TTL_SECS;
use crate::version::types::VersionSet;

/// A fetched version set and the moment it was stored
#[derive(Debug, Clone)]
struct CacheEntry {
    version_set: Arc<VersionSet>,
    fetched_at: Instant,
}

/// Time-bounded store of the last fetched version set per cluster type
///
/// Entries are immutable snapshots: readers get an `Arc` to a complete set and
/// writers replace whole entries under the write lock.
pub struct VersionCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl Default for VersionCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(CACHE_TTL_SECS))
    }
}

impl VersionCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    // A panicking writer cannot leave a half-written entry behind, so the
    // data behind a poisoned lock is still consistent.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns the cached set for `cluster_type` if it is younger than `max_age`
    pub fn get(&self, cluster_type: &str, max_age: Duration) -> Option<Arc<VersionSet>> {
        let entries = self.read();
        let entry = entries.get(cluster_type)?;
        let age = entry.fetched_at.elapsed();

        if age < max_age {
            debug!(
                "Cache hit for {} (age {}s)",
                cluster_type,
                age.as_secs()
            );
            Some(Arc::clone(&entry.version_set))
        } else {
            debug!("Cache entry for {} expired", cluster_type);
            None
        }
    }

    /// Returns the cached set if it is within the configured TTL
    pub fn get_fresh(&self, cluster_type: &str) -> Option<Arc<VersionSet>> {
        self.get(cluster_type, self.ttl)
    }

    /// Stores `version_set` under its cluster type, stamped with the current time
    pub fn put(&self, version_set: VersionSet) -> Arc<VersionSet> {
        let version_set = Arc::new(version_set);
        debug!(
            "Caching {} versions for {}",
            version_set.len(),
            version_set.cluster_type
        );

        self.write().insert(
            version_set.cluster_type.clone(),
            CacheEntry {
                version_set: Arc::clone(&version_set),
                fetched_at: Instant::now(),
            },
        );
        version_set
    }

    pub fn invalidate(&self, cluster_type: &str) {
        self.write().remove(cluster_type);
    }

    pub fn clear(&self) {
        self.write().clear();
    }
}
