//! Common types shared by the fetchers, the cache and the resolution policy

use crate::version::semver::normalize_identifier;

/// Channel assumed when a source does not report one
pub const DEFAULT_CHANNEL: &str = "stable";

/// A single release identifier as reported by a version source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRecord {
    identifier: String,
    available: bool,
    channel: String,
    cluster_type: String,
}

impl VersionRecord {
    /// Creates a record, normalizing the identifier (e.g. `openshift-v4.15.0` -> `4.15.0`)
    pub fn new(identifier: &str, available: bool, channel: &str, cluster_type: &str) -> Self {
        Self {
            identifier: normalize_identifier(identifier),
            available,
            channel: channel.to_string(),
            cluster_type: cluster_type.to_string(),
        }
    }

    /// Creates an available record on the default channel
    pub fn stable(identifier: &str, cluster_type: &str) -> Self {
        Self::new(identifier, true, DEFAULT_CHANNEL, cluster_type)
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn available(&self) -> bool {
        self.available
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn cluster_type(&self) -> &str {
        &self.cluster_type
    }
}

/// Versions for one cluster type, in the order the source returned them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionSet {
    pub cluster_type: String,
    pub records: Vec<VersionRecord>,
}

impl VersionSet {
    pub fn new(cluster_type: &str, records: Vec<VersionRecord>) -> Self {
        Self {
            cluster_type: cluster_type.to_string(),
            records,
        }
    }

    /// Builds a set of available stable records from bare identifiers
    pub fn from_identifiers(cluster_type: &str, identifiers: &[&str]) -> Self {
        let records = identifiers
            .iter()
            .map(|id| VersionRecord::stable(id, cluster_type))
            .collect();
        Self::new(cluster_type, records)
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Identifiers of every available record, in fetch order
    pub fn available_identifiers(&self) -> impl Iterator<Item = &str> {
        self.records
            .iter()
            .filter(|r| r.available())
            .map(|r| r.identifier())
    }

    /// Whether the (already normalized) identifier is an available member of this set
    pub fn contains(&self, identifier: &str) -> bool {
        self.available_identifiers().any(|id| id == identifier)
    }
}

/// A single resolution call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionRequest {
    pub input_version: Option<String>,
    pub cluster_type: String,
    pub auto_discover: bool,
}

impl ResolutionRequest {
    pub fn new(input_version: Option<&str>, cluster_type: &str, auto_discover: bool) -> Self {
        Self {
            input_version: input_version.map(str::to_string),
            cluster_type: cluster_type.to_string(),
            auto_discover,
        }
    }
}

/// Result of resolving a requested version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionOutcome {
    /// Identifier to use; always a member of the supported set it was resolved against
    pub resolved_version: String,
    /// Whether `resolved_version` differs from the input
    pub changed: bool,
    /// Set when an unsupported version was replaced by the latest one
    pub warning: Option<String>,
}
