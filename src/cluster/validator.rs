//! Applies version resolution across a list of cluster definitions

use tracing::{info, warn};

use crate::cluster::types::{ChangeNotice, ClusterDefinition};
use crate::version::error::ResolveError;
use crate::version::service::VersionCatalog;
use crate::version::types::ResolutionRequest;

/// Clusters after validation, in input order, with the rewrites that were made
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValidationReport {
    pub clusters: Vec<ClusterDefinition>,
    pub changes: Vec<ChangeNotice>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }
}

pub struct ClusterValidator<'a, C: VersionCatalog + ?Sized> {
    catalog: &'a C,
    auto_discover: bool,
}

impl<'a, C: VersionCatalog + ?Sized> ClusterValidator<'a, C> {
    pub fn new(catalog: &'a C, auto_discover: bool) -> Self {
        Self {
            catalog,
            auto_discover,
        }
    }

    /// Validate clusters using each definition's own `type` field
    pub async fn validate(
        &self,
        clusters: &[ClusterDefinition],
    ) -> Result<ValidationReport, ResolveError> {
        self.validate_with(clusters, |cluster| cluster.cluster_type.clone())
            .await
    }

    /// Validate clusters, deriving each cluster type with `cluster_type_of`.
    ///
    /// The input is left untouched; the first resolution failure aborts.
    pub async fn validate_with<F>(
        &self,
        clusters: &[ClusterDefinition],
        cluster_type_of: F,
    ) -> Result<ValidationReport, ResolveError>
    where
        F: Fn(&ClusterDefinition) -> String,
    {
        let mut report = ValidationReport::default();

        for cluster in clusters {
            let cluster_type = cluster_type_of(cluster);
            let request = ResolutionRequest::new(
                cluster.version.as_deref(),
                &cluster_type,
                self.auto_discover,
            );

            let outcome = self.catalog.resolve(&request).await.inspect_err(|e| {
                warn!("Version validation failed for cluster {}: {}", cluster.name, e)
            })?;

            if let Some(warning) = outcome.warning {
                report.warnings.push(format!("{}: {}", cluster.name, warning));
            }

            if !outcome.changed {
                report.clusters.push(cluster.clone());
                continue;
            }

            let notice = ChangeNotice {
                cluster: cluster.name.clone(),
                old_version: cluster.version.clone(),
                new_version: outcome.resolved_version.clone(),
            };
            info!("Updated cluster version {}", notice);

            report.clusters.push(ClusterDefinition {
                version: Some(outcome.resolved_version),
                ..cluster.clone()
            });
            report.changes.push(notice);
        }

        Ok(report)
    }
}
