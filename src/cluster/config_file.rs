//! Loading and saving YAML cluster configuration files

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::cluster::types::ClusterDefinition;

#[derive(Debug, Error)]
pub enum ConfigFileError {
    #[error("Failed to access {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid cluster configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Top-level document of a cluster configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterConfig {
    #[serde(default)]
    pub clusters: Vec<ClusterDefinition>,
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_yaml::Value>,
}

impl ClusterConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigFileError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigFileError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigFileError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigFileError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_yaml(&content)?;
        debug!("Loaded {} clusters from {:?}", config.clusters.len(), path);
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigFileError> {
        std::fs::write(path, self.to_yaml()?).map_err(|source| ConfigFileError::Io {
            path: path.display().to_string(),
            source,
        })
    }
}
