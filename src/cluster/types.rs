//! Cluster definitions as they appear in a cluster configuration file

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

/// One cluster entry. Keys other than `name`, `type` and `version` are kept
/// verbatim, in file order, so that rewriting a file does not lose them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub cluster_type: String,
    #[serde(
        default,
        deserialize_with = "version_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub version: Option<String>,
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_yaml::Value>,
}

impl ClusterDefinition {
    pub fn new(name: &str, cluster_type: &str, version: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            cluster_type: cluster_type.to_string(),
            version: version.map(str::to_string),
            extra: IndexMap::new(),
        }
    }
}

/// Accept `version: 4.15.0`, `version: "4.15"` and bare integers.
///
/// Unquoted decimals such as `version: 4.10` are parsed by YAML as floats and
/// lose their trailing zeros, so they are rejected instead of being guessed.
fn version_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_yaml::Value::deserialize(deserializer)? {
        serde_yaml::Value::Null => Ok(None),
        serde_yaml::Value::String(s) => Ok(Some(s)),
        serde_yaml::Value::Number(n) if n.is_f64() => Err(serde::de::Error::custom(format!(
            "version {} is a YAML number and may have lost trailing zeros; quote it as written, e.g. version: \"4.10\"",
            n
        ))),
        serde_yaml::Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(serde::de::Error::custom(format!(
            "expected a version string, got {:?}",
            other
        ))),
    }
}

/// A version rewrite applied to one cluster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeNotice {
    pub cluster: String,
    pub old_version: Option<String>,
    pub new_version: String,
}

impl fmt::Display for ChangeNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} -> {}",
            self.cluster,
            self.old_version.as_deref().unwrap_or("<unset>"),
            self.new_version
        )
    }
}
