//! Local `rosa` CLI fallback

use std::process::Stdio;
use std::time::Duration;

use serde::Deserialize;
use tokio::process::Command;
use tracing::{info, warn};

use crate::config::{FALLBACK_TIMEOUT_MS, ResolverConfig};
use crate::version::registry::FallbackSource;
use crate::version::types::{DEFAULT_CHANNEL, VersionRecord, VersionSet};

/// Arguments asking the CLI for a JSON version listing
const LIST_VERSIONS_ARGS: &[&str] = &["list", "versions", "--output", "json"];

/// One entry of the CLI's JSON output
#[derive(Debug, Deserialize)]
struct CliVersion {
    raw_id: Option<String>,
    version: Option<String>,
    id: Option<String>,
    #[serde(alias = "channel")]
    channel_group: Option<String>,
    #[serde(alias = "available")]
    enabled: Option<bool>,
}

impl CliVersion {
    fn identifier(&self) -> Option<&str> {
        self.raw_id
            .as_deref()
            .or(self.version.as_deref())
            .or(self.id.as_deref())
    }
}

/// Fallback source that shells out to a locally installed CLI
pub struct RosaCliRegistry {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl RosaCliRegistry {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            args: LIST_VERSIONS_ARGS.iter().map(|a| a.to_string()).collect(),
            timeout: Duration::from_millis(FALLBACK_TIMEOUT_MS),
        }
    }

    pub fn from_config(config: &ResolverConfig) -> Self {
        Self::new(&config.cli_path)
    }

    /// Replace the default `list versions` arguments
    pub fn with_args(mut self, args: &[&str]) -> Self {
        self.args = args.iter().map(|a| a.to_string()).collect();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run the CLI, returning stdout on a zero exit within the timeout
    async fn run(&self) -> Option<String> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, output).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                info!("Fallback CLI '{}' unavailable: {}", self.program, e);
                return None;
            }
            Err(_) => {
                warn!(
                    "Fallback CLI '{}' timed out after {}ms",
                    self.program,
                    self.timeout.as_millis()
                );
                return None;
            }
        };

        if !output.status.success() {
            warn!(
                "Fallback CLI '{}' exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
            return None;
        }

        Some(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Default for RosaCliRegistry {
    fn default() -> Self {
        Self::from_config(&ResolverConfig::default())
    }
}

/// Parse the CLI's JSON array into a version set for `cluster_type`.
///
/// Entries without any identifier are skipped; an empty result is `None`.
pub fn parse_cli_versions(stdout: &str, cluster_type: &str) -> Option<VersionSet> {
    let entries: Vec<CliVersion> = serde_json::from_str(stdout)
        .inspect_err(|e| warn!("Failed to parse fallback CLI output: {}", e))
        .ok()?;

    let records: Vec<VersionRecord> = entries
        .iter()
        .filter_map(|entry| {
            let identifier = entry.identifier()?;
            Some(VersionRecord::new(
                identifier,
                entry.enabled.unwrap_or(true),
                entry.channel_group.as_deref().unwrap_or(DEFAULT_CHANNEL),
                cluster_type,
            ))
        })
        .collect();

    if records.is_empty() {
        return None;
    }

    Some(VersionSet::new(cluster_type, records))
}

#[async_trait::async_trait]
impl FallbackSource for RosaCliRegistry {
    fn name(&self) -> &'static str {
        "rosa-cli"
    }

    async fn list_versions(&self, cluster_type: &str) -> Option<VersionSet> {
        let stdout = self.run().await?;
        let set = parse_cli_versions(&stdout, cluster_type)?;

        info!(
            "Fallback CLI listed {} versions for {}",
            set.len(),
            cluster_type
        );
        Some(set)
    }

    fn max_duration(&self) -> Option<Duration> {
        Some(self.timeout)
    }
}
