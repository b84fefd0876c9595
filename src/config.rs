use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;

// =============================================================================
// Time-related constants
// =============================================================================

/// How long a fetched version set stays valid (1 hour)
pub const CACHE_TTL_SECS: u64 = 3600;

/// Timeout for every HTTP request in milliseconds (30 seconds)
pub const HTTP_TIMEOUT_MS: u64 = 30_000;

/// Timeout for the local CLI fallback in milliseconds (30 seconds)
pub const FALLBACK_TIMEOUT_MS: u64 = 30_000;

/// Access tokens are refreshed this many seconds before they expire
pub const TOKEN_EXPIRY_SKEW_SECS: u64 = 30;

/// Lifetime assumed when the identity endpoint omits `expires_in`
pub const DEFAULT_TOKEN_LIFETIME_SECS: u64 = 300;

// =============================================================================
// Endpoints and environment
// =============================================================================

pub const DEFAULT_API_URL: &str = "https://api.openshift.com";
pub const DEFAULT_TOKEN_URL: &str =
    "https://sso.redhat.com/auth/realms/redhat-external/protocol/openid-connect/token";
pub const DEFAULT_CLIENT_ID: &str = "cloud-services";
pub const DEFAULT_CLI_PATH: &str = "rosa";
pub const DEFAULT_CHANNEL: &str = crate::version::types::DEFAULT_CHANNEL;

pub const ENV_OFFLINE_TOKEN: &str = "OCM_OFFLINE_TOKEN";
pub const ENV_API_URL: &str = "OCM_API_URL";
pub const ENV_TOKEN_URL: &str = "OCM_TOKEN_URL";
pub const ENV_CLI_PATH: &str = "ROSA_CLI_PATH";
pub const ENV_LOG_FILTER: &str = "DVRS_LOG";

/// Resolver configuration
#[derive(Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ResolverConfig {
    pub api_url: String,
    pub token_url: String,
    pub client_id: String,
    pub offline_token: Option<String>,
    pub cli_path: String,
    /// Channel considered when picking the latest version
    pub channel: String,
    pub cache_ttl_secs: u64,
    pub retry: RetryConfig,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            client_id: DEFAULT_CLIENT_ID.to_string(),
            offline_token: None,
            cli_path: DEFAULT_CLI_PATH.to_string(),
            channel: DEFAULT_CHANNEL.to_string(),
            cache_ttl_secs: CACHE_TTL_SECS,
            retry: RetryConfig::default(),
        }
    }
}

impl fmt::Debug for ResolverConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverConfig")
            .field("api_url", &self.api_url)
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .field("offline_token", &self.offline_token.as_ref().map(|_| "<redacted>"))
            .field("cli_path", &self.cli_path)
            .field("channel", &self.channel)
            .field("cache_ttl_secs", &self.cache_ttl_secs)
            .field("retry", &self.retry)
            .finish()
    }
}

impl ResolverConfig {
    /// Build configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    /// Unset and empty variables keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Self {
            api_url: get(ENV_API_URL).unwrap_or(defaults.api_url),
            token_url: get(ENV_TOKEN_URL).unwrap_or(defaults.token_url),
            offline_token: get(ENV_OFFLINE_TOKEN),
            cli_path: get(ENV_CLI_PATH).unwrap_or(defaults.cli_path),
            ..defaults
        }
    }
}

/// Backoff settings for transient failures
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct RetryConfig {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub backoff_factor: f64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1_000,
            backoff_factor: 2.0,
            max_delay_ms: 30_000,
        }
    }
}

/// Returns the path to the data directory for cluster-version-resolver.
/// Uses $XDG_DATA_HOME/cluster-version-resolver if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/cluster-version-resolver,
/// or ./cluster-version-resolver if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

/// Returns the path to the log file.
pub fn log_path() -> PathBuf {
    data_dir().join("cluster-version-resolver.log")
}

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join("cluster-version-resolver")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn resolver_config_from_partial_object_uses_defaults_for_missing_fields() {
        let result = serde_json::from_value::<ResolverConfig>(json!({
            "channel": "fast",
            "retry": {
                "maxRetries": 5
            }
        }))
        .unwrap();

        assert_eq!(result.channel, "fast");
        assert_eq!(result.retry.max_retries, 5);
        assert_eq!(result.retry.base_delay_ms, 1_000);
        assert_eq!(result.api_url, DEFAULT_API_URL);
        assert_eq!(result.cache_ttl_secs, CACHE_TTL_SECS);
    }

    #[test]
    fn from_lookup_reads_known_variables() {
        let env = HashMap::from([
            (ENV_OFFLINE_TOKEN, "offline-abc"),
            (ENV_API_URL, "https://api.stage.example.com"),
            (ENV_CLI_PATH, "/usr/local/bin/rosa"),
        ]);

        let config = ResolverConfig::from_lookup(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.offline_token.as_deref(), Some("offline-abc"));
        assert_eq!(config.api_url, "https://api.stage.example.com");
        assert_eq!(config.token_url, DEFAULT_TOKEN_URL);
        assert_eq!(config.cli_path, "/usr/local/bin/rosa");
    }

    #[test]
    fn from_lookup_treats_empty_values_as_unset() {
        let config = ResolverConfig::from_lookup(|key| match key {
            ENV_OFFLINE_TOKEN => Some("  ".to_string()),
            ENV_API_URL => Some(String::new()),
            _ => None,
        });

        assert_eq!(config.offline_token, None);
        assert_eq!(config.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn debug_output_redacts_offline_token() {
        let config = ResolverConfig {
            offline_token: Some("super-secret".to_string()),
            ..Default::default()
        };

        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn data_dir_with_env_uses_xdg_data_home_when_set() {
        let path = data_dir_with_env(
            Some("/tmp/test-data".to_string()),
            Some(PathBuf::from("/home/user")),
        );

        assert_eq!(path, PathBuf::from("/tmp/test-data/cluster-version-resolver"));
    }

    #[test]
    fn data_dir_with_env_falls_back_to_home_local_share() {
        let path = data_dir_with_env(None, Some(PathBuf::from("/home/user")));

        assert_eq!(
            path,
            PathBuf::from("/home/user/.local/share/cluster-version-resolver")
        );
    }

    #[test]
    fn data_dir_with_env_falls_back_to_current_dir_when_no_dirs_available() {
        let path = data_dir_with_env(None, None);
        assert_eq!(path, PathBuf::from("./cluster-version-resolver"));
    }
}
