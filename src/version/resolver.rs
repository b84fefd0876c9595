//! Version resolution policy
//!
//! Maps a requested version, the supported set and the auto-discovery flag to
//! the version that should actually be used. No I/O happens here.
//!
//! | input                  | in set? | auto_discover | outcome                         |
//! |------------------------|---------|---------------|---------------------------------|
//! | absent / empty         | -       | -             | latest                          |
//! | `latest` / `stable`    | -       | -             | latest                          |
//! | explicit               | yes     | -             | that version                    |
//! | explicit               | no      | false         | `UnsupportedVersion`            |
//! | explicit               | no      | true          | latest, with an upgrade warning |

use tracing::warn;

use crate::config::DEFAULT_CHANNEL;
use crate::version::error::ResolveError;
use crate::version::semver::{compare_identifiers, normalize_identifier};
use crate::version::types::{ResolutionOutcome, VersionRecord, VersionSet};

/// How many supported identifiers an `UnsupportedVersion` error lists
const SUPPORTED_VERSIONS_SHOWN: usize = 5;

/// Inputs that always mean "give me the latest"
const LATEST_ALIASES: &[&str] = &["latest", "stable"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionPolicy {
    /// Only records on this channel are candidates for "latest"
    channel: String,
}

impl Default for ResolutionPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL)
    }
}

impl ResolutionPolicy {
    pub fn new(channel: &str) -> Self {
        Self {
            channel: channel.to_string(),
        }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// The highest available record on the policy channel
    pub fn latest<'a>(&self, supported: &'a VersionSet) -> Result<&'a VersionRecord, ResolveError> {
        supported
            .records
            .iter()
            .filter(|r| r.available() && r.channel() == self.channel)
            .max_by(|a, b| compare_identifiers(a.identifier(), b.identifier()))
            .ok_or_else(|| ResolveError::NoVersionsAvailable {
                cluster_type: supported.cluster_type.clone(),
                channel: self.channel.clone(),
            })
    }

    /// Whether `version` (raw or prefixed) names an available member of `supported`
    pub fn is_supported(&self, version: &str, supported: &VersionSet) -> bool {
        supported.contains(&normalize_identifier(version))
    }

    /// Resolve a requested version against the supported set
    pub fn resolve(
        &self,
        input_version: Option<&str>,
        supported: &VersionSet,
        auto_discover: bool,
    ) -> Result<ResolutionOutcome, ResolveError> {
        let requested = input_version.map(str::trim).filter(|v| !v.is_empty());

        let Some(requested) = requested else {
            return self.latest_outcome(input_version, supported, None);
        };

        if LATEST_ALIASES
            .iter()
            .any(|alias| requested.eq_ignore_ascii_case(alias))
        {
            return self.latest_outcome(input_version, supported, None);
        }

        let normalized = normalize_identifier(requested);
        if supported.contains(&normalized) {
            return Ok(ResolutionOutcome {
                changed: input_version != Some(normalized.as_str()),
                resolved_version: normalized,
                warning: None,
            });
        }

        let latest = self.latest(supported)?.identifier().to_string();

        if !auto_discover {
            return Err(ResolveError::UnsupportedVersion {
                requested: requested.to_string(),
                cluster_type: supported.cluster_type.clone(),
                supported: self.supported_preview(supported),
                latest,
            });
        }

        let warning = format!(
            "Version {} is not supported for {}; auto-upgraded to latest {}",
            requested, supported.cluster_type, latest
        );
        warn!("{}", warning);
        self.latest_outcome(input_version, supported, Some(warning))
    }

    fn latest_outcome(
        &self,
        input_version: Option<&str>,
        supported: &VersionSet,
        warning: Option<String>,
    ) -> Result<ResolutionOutcome, ResolveError> {
        let latest = self.latest(supported)?.identifier().to_string();
        Ok(ResolutionOutcome {
            changed: input_version != Some(latest.as_str()),
            resolved_version: latest,
            warning,
        })
    }

    /// Newest-first list of up to five available identifiers
    fn supported_preview(&self, supported: &VersionSet) -> Vec<String> {
        let mut identifiers: Vec<&str> = supported.available_identifiers().collect();
        identifiers.sort_by(|a, b| compare_identifiers(b, a));
        identifiers.dedup();
        identifiers
            .into_iter()
            .take(SUPPORTED_VERSIONS_SHOWN)
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn supported() -> VersionSet {
        VersionSet::from_identifiers("rosa", &["4.14.1", "4.15.0"])
    }

    #[rstest]
    #[case(None)]
    #[case(Some(""))]
    #[case(Some("   "))]
    #[case(Some("latest"))]
    #[case(Some("LATEST"))]
    #[case(Some("Stable"))]
    fn latest_aliases_resolve_to_latest(#[case] input: Option<&str>) {
        let outcome = ResolutionPolicy::default()
            .resolve(input, &supported(), false)
            .unwrap();

        assert_eq!(outcome.resolved_version, "4.15.0");
        assert!(outcome.changed);
        assert_eq!(outcome.warning, None);
    }

    #[rstest]
    #[case("4.14.1", false)]
    #[case("4.15.0", false)]
    #[case("openshift-v4.14.1", true)]
    fn supported_version_is_kept(#[case] input: &str, #[case] changed: bool) {
        let outcome = ResolutionPolicy::default()
            .resolve(Some(input), &supported(), false)
            .unwrap();

        assert_eq!(outcome.resolved_version, input.trim_start_matches("openshift-v"));
        assert_eq!(outcome.changed, changed);
        assert_eq!(outcome.warning, None);
    }

    #[test]
    fn resolving_supported_version_is_idempotent() {
        let policy = ResolutionPolicy::default();

        let first = policy.resolve(Some("4.14.1"), &supported(), true).unwrap();
        let second = policy
            .resolve(Some(&first.resolved_version), &supported(), true)
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(second.warning, None);
    }

    #[test]
    fn unsupported_version_fails_without_auto_discover() {
        let result = ResolutionPolicy::default().resolve(Some("4.10.0"), &supported(), false);

        match result {
            Err(ResolveError::UnsupportedVersion {
                requested,
                cluster_type,
                supported,
                latest,
            }) => {
                assert_eq!(requested, "4.10.0");
                assert_eq!(cluster_type, "rosa");
                assert_eq!(supported, vec!["4.15.0", "4.14.1"]);
                assert_eq!(latest, "4.15.0");
            }
            other => panic!("expected UnsupportedVersion, got {:?}", other),
        }
    }

    #[test]
    fn unsupported_version_error_lists_at_most_five_versions() {
        let set = VersionSet::from_identifiers(
            "rosa",
            &["4.12.0", "4.13.0", "4.14.0", "4.15.0", "4.16.0", "4.17.0", "4.18.0"],
        );

        let result = ResolutionPolicy::default().resolve(Some("4.1.0"), &set, false);

        let Err(ResolveError::UnsupportedVersion { supported, latest, .. }) = result else {
            panic!("expected UnsupportedVersion");
        };
        assert_eq!(supported, vec!["4.18.0", "4.17.0", "4.16.0", "4.15.0", "4.14.0"]);
        assert_eq!(latest, "4.18.0");
    }

    #[test]
    fn unsupported_version_auto_upgrades_with_warning() {
        let policy = ResolutionPolicy::default();

        let upgraded = policy.resolve(Some("4.10.0"), &supported(), true).unwrap();
        let absent = policy.resolve(None, &supported(), true).unwrap();

        assert_eq!(upgraded.resolved_version, absent.resolved_version);
        assert!(upgraded.changed);
        let warning = upgraded.warning.unwrap();
        assert!(warning.contains("4.10.0"));
        assert!(warning.contains("4.15.0"));
    }

    #[test]
    fn latest_uses_version_order_not_fetch_order() {
        let set = VersionSet::from_identifiers("rosa", &["4.9.3", "4.15.0", "4.10.2"]);

        let latest = ResolutionPolicy::default().latest(&set).unwrap();

        assert_eq!(latest.identifier(), "4.15.0");
    }

    #[test]
    fn latest_skips_unavailable_and_other_channels() {
        let set = VersionSet::new(
            "rosa",
            vec![
                VersionRecord::new("4.14.1", true, "stable", "rosa"),
                VersionRecord::new("4.15.0", false, "stable", "rosa"),
                VersionRecord::new("4.16.0", true, "candidate", "rosa"),
            ],
        );

        assert_eq!(
            ResolutionPolicy::default().latest(&set).unwrap().identifier(),
            "4.14.1"
        );
        assert_eq!(
            ResolutionPolicy::new("candidate").latest(&set).unwrap().identifier(),
            "4.16.0"
        );
    }

    #[rstest]
    #[case(VersionSet::new("rosa", vec![]))]
    #[case(VersionSet::new("rosa", vec![VersionRecord::new("4.15.0", false, "stable", "rosa")]))]
    #[case(VersionSet::new("rosa", vec![VersionRecord::new("4.15.0", true, "fast", "rosa")]))]
    fn no_eligible_versions_is_an_error(#[case] set: VersionSet) {
        let result = ResolutionPolicy::default().resolve(None, &set, true);

        assert!(matches!(
            result,
            Err(ResolveError::NoVersionsAvailable { ref cluster_type, ref channel })
                if cluster_type == "rosa" && channel == "stable"
        ));
    }

    #[test]
    fn is_supported_accepts_prefixed_identifiers() {
        let policy = ResolutionPolicy::default();

        assert!(policy.is_supported("openshift-v4.15.0", &supported()));
        assert!(policy.is_supported("4.14.1", &supported()));
        assert!(!policy.is_supported("4.10.0", &supported()));
    }
}
