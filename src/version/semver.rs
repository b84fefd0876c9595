use std::cmp::Ordering;

use semver::Version;

/// Product prefix the control plane puts in front of raw version ids
pub const IDENTIFIER_PREFIX: &str = "openshift-v";

/// Strip the product prefix (or a bare `v`) and surrounding whitespace.
///
/// Examples:
/// - "openshift-v4.15.0" -> "4.15.0"
/// - "v4.15.0" -> "4.15.0"
/// - "4.15.0" -> "4.15.0"
pub fn normalize_identifier(identifier: &str) -> String {
    let trimmed = identifier.trim();
    let stripped = trimmed
        .strip_prefix(IDENTIFIER_PREFIX)
        .or_else(|| {
            trimmed
                .strip_prefix('v')
                .filter(|rest| rest.starts_with(|c: char| c.is_ascii_digit()))
        })
        .unwrap_or(trimmed);
    stripped.to_string()
}

/// Parse a version string into a semver::Version, normalizing partial versions.
///
/// Handles partial versions like "4" or "4.15" by padding with zeros.
pub fn parse_version(version: &str) -> Option<Version> {
    let parts: Vec<&str> = version.split('.').collect();
    let normalized = match parts.len() {
        1 => format!("{}.0.0", parts[0]),
        2 => format!("{}.{}.0", parts[0], parts[1]),
        _ => version.to_string(),
    };
    Version::parse(&normalized).ok()
}

/// Total order over normalized identifiers.
///
/// Parseable versions compare semantically and sort above anything unparseable;
/// unparseable identifiers fall back to string comparison.
pub fn compare_identifiers(a: &str, b: &str) -> Ordering {
    match (parse_version(a), parse_version(b)) {
        (Some(va), Some(vb)) => va.cmp(&vb).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => a.cmp(b),
    }
}
