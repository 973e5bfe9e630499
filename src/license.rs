//! License detection, risk categorization and policy checks

use crate::config::LicensePolicy;
use crate::error::{AuditError, Result};
use crate::types::{LicenseRisk, ModuleMetadata, UNKNOWN_LICENSE};
use tracing::debug;

const PERMISSIVE: &[&str] = &["mit", "apache", "bsd", "isc"];
const COPYLEFT: &[&str] = &["gpl", "agpl", "mozilla"];
const RESTRICTIVE: &[&str] = &["proprietary", "commercial"];

/// Result of checking a license against a [`LicensePolicy`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyDecision {
    pub allowed: bool,
    pub warnings: Vec<String>,
}

/// Best-effort license detection for a module.
///
/// Module archives are not inspected; the license is taken from the repository
/// host when repository metadata carried one, otherwise the `"Unknown"`
/// sentinel is returned.
pub fn detect_license(
    module_path: &str,
    version: &str,
    metadata: Option<&ModuleMetadata>,
) -> Result<String> {
    if module_path.is_empty() {
        return Err(AuditError::parse("Cannot detect license for an empty module path"));
    }

    let detected = metadata
        .and_then(|m| m.license.as_deref())
        .and_then(normalize_license);

    match detected {
        Some(license) => {
            debug!("Detected license {} for {}@{}", license, module_path, version);
            Ok(license)
        }
        None => Ok(UNKNOWN_LICENSE.to_string()),
    }
}

/// Normalize a host-reported license to its SPDX identifier where possible
fn normalize_license(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("NOASSERTION") || raw.eq_ignore_ascii_case("OTHER") {
        return None;
    }

    if let Some(id) = spdx::license_id(raw) {
        return Some(id.name.to_string());
    }
    if let Some((id, _)) = spdx::imprecise_license_id(raw) {
        return Some(id.name.to_string());
    }

    Some(raw.to_string())
}

/// Categorize a license into risk levels.
///
/// Keyword families are checked in order: permissive, copyleft, restrictive.
pub fn classify_license(license: &str) -> LicenseRisk {
    let license = license.to_lowercase();
    let contains_any = |keywords: &[&str]| keywords.iter().any(|k| license.contains(k));

    if contains_any(PERMISSIVE) {
        LicenseRisk::Permissive
    } else if contains_any(COPYLEFT) {
        LicenseRisk::Copyleft
    } else if contains_any(RESTRICTIVE) {
        LicenseRisk::Restrictive
    } else {
        LicenseRisk::Unknown
    }
}

/// Check a license against the policy.
///
/// A blocked match wins over everything else. A non-empty allow-list is a
/// strict whitelist. Copyleft/unknown warnings never change `allowed`.
pub fn check_policy(license: &str, policy: &LicensePolicy) -> PolicyDecision {
    if policy
        .blocked_licenses
        .iter()
        .any(|blocked| license_matches(license, blocked))
    {
        return PolicyDecision {
            allowed: false,
            warnings: vec!["blocked".to_string()],
        };
    }

    if !policy.allowed_licenses.is_empty()
        && !policy
            .allowed_licenses
            .iter()
            .any(|allowed| license_matches(license, allowed))
    {
        return PolicyDecision {
            allowed: false,
            warnings: vec!["not in allowed list".to_string()],
        };
    }

    let mut warnings = Vec::new();
    match classify_license(license) {
        LicenseRisk::Copyleft if policy.warn_on_copyleft => {
            warnings.push("copyleft detected".to_string());
        }
        LicenseRisk::Unknown if policy.warn_on_unknown => {
            warnings.push("unknown license".to_string());
        }
        _ => {}
    }

    PolicyDecision {
        allowed: true,
        warnings,
    }
}

/// Case-insensitive substring match
fn license_matches(license: &str, pattern: &str) -> bool {
    license.to_lowercase().contains(&pattern.to_lowercase())
}
