//! Core data types for module health reporting

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sentinel license string used whenever no license could be determined
pub const UNKNOWN_LICENSE: &str = "Unknown";

/// A single module from the resolved dependency graph.
///
/// Field names follow the JSON emitted by `go list -m -json`, so values can be
/// decoded straight from the tool's output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Module {
    /// Module path, unique within a graph
    #[serde(default)]
    pub path: String,
    /// Resolved version (empty for the main module)
    #[serde(default)]
    pub version: String,
    /// Version timestamp as reported by the resolver
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    /// Pulled in transitively rather than required directly
    #[serde(default)]
    pub indirect: bool,
    /// The project's own module
    #[serde(default)]
    pub main: bool,
}

impl Module {
    /// Create a direct, non-main module
    pub fn new(path: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            version: version.into(),
            ..Self::default()
        }
    }

    /// Mark this module as indirect
    pub fn indirect(mut self) -> Self {
        self.indirect = true;
        self
    }

    /// Version timestamp reported by `go list`, if present and RFC 3339
    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        let time = self.time.as_deref()?;
        DateTime::parse_from_rfc3339(time)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }
}

/// Raw signals gathered for one module.
///
/// Zero counts and `None` values mean "no signal", never an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleMetadata {
    /// Source repository, set only when repository signals were collected
    pub repository_url: Option<String>,
    /// Most recent publish or commit
    pub last_commit_date: Option<DateTime<Utc>>,
    /// Number of published versions
    pub version_count: u32,
    /// Commits per month
    pub commit_frequency: f64,
    pub stars: u32,
    pub forks: u32,
    pub open_issues: u32,
    pub contributors: u32,
    /// SPDX identifier reported by the repository host
    pub license: Option<String>,
}

/// Audit result for a single module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleHealth {
    pub path: String,
    pub version: String,
    /// Overall health score (0-100)
    pub health_score: u8,
    pub health_category: HealthCategory,
    pub license: String,
    pub license_risk: LicenseRisk,
    /// Transitive footprint risk, not computed per module (always 0.0)
    pub footprint_risk: f64,
    pub last_published: Option<DateTime<Utc>>,
    /// Whether this is a direct dependency (vs transitive)
    pub direct_dep: bool,
    /// Metadata used for scoring, absent when the fetch failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ModuleMetadata>,
}

/// Health categories, listed from the highest score range to the lowest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HealthCategory {
    /// Healthy: actively maintained, good community support
    Healthy,
    /// Warning: some concerns but generally okay
    Warning,
    /// Stale: not updated recently, limited activity
    Stale,
    /// Risky: unmaintained, unresolvable or high risk
    Risky,
}

impl PartialOrd for HealthCategory {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Risky < Stale < Warning < Healthy
impl Ord for HealthCategory {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl HealthCategory {
    /// Rank that grows with the score range (Risky = 0, Healthy = 3)
    pub fn rank(self) -> u8 {
        match self {
            Self::Healthy => 3,
            Self::Warning => 2,
            Self::Stale => 1,
            Self::Risky => 0,
        }
    }
}

impl std::fmt::Display for HealthCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Healthy => write!(f, "Healthy"),
            Self::Warning => write!(f, "Warning"),
            Self::Stale => write!(f, "Stale"),
            Self::Risky => write!(f, "Risky"),
        }
    }
}

/// License risk categorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LicenseRisk {
    /// Permissive licenses (MIT, Apache, BSD, ISC)
    Permissive,
    /// Copyleft licenses (GPL, AGPL, Mozilla)
    Copyleft,
    /// Proprietary or commercial licenses
    Restrictive,
    /// License not found or not recognized
    Unknown,
}

impl std::fmt::Display for LicenseRisk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Permissive => write!(f, "Permissive"),
            Self::Copyleft => write!(f, "Copyleft"),
            Self::Restrictive => write!(f, "Restrictive"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Individual component scores (0-100 scale)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ComponentScores {
    /// Decay since the last publish or commit
    pub recency: f64,
    /// Number of published versions
    pub version_frequency: f64,
    /// Commits per month
    pub commit_activity: f64,
    /// Stars and contributors
    pub community: f64,
}
