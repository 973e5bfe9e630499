//! Configuration for audit behavior and scoring heuristics

use crate::error::{AuditError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::Semaphore;

/// Main configuration for the audit process
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Directory containing the project's go.mod
    pub project_path: PathBuf,
    /// Audit indirect (transitive) modules as well
    pub include_indirect: bool,
    /// Query GitHub/GitLab for repository signals
    pub fetch_repo_metadata: bool,
    /// Scoring weights and category thresholds
    pub scoring: ScoringConfig,
    /// License policy configuration
    pub license_policy: LicensePolicy,
    /// Module paths excluded from the audit (exact match)
    pub ignore_modules: Vec<String>,
    /// Network configuration
    pub network: NetworkConfig,
}

/// Weights for the health sub-scores and the thresholds between categories
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub recency_weight: f64,
    pub version_freq_weight: f64,
    pub commit_activity_weight: f64,
    pub community_weight: f64,
    /// Minimum score for Healthy
    pub healthy_threshold: u8,
    /// Minimum score for Warning
    pub warning_threshold: u8,
    /// Minimum score for Stale; anything lower is Risky
    pub stale_threshold: u8,
}

/// License policy configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LicensePolicy {
    /// Allowed license identifiers (empty = allow all)
    pub allowed_licenses: Vec<String>,
    /// Explicitly blocked license identifiers
    pub blocked_licenses: Vec<String>,
    /// Warn on copyleft licenses
    pub warn_on_copyleft: bool,
    /// Warn on unknown licenses
    pub warn_on_unknown: bool,
}

/// Network configuration for metadata fetching
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Maximum number of modules audited at the same time
    pub concurrency: usize,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Base URL of the Go module proxy
    pub proxy_url: String,
    /// Base URL of the GitHub REST API
    pub github_api: String,
    /// Base URL of the GitLab REST API
    pub gitlab_api: String,
    /// GitHub API token (optional, for higher rate limits)
    #[serde(skip_serializing)]
    pub github_token: Option<String>,
    /// GitLab API token (optional)
    #[serde(skip_serializing)]
    pub gitlab_token: Option<String>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            project_path: PathBuf::from("."),
            include_indirect: false,
            fetch_repo_metadata: false,
            scoring: ScoringConfig::default(),
            license_policy: LicensePolicy::default(),
            ignore_modules: Vec::new(),
            network: NetworkConfig::default(),
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            recency_weight: 0.4,
            version_freq_weight: 0.2,
            commit_activity_weight: 0.2,
            community_weight: 0.2,
            healthy_threshold: 70,
            warning_threshold: 50,
            stale_threshold: 30,
        }
    }
}

impl ScoringConfig {
    /// Check that thresholds are strictly descending and weights are usable.
    ///
    /// Weights are not required to sum to 1.0: the score is an additive
    /// weighted sum and callers calibrate the weights themselves.
    pub fn validate(&self) -> Result<()> {
        let weights = [
            ("recency_weight", self.recency_weight),
            ("version_freq_weight", self.version_freq_weight),
            ("commit_activity_weight", self.commit_activity_weight),
            ("community_weight", self.community_weight),
        ];
        for (name, weight) in weights {
            if !weight.is_finite() || weight < 0.0 {
                return Err(AuditError::config(format!(
                    "{} must be a non-negative number, got {}",
                    name, weight
                )));
            }
        }

        if self.healthy_threshold > 100 {
            return Err(AuditError::config(format!(
                "healthy_threshold must be at most 100, got {}",
                self.healthy_threshold
            )));
        }

        if !(self.healthy_threshold > self.warning_threshold
            && self.warning_threshold > self.stale_threshold)
        {
            return Err(AuditError::config(format!(
                "Thresholds must be strictly descending (healthy > warning > stale), got {} / {} / {}",
                self.healthy_threshold, self.warning_threshold, self.stale_threshold
            )));
        }

        Ok(())
    }
}

impl Default for LicensePolicy {
    fn default() -> Self {
        Self {
            allowed_licenses: ["MIT", "Apache-2.0", "BSD-3-Clause", "BSD-2-Clause", "ISC"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            blocked_licenses: Vec::new(),
            warn_on_copyleft: true,
            warn_on_unknown: true,
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            concurrency: 10,
            timeout_secs: 10,
            proxy_url: "https://proxy.golang.org".to_string(),
            github_api: "https://api.github.com".to_string(),
            gitlab_api: "https://gitlab.com/api/v4".to_string(),
            github_token: std::env::var("GITHUB_TOKEN").ok(),
            gitlab_token: std::env::var("GITLAB_TOKEN").ok(),
        }
    }
}

impl NetworkConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl AuditConfig {
    /// Create a new builder for AuditConfig
    pub fn builder() -> AuditConfigBuilder {
        AuditConfigBuilder::default()
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: AuditConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate scoring and network settings
    pub fn validate(&self) -> Result<()> {
        self.scoring.validate()?;
        if self.network.concurrency == 0 {
            return Err(AuditError::config("network.concurrency must be at least 1"));
        }
        if self.network.concurrency > Semaphore::MAX_PERMITS {
            return Err(AuditError::config(format!(
                "network.concurrency must be at most {}, got {}",
                Semaphore::MAX_PERMITS,
                self.network.concurrency
            )));
        }
        Ok(())
    }
}

/// Builder for AuditConfig
#[derive(Default)]
pub struct AuditConfigBuilder {
    project_path: Option<PathBuf>,
    include_indirect: bool,
    fetch_repo_metadata: bool,
    scoring: Option<ScoringConfig>,
    license_policy: Option<LicensePolicy>,
    network: Option<NetworkConfig>,
    ignore_modules: Vec<String>,
}

impl AuditConfigBuilder {
    pub fn project_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.project_path = Some(path.into());
        self
    }

    pub fn include_indirect(mut self, include: bool) -> Self {
        self.include_indirect = include;
        self
    }

    pub fn fetch_repo_metadata(mut self, fetch: bool) -> Self {
        self.fetch_repo_metadata = fetch;
        self
    }

    pub fn scoring(mut self, scoring: ScoringConfig) -> Self {
        self.scoring = Some(scoring);
        self
    }

    pub fn license_policy(mut self, policy: LicensePolicy) -> Self {
        self.license_policy = Some(policy);
        self
    }

    pub fn network(mut self, network: NetworkConfig) -> Self {
        self.network = Some(network);
        self
    }

    pub fn ignore_module(mut self, path: impl Into<String>) -> Self {
        self.ignore_modules.push(path.into());
        self
    }

    pub fn build(self) -> AuditConfig {
        AuditConfig {
            project_path: self.project_path.unwrap_or_else(|| PathBuf::from(".")),
            include_indirect: self.include_indirect,
            fetch_repo_metadata: self.fetch_repo_metadata,
            scoring: self.scoring.unwrap_or_default(),
            license_policy: self.license_policy.unwrap_or_default(),
            ignore_modules: self.ignore_modules,
            network: self.network.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AuditConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.network.concurrency, 10);
        assert_eq!(config.network.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_concurrency_bounds() {
        let mut config = AuditConfig::default();
        config.network.concurrency = 0;
        assert!(config.validate().is_err());

        let config: AuditConfig = toml::from_str(
            r#"
            [network]
            concurrency = 9223372036854775807
            "#,
        )
        .unwrap();
        assert!(matches!(config.validate(), Err(AuditError::ConfigError(_))));

        let mut config = AuditConfig::default();
        config.network.concurrency = Semaphore::MAX_PERMITS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_thresholds_must_descend() {
        let scoring = ScoringConfig {
            warning_threshold: 70,
            ..ScoringConfig::default()
        };
        assert!(scoring.validate().is_err());

        let scoring = ScoringConfig {
            stale_threshold: 50,
            ..ScoringConfig::default()
        };
        assert!(scoring.validate().is_err());
    }

    #[test]
    fn test_weights_need_not_sum_to_one() {
        let scoring = ScoringConfig {
            recency_weight: 1.0,
            version_freq_weight: 1.0,
            ..ScoringConfig::default()
        };
        assert!(scoring.validate().is_ok());

        let scoring = ScoringConfig {
            community_weight: -0.1,
            ..ScoringConfig::default()
        };
        assert!(scoring.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: AuditConfig = toml::from_str(
            r#"
            include_indirect = true
            ignore_modules = ["github.com/stretchr/testify"]

            [scoring]
            healthy_threshold = 80

            [license_policy]
            allowed_licenses = []
            blocked_licenses = ["AGPL"]
            "#,
        )
        .unwrap();

        assert!(config.include_indirect);
        assert_eq!(config.ignore_modules, vec!["github.com/stretchr/testify"]);
        assert_eq!(config.scoring.healthy_threshold, 80);
        assert_eq!(config.scoring.warning_threshold, 50);
        assert!(config.license_policy.allowed_licenses.is_empty());
        assert!(config.license_policy.warn_on_copyleft);
        assert_eq!(config.network.proxy_url, "https://proxy.golang.org");
    }

    #[test]
    fn test_builder() {
        let config = AuditConfig::builder()
            .project_path("/tmp/project")
            .include_indirect(true)
            .ignore_module("example.com/internal")
            .build();

        assert_eq!(config.project_path, PathBuf::from("/tmp/project"));
        assert!(config.include_indirect);
        assert_eq!(config.ignore_modules, vec!["example.com/internal"]);
        assert_eq!(config.scoring, ScoringConfig::default());
    }
}
