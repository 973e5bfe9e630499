//! # go_dep_audit
//!
//! Audits the third-party modules of a Go project, providing:
//! - **Health scoring**: recency, release cadence, commit activity and community signals
//! - **License analysis**: risk tiers and allow/block policy checks
//! - **Verdicts**: Healthy, Warning, Stale or Risky per module, for build gates and reports
//!
//! ## Quick Start
//!
//! ```no_run
//! use go_dep_audit::{audit_project, AuditConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let config = AuditConfig::builder().project_path(".").build();
//! let report = audit_project(&config, &CancellationToken::new()).await?;
//!
//! for module in report.modules {
//!     println!("{}: {} (score: {})", module.path, module.health_category, module.health_score);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - Bounded concurrent metadata fetching with per-module failure isolation
//! - Results always in resolver order
//! - `go list` module graph with a `go.mod` fallback
//! - Optional GitHub/GitLab repository signals
//! - CLI tool with JSON and Markdown reports

mod audit;
mod config;
mod error;
mod footprint;
mod license;
pub mod metadata;
mod report;
mod resolver;
mod scoring;
mod types;

// Re-export public API
pub use audit::{audit_modules, audit_project, build_health, select_modules};
pub use config::{AuditConfig, AuditConfigBuilder, LicensePolicy, NetworkConfig, ScoringConfig};
pub use error::{AuditError, Result};
pub use footprint::ProjectFootprint;
pub use license::{check_policy, classify_license, detect_license, PolicyDecision};
pub use metadata::{MetadataFetcher, ProxyFetcher};
pub use report::{render_json, render_markdown, AuditReport, AuditSummary};
pub use resolver::{resolve_modules, GoListResolver, GoModResolver, ModuleResolver};
pub use scoring::{calculate_health_score, calculate_health_score_at, categorize, score_components};
pub use types::{
    ComponentScores, HealthCategory, LicenseRisk, Module, ModuleHealth, ModuleMetadata,
    UNKNOWN_LICENSE,
};
