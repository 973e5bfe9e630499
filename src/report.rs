//! Audit report assembly and rendering

use crate::error::Result;
use crate::footprint::ProjectFootprint;
use crate::types::{HealthCategory, LicenseRisk, ModuleHealth};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Complete audit report for a Go project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditReport {
    /// Path to the audited project
    pub project_path: String,
    /// Timestamp when audit was performed
    pub timestamp: DateTime<Utc>,
    /// Results in resolver order
    pub modules: Vec<ModuleHealth>,
    /// Summary statistics
    pub summary: AuditSummary,
    /// Size of the resolved dependency set
    pub footprint: ProjectFootprint,
}

/// Summary statistics for an audit report
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditSummary {
    pub total_modules: usize,
    pub healthy: usize,
    pub warning: usize,
    pub stale: usize,
    pub risky: usize,
    pub average_health_score: f32,
    /// Modules whose license is not permissive
    pub license_issues: usize,
}

impl AuditReport {
    /// Create a new audit report
    pub fn new(project_path: String, modules: Vec<ModuleHealth>, footprint: ProjectFootprint) -> Self {
        let summary = AuditSummary::from_modules(&modules);
        Self {
            project_path,
            timestamp: Utc::now(),
            modules,
            summary,
            footprint,
        }
    }

    /// Modules categorized Risky or Stale, in report order
    pub fn risky_or_stale(&self) -> impl Iterator<Item = &ModuleHealth> {
        self.modules.iter().filter(|m| {
            matches!(
                m.health_category,
                HealthCategory::Risky | HealthCategory::Stale
            )
        })
    }
}

impl AuditSummary {
    /// Compute summary statistics from module results
    pub fn from_modules(modules: &[ModuleHealth]) -> Self {
        let mut summary = Self {
            total_modules: modules.len(),
            ..Self::default()
        };
        let mut total_score = 0u32;

        for module in modules {
            match module.health_category {
                HealthCategory::Healthy => summary.healthy += 1,
                HealthCategory::Warning => summary.warning += 1,
                HealthCategory::Stale => summary.stale += 1,
                HealthCategory::Risky => summary.risky += 1,
            }

            total_score += module.health_score as u32;

            if module.license_risk != LicenseRisk::Permissive {
                summary.license_issues += 1;
            }
        }

        if !modules.is_empty() {
            summary.average_health_score = total_score as f32 / modules.len() as f32;
        }

        summary
    }
}

/// Serialize module results as pretty JSON
pub fn render_json(modules: &[ModuleHealth]) -> Result<String> {
    Ok(serde_json::to_string_pretty(modules)?)
}

/// Render the report as a Markdown document
pub fn render_markdown(report: &AuditReport) -> String {
    let mut md = String::new();
    let summary = &report.summary;

    // Writing to a String cannot fail
    let _ = writeln!(md, "# Dependency Audit Report\n");
    let _ = writeln!(md, "**Project:** {}\n", report.project_path);
    let _ = writeln!(md, "**Generated:** {}\n", report.timestamp);

    md.push_str("## Summary\n\n");
    let _ = writeln!(md, "- Total modules audited: {}", summary.total_modules);
    let _ = writeln!(md, "- Healthy: {}", summary.healthy);
    let _ = writeln!(md, "- Warning: {}", summary.warning);
    let _ = writeln!(md, "- Stale: {}", summary.stale);
    let _ = writeln!(md, "- Risky: {}", summary.risky);
    let _ = writeln!(md, "- Average health score: {:.1}", summary.average_health_score);
    let _ = writeln!(md, "- License issues: {}", summary.license_issues);
    let _ = writeln!(
        md,
        "- Resolved modules: {} ({} direct, {} transitive)\n",
        report.footprint.total_modules, report.footprint.direct, report.footprint.transitive
    );

    md.push_str("## Modules\n\n");
    md.push_str("| Module | Version | Score | Category | License |\n");
    md.push_str("|--------|---------|-------|----------|---------|\n");

    for module in &report.modules {
        let _ = writeln!(
            md,
            "| {} | {} | {} | {} | {} |",
            module.path, module.version, module.health_score, module.health_category, module.license
        );
    }

    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UNKNOWN_LICENSE;

    fn health(path: &str, score: u8, category: HealthCategory, risk: LicenseRisk) -> ModuleHealth {
        ModuleHealth {
            path: path.to_string(),
            version: "v1.0.0".to_string(),
            health_score: score,
            health_category: category,
            license: if risk == LicenseRisk::Permissive {
                "MIT".to_string()
            } else {
                UNKNOWN_LICENSE.to_string()
            },
            license_risk: risk,
            footprint_risk: 0.0,
            last_published: None,
            direct_dep: true,
            metadata: None,
        }
    }

    fn sample_report() -> AuditReport {
        AuditReport::new(
            "/src/app".to_string(),
            vec![
                health("github.com/a/healthy", 90, HealthCategory::Healthy, LicenseRisk::Permissive),
                health("github.com/a/stale", 35, HealthCategory::Stale, LicenseRisk::Unknown),
                health("github.com/a/risky", 0, HealthCategory::Risky, LicenseRisk::Unknown),
            ],
            ProjectFootprint {
                total_modules: 5,
                direct: 3,
                transitive: 2,
            },
        )
    }

    #[test]
    fn test_summary() {
        let report = sample_report();
        let summary = &report.summary;

        assert_eq!(summary.total_modules, 3);
        assert_eq!(summary.healthy, 1);
        assert_eq!(summary.stale, 1);
        assert_eq!(summary.risky, 1);
        assert_eq!(summary.warning, 0);
        assert_eq!(summary.license_issues, 2);
        assert!((summary.average_health_score - 125.0 / 3.0).abs() < 0.01);
    }

    #[test]
    fn test_empty_summary() {
        let summary = AuditSummary::from_modules(&[]);
        assert_eq!(summary, AuditSummary::default());
    }

    #[test]
    fn test_risky_or_stale_keeps_order() {
        let report = sample_report();
        let paths: Vec<_> = report.risky_or_stale().map(|m| m.path.as_str()).collect();
        assert_eq!(paths, vec!["github.com/a/stale", "github.com/a/risky"]);
    }

    #[test]
    fn test_render_json() {
        let report = sample_report();
        let json = render_json(&report.modules).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value.as_array().map(|a| a.len()), Some(3));
        assert_eq!(value[0]["path"], "github.com/a/healthy");
        assert_eq!(value[2]["health_category"], "Risky");
    }

    #[test]
    fn test_render_markdown() {
        let md = render_markdown(&sample_report());

        assert!(md.starts_with("# Dependency Audit Report"));
        assert!(md.contains("| Module | Version | Score | Category | License |"));
        assert!(md.contains("| github.com/a/risky | v1.0.0 | 0 | Risky | Unknown |"));
        assert!(md.contains("(3 direct, 2 transitive)"));
    }
}
