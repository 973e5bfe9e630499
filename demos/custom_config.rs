//! Example showing custom configuration

use go_dep_audit::{
    audit_project, check_policy, AuditConfig, LicensePolicy, NetworkConfig, ScoringConfig,
};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AuditConfig::builder()
        .project_path(".")
        .include_indirect(true)
        .fetch_repo_metadata(true)
        .scoring(ScoringConfig {
            recency_weight: 0.5, // Emphasize recency more
            version_freq_weight: 0.1,
            commit_activity_weight: 0.25,
            community_weight: 0.15,
            healthy_threshold: 75,
            warning_threshold: 55,
            stale_threshold: 35,
        })
        .license_policy(LicensePolicy {
            allowed_licenses: vec![
                "MIT".to_string(),
                "Apache-2.0".to_string(),
                "BSD-3-Clause".to_string(),
            ],
            blocked_licenses: vec!["AGPL-3.0".to_string()],
            warn_on_copyleft: true,
            warn_on_unknown: true,
        })
        .network(NetworkConfig {
            concurrency: 4,
            ..NetworkConfig::default()
        })
        .ignore_module("golang.org/x/sys")
        .build();

    config.validate()?;

    // Ctrl-C stops outstanding fetches; finished modules are kept
    let cancel = CancellationToken::new();
    let signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal.cancel();
        }
    });

    println!("Auditing with custom configuration...\n");
    let report = audit_project(&config, &cancel).await?;

    println!("=== Custom Audit Results ===");
    println!("Project: {}", report.project_path);
    println!("Average health score: {:.1}", report.summary.average_health_score);
    println!("License issues: {}", report.summary.license_issues);

    let violations: Vec<_> = report
        .modules
        .iter()
        .map(|m| (m, check_policy(&m.license, &config.license_policy)))
        .filter(|(_, decision)| !decision.warnings.is_empty())
        .collect();

    if !violations.is_empty() {
        println!("\nLicense Policy Warnings:");
        for (module, decision) in violations {
            println!("  - {}@{} ({})", module.path, module.version, module.license);
            for warning in &decision.warnings {
                println!("    {}", warning);
            }
        }
    }

    Ok(())
}
