//! Basic example of using the audit API

use go_dep_audit::{audit_project, AuditConfig};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Use default configuration against the current directory
    let config = AuditConfig::default();
    println!("Auditing project at: {}", config.project_path.display());

    let report = audit_project(&config, &CancellationToken::new()).await?;

    println!("\n=== Audit Results ===");
    println!("Project: {}", report.project_path);
    println!("Modules audited: {}", report.modules.len());
    println!(
        "Resolved: {} direct, {} transitive",
        report.footprint.direct, report.footprint.transitive
    );
    println!();

    println!("Health Summary:");
    println!("  Healthy: {}", report.summary.healthy);
    println!("  Warning: {}", report.summary.warning);
    println!("  Stale: {}", report.summary.stale);
    println!("  Risky: {}", report.summary.risky);
    println!("  Average score: {:.1}", report.summary.average_health_score);
    println!();

    let flagged: Vec<_> = report.risky_or_stale().collect();
    if flagged.is_empty() {
        println!("No risky or stale modules found!");
    } else {
        println!("Risky/Stale Modules:");
        for module in flagged {
            println!(
                "  - {}@{}: score {} ({}, license {})",
                module.path, module.version, module.health_score, module.health_category, module.license
            );
        }
    }

    Ok(())
}
