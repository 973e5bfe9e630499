//! CLI tool for auditing Go module dependencies

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use colored::*;
use go_dep_audit::{
    audit_project, check_policy, render_json, render_markdown, score_components, AuditConfig,
    AuditReport, HealthCategory,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::process;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "go-dep-audit")]
#[command(about = "Audit Go project dependencies for health, license and maintenance risks", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the Go project to audit
    #[arg(short = 'p', long, default_value = ".", global = true)]
    project_path: PathBuf,

    /// Path to configuration file (TOML)
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    /// Modules to ignore (can be specified multiple times)
    #[arg(long = "ignore", global = true)]
    ignore_modules: Vec<String>,

    /// Audit indirect (transitive) modules too
    #[arg(long, global = true)]
    include_indirect: bool,

    /// Query GitHub/GitLab for repository activity
    #[arg(long, global = true)]
    fetch_repo: bool,

    /// Enable verbose logging
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan project dependencies and display summary
    Scan {
        /// Display detailed information for each module
        #[arg(long)]
        detailed: bool,
    },

    /// Generate detailed audit report
    Report {
        /// Path to save JSON report
        #[arg(long)]
        output_json: Option<PathBuf>,

        /// Path to save Markdown report
        #[arg(long)]
        output_md: Option<PathBuf>,
    },

    /// Check dependencies against thresholds and exit with code
    Check {
        /// Fail if any module score is below this threshold (0-100)
        #[arg(long, default_value = "50")]
        fail_threshold: u8,

        /// Also fail on license policy violations
        #[arg(long)]
        check_licenses: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} Failed to load config: {:#}", "Error:".red().bold(), e);
            process::exit(1);
        }
    };

    // Ctrl-C aborts outstanding fetches
    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling audit");
            signal_token.cancel();
        }
    });

    // Run audit
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(format!(
        "Scanning dependencies in {}...",
        config.project_path.display()
    ));
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));

    let result = audit_project(&config, &cancel).await;

    spinner.finish_and_clear();

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            eprintln!("{} Audit failed: {}", "Error:".red().bold(), e);
            process::exit(1);
        }
    };

    // Handle subcommand
    let outcome = match cli.command {
        Commands::Scan { detailed } => {
            display_summary(&report);
            if detailed {
                println!();
                display_detailed(&report, &config);
            }
            Ok(())
        }
        Commands::Report {
            output_json,
            output_md,
        } => write_reports(&report, output_json.as_deref(), output_md.as_deref()),
        Commands::Check {
            fail_threshold,
            check_licenses,
        } => {
            run_check(&report, &config, fail_threshold, check_licenses);
            Ok(())
        }
    };

    if let Err(e) = outcome {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Load the config file (if any) and apply command-line overrides
fn load_config(cli: &Cli) -> anyhow::Result<AuditConfig> {
    let mut config = match &cli.config {
        Some(path) => AuditConfig::from_file(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => AuditConfig::default(),
    };

    config.project_path = cli.project_path.clone();
    config.ignore_modules.extend(cli.ignore_modules.iter().cloned());
    config.include_indirect |= cli.include_indirect;
    config.fetch_repo_metadata |= cli.fetch_repo;

    config.validate()?;
    Ok(config)
}

fn percent(count: usize, total: usize) -> f32 {
    if total == 0 {
        0.0
    } else {
        count as f32 / total as f32 * 100.0
    }
}

fn display_summary(report: &AuditReport) {
    let summary = &report.summary;
    let total = summary.total_modules;

    println!("\n{}", "=== Audit Summary ===".bold());
    println!("Project: {}", report.project_path.cyan());
    println!("Total dependencies: {}", total);
    println!(
        "Resolved modules: {} ({} direct, {} transitive)",
        report.footprint.total_modules, report.footprint.direct, report.footprint.transitive
    );
    println!();

    println!("Health Status:");
    println!(
        "  {} {} ({:.1}%)",
        "●".green(),
        format!("Healthy: {}", summary.healthy).green(),
        percent(summary.healthy, total)
    );
    println!(
        "  {} {} ({:.1}%)",
        "●".yellow(),
        format!("Warning: {}", summary.warning).yellow(),
        percent(summary.warning, total)
    );
    println!(
        "  {} {} ({:.1}%)",
        "●".truecolor(255, 165, 0), // Orange
        format!("Stale:   {}", summary.stale).truecolor(255, 165, 0),
        percent(summary.stale, total)
    );
    println!(
        "  {} {} ({:.1}%)",
        "●".red(),
        format!("Risky:   {}", summary.risky).red(),
        percent(summary.risky, total)
    );
    println!();

    println!("Average health score: {:.1}", summary.average_health_score);
    println!("License issues: {}", summary.license_issues);

    if summary.risky > 0 || summary.stale > 0 {
        println!("\n{}", "Risky/Stale Modules:".bold());
        println!(
            "{:<50} {:<24} {:>5}  {:<8} {}",
            "Module", "Version", "Score", "Category", "License"
        );
        for module in report.risky_or_stale() {
            println!(
                "{:<50} {:<24} {:>5}  {:<8} {}",
                module.path,
                module.version,
                module.health_score,
                colorize(module.health_category, format!("{:<8}", module.health_category.to_string())),
                module.license
            );
        }
    }
}

fn colorize(category: HealthCategory, label: String) -> ColoredString {
    match category {
        HealthCategory::Healthy => label.green(),
        HealthCategory::Warning => label.yellow(),
        HealthCategory::Stale => label.truecolor(255, 165, 0),
        HealthCategory::Risky => label.red(),
    }
}

fn display_detailed(report: &AuditReport, config: &AuditConfig) {
    println!("{}", "=== Detailed Results ===".bold());
    let now = Utc::now();

    for module in &report.modules {
        println!(
            "\n{} {} [{}] Score: {}",
            module.path.bold(),
            module.version,
            colorize(module.health_category, module.health_category.to_string()),
            module.health_score
        );

        println!("  License: {} ({})", module.license, module.license_risk);
        println!("  Direct: {}", module.direct_dep);
        if let Some(published) = module.last_published {
            println!("  Last published: {}", published.format("%Y-%m-%d"));
        }

        match &module.metadata {
            Some(metadata) => {
                let scores = score_components(metadata, now);
                println!(
                    "  Components: recency {:.0}, versions {:.0}, commits {:.0}, community {:.0}",
                    scores.recency, scores.version_frequency, scores.commit_activity, scores.community
                );
                if let Some(url) = &metadata.repository_url {
                    println!("  Repository: {}", url);
                }
            }
            None => println!("  {}", "Metadata unavailable".yellow()),
        }

        let decision = check_policy(&module.license, &config.license_policy);
        if !decision.warnings.is_empty() {
            println!("  Warnings:");
            for warning in &decision.warnings {
                println!("    - {}", warning.yellow());
            }
        }
    }
}

fn write_reports(
    report: &AuditReport,
    output_json: Option<&Path>,
    output_md: Option<&Path>,
) -> anyhow::Result<()> {
    if let Some(path) = output_json {
        let json = render_json(&report.modules)?;
        std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        println!("JSON report saved to {}", path.display());
    }

    if let Some(path) = output_md {
        std::fs::write(path, render_markdown(report))
            .with_context(|| format!("writing {}", path.display()))?;
        println!("Markdown report saved to {}", path.display());
    }

    // Default to JSON on stdout
    if output_json.is_none() && output_md.is_none() {
        println!("{}", render_json(&report.modules)?);
    }

    Ok(())
}

fn run_check(report: &AuditReport, config: &AuditConfig, fail_threshold: u8, check_licenses: bool) {
    let mut failures = Vec::new();

    for module in &report.modules {
        if module.health_score < fail_threshold {
            failures.push(format!(
                "  - {}@{}: score {} is below threshold {}",
                module.path, module.version, module.health_score, fail_threshold
            ));
        }

        if check_licenses {
            let decision = check_policy(&module.license, &config.license_policy);
            if !decision.allowed {
                failures.push(format!(
                    "  - {}@{}: license {} ({})",
                    module.path,
                    module.version,
                    module.license,
                    decision.warnings.join(", ")
                ));
            }
        }
    }

    if !failures.is_empty() {
        eprintln!("{} {} check failures:", "Failed:".red().bold(), failures.len());
        for failure in failures {
            eprintln!("{}", failure);
        }
        process::exit(1);
    }

    println!("{} All checks passed.", "Success:".green().bold());
}
