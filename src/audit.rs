//! Main audit orchestration logic

use crate::config::AuditConfig;
use crate::error::Result;
use crate::footprint::ProjectFootprint;
use crate::license::{classify_license, detect_license};
use crate::metadata::{MetadataFetcher, ProxyFetcher};
use crate::report::AuditReport;
use crate::resolver::resolve_modules;
use crate::scoring::{calculate_health_score_at, categorize};
use crate::types::{Module, ModuleHealth, ModuleMetadata, UNKNOWN_LICENSE};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Resolve the project's modules and audit them.
///
/// Fails only when the configuration is invalid or no module list can be
/// obtained; per-module problems show up as degraded results.
pub async fn audit_project(config: &AuditConfig, cancel: &CancellationToken) -> Result<AuditReport> {
    config.validate()?;
    info!("Starting audit of project at: {}", config.project_path.display());

    let modules = resolve_modules(&config.project_path, cancel).await?;
    let footprint = ProjectFootprint::from_modules(&modules);

    let fetcher: Arc<dyn MetadataFetcher> = Arc::new(ProxyFetcher::new(config)?);
    let results = audit_modules(&modules, config, fetcher, cancel).await;

    let report = AuditReport::new(config.project_path.display().to_string(), results, footprint);

    info!(
        "Audit complete: {}/{} healthy, {}/{} warnings, {}/{} stale, {}/{} risky",
        report.summary.healthy,
        report.summary.total_modules,
        report.summary.warning,
        report.summary.total_modules,
        report.summary.stale,
        report.summary.total_modules,
        report.summary.risky,
        report.summary.total_modules,
    );

    Ok(report)
}

/// Apply the audit filters, keeping input order.
///
/// Drops the main module and path-less entries, exact matches of the ignore
/// list, and indirect modules unless `include_indirect` is set.
pub fn select_modules<'a>(modules: &'a [Module], config: &AuditConfig) -> Vec<&'a Module> {
    modules
        .iter()
        .filter(|m| !m.main && !m.path.is_empty())
        .filter(|m| {
            let ignored = config.ignore_modules.iter().any(|ignored| ignored == &m.path);
            if ignored {
                debug!("Skipping ignored module: {}", m.path);
            }
            !ignored
        })
        .filter(|m| config.include_indirect || !m.indirect)
        .collect()
}

/// Audit a resolved module list with bounded concurrency.
///
/// Returns one result per selected module, in input order. A module whose
/// fetch fails, is cancelled or whose task panics still gets a result with
/// score 0 and no metadata.
pub async fn audit_modules(
    modules: &[Module],
    config: &AuditConfig,
    fetcher: Arc<dyn MetadataFetcher>,
    cancel: &CancellationToken,
) -> Vec<ModuleHealth> {
    let targets: Vec<Module> = select_modules(modules, config).into_iter().cloned().collect();
    info!(
        "Auditing {} of {} modules (concurrency {})",
        targets.len(),
        modules.len(),
        config.network.concurrency
    );

    let gate = Arc::new(Semaphore::new(config.network.concurrency.max(1)));
    let config = Arc::new(config.clone());

    // One task per module; each handle is the only writer of its slot
    let handles: Vec<_> = targets
        .iter()
        .cloned()
        .map(|module| {
            let gate = Arc::clone(&gate);
            let fetcher = Arc::clone(&fetcher);
            let config = Arc::clone(&config);
            let cancel = cancel.clone();

            tokio::spawn(async move {
                let _permit = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        debug!("Cancelled before start: {}", module.path);
                        return unresolved_health(&module, &config);
                    }
                    permit = gate.acquire_owned() => match permit {
                        Ok(permit) => permit,
                        Err(e) => {
                            warn!("Admission gate closed for {}: {}", module.path, e);
                            return unresolved_health(&module, &config);
                        }
                    },
                };

                audit_module(&module, &config, fetcher.as_ref(), &cancel).await
            })
        })
        .collect();

    // Awaiting in input order is the barrier and fixes the output order
    let mut results = Vec::with_capacity(handles.len());
    for (module, handle) in targets.iter().zip(handles) {
        match handle.await {
            Ok(health) => results.push(health),
            Err(e) => {
                warn!("Audit task for {} failed: {}", module.path, e);
                results.push(unresolved_health(module, &config));
            }
        }
    }

    if cancel.is_cancelled() {
        warn!("Audit cancelled; unfinished modules are reported without metadata");
    }

    results
}

/// Fetch, score and classify one module
async fn audit_module(
    module: &Module,
    config: &AuditConfig,
    fetcher: &dyn MetadataFetcher,
    cancel: &CancellationToken,
) -> ModuleHealth {
    debug!("Processing module: {}@{}", module.path, module.version);

    let metadata = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            debug!("Fetch cancelled for {}", module.path);
            None
        }
        result = fetcher.fetch(&module.path, &module.version) => match result {
            Ok(metadata) => Some(metadata),
            Err(e) if e.is_remote() => {
                warn!("Failed to fetch metadata for {}@{}: {}", module.path, module.version, e);
                None
            }
            Err(e) => {
                error!("Metadata fetch for {}@{} failed locally: {}", module.path, module.version, e);
                None
            }
        },
    };

    build_health(module, metadata, config, Utc::now())
}

/// Assemble the result record for a module from whatever metadata was fetched
pub fn build_health(
    module: &Module,
    metadata: Option<ModuleMetadata>,
    config: &AuditConfig,
    now: DateTime<Utc>,
) -> ModuleHealth {
    let health_score = calculate_health_score_at(metadata.as_ref(), &config.scoring, now);
    let health_category = categorize(health_score, &config.scoring);

    let license = detect_license(&module.path, &module.version, metadata.as_ref())
        .unwrap_or_else(|e| {
            debug!("License detection failed for {}: {}", module.path, e);
            UNKNOWN_LICENSE.to_string()
        });
    let license_risk = classify_license(&license);

    ModuleHealth {
        path: module.path.clone(),
        version: module.version.clone(),
        health_score,
        health_category,
        license,
        license_risk,
        // Per-module footprint is not computed
        footprint_risk: 0.0,
        // Fall back to the resolver's version time when no metadata came back
        last_published: metadata
            .as_ref()
            .and_then(|m| m.last_commit_date)
            .or_else(|| module.published_at()),
        direct_dep: !module.indirect,
        metadata,
    }
}

fn unresolved_health(module: &Module, config: &AuditConfig) -> ModuleHealth {
    build_health(module, None, config, Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{HealthCategory, LicenseRisk};

    fn main_module() -> Module {
        Module {
            path: "example.com/app".to_string(),
            main: true,
            ..Module::default()
        }
    }

    #[test]
    fn test_select_modules_filters_in_order() {
        let modules = vec![
            main_module(),
            Module::new("", "v1.0.0"),
            Module::new("github.com/a/one", "v1.0.0"),
            Module::new("github.com/a/ignored", "v1.0.0"),
            Module::new("github.com/a/ignored/sub", "v1.0.0"),
            Module::new("github.com/a/transitive", "v1.0.0").indirect(),
            Module::new("github.com/a/two", "v2.0.0"),
        ];
        let config = AuditConfig::builder()
            .ignore_module("github.com/a/ignored")
            .build();

        let selected: Vec<_> = select_modules(&modules, &config)
            .into_iter()
            .map(|m| m.path.as_str())
            .collect();
        assert_eq!(
            selected,
            vec!["github.com/a/one", "github.com/a/ignored/sub", "github.com/a/two"]
        );

        let config = AuditConfig::builder().include_indirect(true).build();
        assert_eq!(select_modules(&modules, &config).len(), 5);
    }

    #[test]
    fn test_build_health_without_metadata() {
        let module = Module::new("github.com/x/y", "v1.0.0").indirect();
        let health = build_health(&module, None, &AuditConfig::default(), Utc::now());

        assert_eq!(health.health_score, 0);
        assert_eq!(health.health_category, HealthCategory::Risky);
        assert_eq!(health.license, UNKNOWN_LICENSE);
        assert_eq!(health.license_risk, LicenseRisk::Unknown);
        assert_eq!(health.footprint_risk, 0.0);
        assert!(health.last_published.is_none());
        assert!(!health.direct_dep);
        assert!(health.metadata.is_none());
    }

    #[test]
    fn test_build_health_falls_back_to_resolver_time() {
        let mut module = Module::new("github.com/x/y", "v1.0.0");
        module.time = Some("2023-10-11T19:46:40Z".to_string());

        let health = build_health(&module, None, &AuditConfig::default(), Utc::now());
        assert_eq!(health.health_score, 0);
        assert_eq!(health.last_published, module.published_at());
        assert!(health.last_published.is_some());

        let now = Utc::now();
        let metadata = ModuleMetadata {
            last_commit_date: Some(now),
            ..ModuleMetadata::default()
        };
        let health = build_health(&module, Some(metadata), &AuditConfig::default(), now);
        assert_eq!(health.last_published, Some(now));
    }

    #[test]
    fn test_build_health_with_metadata() {
        let now = Utc::now();
        let module = Module::new("github.com/x/y", "v1.0.0");
        let metadata = ModuleMetadata {
            repository_url: Some("https://github.com/x/y".to_string()),
            last_commit_date: Some(now),
            version_count: 25,
            commit_frequency: 10.0,
            stars: 1000,
            contributors: 50,
            license: Some("MIT".to_string()),
            ..ModuleMetadata::default()
        };

        let health = build_health(&module, Some(metadata), &AuditConfig::default(), now);
        assert!(health.health_score >= 90);
        assert_eq!(health.health_category, HealthCategory::Healthy);
        assert_eq!(health.license, "MIT");
        assert_eq!(health.license_risk, LicenseRisk::Permissive);
        assert_eq!(health.last_published, Some(now));
        assert!(health.direct_dep);
    }
}
