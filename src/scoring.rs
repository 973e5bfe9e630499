//! Health scoring algorithms for modules

use crate::config::ScoringConfig;
use crate::types::{ComponentScores, HealthCategory, ModuleMetadata};
use chrono::{DateTime, Utc};

/// Days over which recency decays by a factor of e
const RECENCY_DECAY_DAYS: f64 = 180.0;

/// Commit-activity score used when no repository is known
const NEUTRAL_COMMIT_SCORE: f64 = 50.0;

/// Calculate the overall health score for a module as of now
pub fn calculate_health_score(metadata: Option<&ModuleMetadata>, config: &ScoringConfig) -> u8 {
    calculate_health_score_at(metadata, config, Utc::now())
}

/// Calculate the overall health score relative to an explicit `now`.
///
/// Missing metadata always scores 0.
pub fn calculate_health_score_at(
    metadata: Option<&ModuleMetadata>,
    config: &ScoringConfig,
    now: DateTime<Utc>,
) -> u8 {
    let Some(metadata) = metadata else {
        return 0;
    };

    let scores = score_components(metadata, now);

    let overall = (scores.recency * config.recency_weight
        + scores.version_frequency * config.version_freq_weight
        + scores.commit_activity * config.commit_activity_weight
        + scores.community * config.community_weight)
        .round();

    overall.clamp(0.0, 100.0) as u8
}

/// Compute the four sub-scores, each clamped to 0-100.
///
/// Without a repository URL, commit activity falls back to a neutral 50 while
/// community drops to 0.
pub fn score_components(metadata: &ModuleMetadata, now: DateTime<Utc>) -> ComponentScores {
    let recency = recency_score(metadata.last_commit_date, now);
    let version_frequency = version_score(metadata.version_count);

    let (commit_activity, community) = if metadata.repository_url.is_some() {
        (
            commit_score(metadata.commit_frequency),
            community_score(metadata.stars, metadata.contributors),
        )
    } else {
        (NEUTRAL_COMMIT_SCORE, 0.0)
    };

    ComponentScores {
        recency,
        version_frequency,
        commit_activity,
        community,
    }
}

/// Map a score to its category, first match from the top wins
pub fn categorize(score: u8, config: &ScoringConfig) -> HealthCategory {
    if score >= config.healthy_threshold {
        HealthCategory::Healthy
    } else if score >= config.warning_threshold {
        HealthCategory::Warning
    } else if score >= config.stale_threshold {
        HealthCategory::Stale
    } else {
        HealthCategory::Risky
    }
}

/// Exponential decay from the last activity: 100 today, ~37 after 180 days
fn recency_score(last_activity: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    let Some(last_activity) = last_activity else {
        return 0.0;
    };

    let days = now.signed_duration_since(last_activity).num_seconds() as f64 / 86_400.0;
    (100.0 * (-days / RECENCY_DECAY_DAYS).exp()).clamp(0.0, 100.0)
}

/// Saturates at 20 published versions
fn version_score(count: u32) -> f64 {
    (count as f64 * 5.0).min(100.0)
}

/// Saturates at 10 commits per month
fn commit_score(commits_per_month: f64) -> f64 {
    (commits_per_month * 10.0).clamp(0.0, 100.0)
}

/// Average of stars/10 and contributors*2, each capped at 100
fn community_score(stars: u32, contributors: u32) -> f64 {
    let star_score = (stars as f64 / 10.0).min(100.0);
    let contributor_score = (contributors as f64 * 2.0).min(100.0);
    (star_score + contributor_score) / 2.0
}
