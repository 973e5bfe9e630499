//! Fetch metadata from GitHub repositories

use crate::error::{AuditError, Result};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use tracing::debug;

/// Repository signals collected from GitHub
#[derive(Debug, Clone, PartialEq)]
pub struct GitHubMetadata {
    pub stars: u32,
    pub forks: u32,
    pub open_issues: u32,
    pub pushed_at: Option<DateTime<Utc>>,
    pub license: Option<String>,
    pub contributors: u32,
    /// Commits over the last 30 days
    pub commits_last_month: u32,
}

#[derive(Debug, Deserialize)]
struct GitHubRepo {
    stargazers_count: u32,
    forks_count: u32,
    open_issues_count: u32,
    pushed_at: Option<DateTime<Utc>>,
    license: Option<GitHubLicense>,
}

#[derive(Debug, Deserialize)]
struct GitHubLicense {
    spdx_id: Option<String>,
}

/// Client for the GitHub REST API
#[derive(Debug, Clone)]
pub struct GitHubClient {
    client: Client,
    api_base: String,
}

impl GitHubClient {
    pub fn new(client: Client, api_base: &str) -> Self {
        Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    /// Fetch repository, contributor and recent commit counts
    pub async fn fetch_repo(&self, owner: &str, repo: &str) -> Result<GitHubMetadata> {
        debug!("Fetching GitHub metadata for {}/{}", owner, repo);
        let repo_url = format!("{}/repos/{}/{}", self.api_base, owner, repo);

        let response = check_status(self.client.get(&repo_url).send().await?)?;
        let data: GitHubRepo = response.json().await?;

        // Both counts are optional signals
        let contributors = self
            .count_items(&format!("{}/contributors?per_page=1&anon=true", repo_url))
            .await
            .unwrap_or(0);

        let since = (Utc::now() - Duration::days(30)).to_rfc3339_opts(SecondsFormat::Secs, true);
        let commits_last_month = self
            .count_items(&format!("{}/commits?per_page=1&since={}", repo_url, since))
            .await
            .unwrap_or(0);

        Ok(GitHubMetadata {
            stars: data.stargazers_count,
            forks: data.forks_count,
            open_issues: data.open_issues_count,
            pushed_at: data.pushed_at,
            license: data.license.and_then(|l| l.spdx_id),
            contributors,
            commits_last_month,
        })
    }

    /// Count items of a `per_page=1` listing from its Link header
    async fn count_items(&self, url: &str) -> Result<u32> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Ok(0);
        }

        // GitHub returns Link header with pagination info
        if let Some(last_page) = response
            .headers()
            .get("link")
            .and_then(|v| v.to_str().ok())
            .and_then(extract_last_page)
        {
            return Ok(last_page);
        }

        // Fallback: count items in response
        let items = response.json::<Vec<serde_json::Value>>().await.unwrap_or_default();
        Ok(items.len() as u32)
    }
}

fn check_status(response: Response) -> Result<Response> {
    match response.status() {
        status if status.is_success() => Ok(response),
        StatusCode::NOT_FOUND => Err(AuditError::api("GitHub", "Repository not found")),
        StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => Err(AuditError::RateLimited {
            service: "GitHub".to_string(),
        }),
        status => Err(AuditError::api("GitHub", format!("HTTP {}", status))),
    }
}

/// Extract last page number from Link header
fn extract_last_page(link_header: &str) -> Option<u32> {
    for link in link_header.split(',') {
        if link.contains("rel=\"last\"") {
            return link
                .split("page=")
                .last()
                .and_then(|s| s.split(|c| c == '>' || c == '&').next())
                .and_then(|s| s.parse().ok());
        }
    }
    None
}
