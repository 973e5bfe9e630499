//! Fetch metadata from GitLab repositories

use crate::error::{AuditError, Result};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

/// Repository signals collected from GitLab
#[derive(Debug, Clone, PartialEq)]
pub struct GitLabMetadata {
    pub stars: u32,
    pub forks: u32,
    pub open_issues: u32,
    pub last_activity_at: Option<DateTime<Utc>>,
    pub license: Option<String>,
    pub contributors: u32,
    /// Commits over the last 30 days
    pub commits_last_month: u32,
}

#[derive(Debug, Deserialize)]
struct GitLabProject {
    star_count: u32,
    forks_count: u32,
    #[serde(default)]
    open_issues_count: u32,
    last_activity_at: Option<DateTime<Utc>>,
    license: Option<GitLabLicense>,
}

#[derive(Debug, Deserialize)]
struct GitLabLicense {
    key: Option<String>,
}

/// Client for the GitLab REST API
#[derive(Debug, Clone)]
pub struct GitLabClient {
    client: Client,
    api_base: String,
}

impl GitLabClient {
    pub fn new(client: Client, api_base: &str) -> Self {
        Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    /// Fetch project, contributor and recent commit counts
    pub async fn fetch_project(&self, project_path: &str) -> Result<GitLabMetadata> {
        debug!("Fetching GitLab metadata for {}", project_path);

        // URL-encode the project path
        let project_url = format!(
            "{}/projects/{}",
            self.api_base,
            urlencoding::encode(project_path)
        );

        let response = self.client.get(format!("{}?license=true", project_url)).send().await?;
        match response.status() {
            status if status.is_success() => {}
            StatusCode::NOT_FOUND => return Err(AuditError::api("GitLab", "Project not found")),
            status => return Err(AuditError::api("GitLab", format!("HTTP {}", status))),
        }
        let project: GitLabProject = response.json().await?;

        let contributors = self
            .total_count(&format!("{}/repository/contributors?per_page=1", project_url))
            .await
            .unwrap_or(0);

        let since = (Utc::now() - Duration::days(30)).to_rfc3339_opts(SecondsFormat::Secs, true);
        let commits_last_month = self
            .total_count(&format!(
                "{}/repository/commits?per_page=1&since={}",
                project_url,
                urlencoding::encode(&since)
            ))
            .await
            .unwrap_or(0);

        Ok(GitLabMetadata {
            stars: project.star_count,
            forks: project.forks_count,
            open_issues: project.open_issues_count,
            last_activity_at: project.last_activity_at,
            license: project.license.and_then(|l| l.key),
            contributors,
            commits_last_month,
        })
    }

    /// Read the `x-total` pagination header of a listing
    async fn total_count(&self, url: &str) -> Result<u32> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Ok(0);
        }

        Ok(response
            .headers()
            .get("x-total")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok())
            .unwrap_or(0))
    }
}
