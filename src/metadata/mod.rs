//! Metadata fetchers for the Go module proxy and Git hosting services

pub mod github;
pub mod gitlab;
pub mod proxy;

pub use github::{GitHubClient, GitHubMetadata};
pub use gitlab::{GitLabClient, GitLabMetadata};
pub use proxy::{ProxyClient, ProxyInfo};

use crate::config::{AuditConfig, NetworkConfig};
use crate::error::{AuditError, Result};
use crate::types::ModuleMetadata;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::Client;
use tracing::{debug, warn};

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Source of raw metadata for a module.
///
/// Implementations make a single attempt; the audit engine treats any error
/// as "no metadata" for that module.
#[async_trait]
pub trait MetadataFetcher: Send + Sync {
    async fn fetch(&self, module_path: &str, version: &str) -> Result<ModuleMetadata>;
}

/// Repository hosting derived from a module path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoRef {
    GitHub { owner: String, repo: String },
    GitLab { project: String },
}

impl RepoRef {
    /// Derive the hosting repository from a module path, if it is recognizable
    pub fn from_module_path(module_path: &str) -> Option<Self> {
        let mut segments = module_path.split('/');
        match segments.next()? {
            "github.com" => {
                let owner = segments.next().filter(|s| !s.is_empty())?;
                let repo = segments.next().filter(|s| !s.is_empty())?;
                Some(Self::GitHub {
                    owner: owner.to_string(),
                    repo: repo.to_string(),
                })
            }
            "gitlab.com" => {
                let mut parts: Vec<&str> = segments.filter(|s| !s.is_empty()).collect();
                // Drop a major-version suffix such as `/v2`
                if parts.len() > 2 && is_major_version(parts[parts.len() - 1]) {
                    parts.pop();
                }
                if parts.len() < 2 {
                    return None;
                }
                Some(Self::GitLab {
                    project: parts.join("/"),
                })
            }
            _ => None,
        }
    }

    /// Browsable repository URL
    pub fn url(&self) -> String {
        match self {
            Self::GitHub { owner, repo } => format!("https://github.com/{}/{}", owner, repo),
            Self::GitLab { project } => format!("https://gitlab.com/{}", project),
        }
    }
}

fn is_major_version(segment: &str) -> bool {
    segment
        .strip_prefix('v')
        .map(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
        .unwrap_or(false)
}

/// Repository signals common to all hosts
struct RepoSignals {
    stars: u32,
    forks: u32,
    open_issues: u32,
    contributors: u32,
    commits_last_month: u32,
    last_activity: Option<chrono::DateTime<chrono::Utc>>,
    license: Option<String>,
}

impl From<GitHubMetadata> for RepoSignals {
    fn from(gh: GitHubMetadata) -> Self {
        Self {
            stars: gh.stars,
            forks: gh.forks,
            open_issues: gh.open_issues,
            contributors: gh.contributors,
            commits_last_month: gh.commits_last_month,
            last_activity: gh.pushed_at,
            license: gh.license,
        }
    }
}

impl From<GitLabMetadata> for RepoSignals {
    fn from(gl: GitLabMetadata) -> Self {
        Self {
            stars: gl.stars,
            forks: gl.forks,
            open_issues: gl.open_issues,
            contributors: gl.contributors,
            commits_last_month: gl.commits_last_month,
            last_activity: gl.last_activity_at,
            license: gl.license,
        }
    }
}

/// Metadata fetcher backed by the module proxy and, optionally, the
/// GitHub/GitLab APIs.
#[derive(Debug, Clone)]
pub struct ProxyFetcher {
    proxy: ProxyClient,
    github: GitHubClient,
    gitlab: GitLabClient,
    fetch_repo_metadata: bool,
}

impl ProxyFetcher {
    /// Build the fetcher with one HTTP client per host.
    ///
    /// Every request carries the configured timeout.
    pub fn new(config: &AuditConfig) -> Result<Self> {
        let network = &config.network;

        let mut github_headers = HeaderMap::new();
        github_headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github.v3+json"),
        );
        if let Some(token) = &network.github_token {
            github_headers.insert(AUTHORIZATION, header_value(&format!("token {}", token))?);
        }

        let mut gitlab_headers = HeaderMap::new();
        if let Some(token) = &network.gitlab_token {
            gitlab_headers.insert("private-token", header_value(token)?);
        }

        Ok(Self {
            proxy: ProxyClient::new(build_client(network, HeaderMap::new())?, &network.proxy_url),
            github: GitHubClient::new(build_client(network, github_headers)?, &network.github_api),
            gitlab: GitLabClient::new(build_client(network, gitlab_headers)?, &network.gitlab_api),
            fetch_repo_metadata: config.fetch_repo_metadata,
        })
    }

    async fn fetch_repo(&self, repo: &RepoRef) -> Result<RepoSignals> {
        match repo {
            RepoRef::GitHub { owner, repo } => {
                self.github.fetch_repo(owner, repo).await.map(RepoSignals::from)
            }
            RepoRef::GitLab { project } => {
                self.gitlab.fetch_project(project).await.map(RepoSignals::from)
            }
        }
    }
}

#[async_trait]
impl MetadataFetcher for ProxyFetcher {
    async fn fetch(&self, module_path: &str, version: &str) -> Result<ModuleMetadata> {
        // The publish time is required; everything else is best effort
        let info = self.proxy.fetch_info(module_path, version).await?;

        let version_count = match self.proxy.fetch_version_count(module_path).await {
            Ok(count) => count,
            Err(e) => {
                debug!("Failed to list versions for {}: {}", module_path, e);
                0
            }
        };

        let mut metadata = ModuleMetadata {
            last_commit_date: Some(info.time),
            version_count,
            ..ModuleMetadata::default()
        };

        if !self.fetch_repo_metadata {
            return Ok(metadata);
        }

        let Some(repo) = RepoRef::from_module_path(module_path) else {
            return Ok(metadata);
        };

        match self.fetch_repo(&repo).await {
            Ok(signals) => {
                metadata.repository_url = Some(repo.url());
                metadata.stars = signals.stars;
                metadata.forks = signals.forks;
                metadata.open_issues = signals.open_issues;
                metadata.contributors = signals.contributors;
                metadata.commit_frequency = signals.commits_last_month as f64;
                metadata.license = signals.license;
                if let Some(activity) = signals.last_activity {
                    metadata.last_commit_date = Some(activity.max(info.time));
                }
            }
            Err(e) => {
                warn!("Failed to fetch repository metadata for {}: {}", module_path, e);
            }
        }

        Ok(metadata)
    }
}

/// Build HTTP client with proper configuration
fn build_client(config: &NetworkConfig, headers: HeaderMap) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(config.timeout())
        .default_headers(headers)
        .build()
        .map_err(AuditError::from)
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| AuditError::config(format!("Invalid API token: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_ref_from_module_path() {
        assert_eq!(
            RepoRef::from_module_path("github.com/spf13/cobra"),
            Some(RepoRef::GitHub {
                owner: "spf13".to_string(),
                repo: "cobra".to_string()
            })
        );
        assert_eq!(
            RepoRef::from_module_path("github.com/go-chi/chi/v5")
                .map(|r| r.url())
                .as_deref(),
            Some("https://github.com/go-chi/chi")
        );
        assert_eq!(
            RepoRef::from_module_path("gitlab.com/gitlab-org/api/client-go"),
            Some(RepoRef::GitLab {
                project: "gitlab-org/api/client-go".to_string()
            })
        );
        assert_eq!(
            RepoRef::from_module_path("gitlab.com/group/project/v2"),
            Some(RepoRef::GitLab {
                project: "group/project".to_string()
            })
        );
        assert_eq!(RepoRef::from_module_path("github.com/lonely"), None);
        assert_eq!(RepoRef::from_module_path("golang.org/x/text"), None);
    }

    fn test_config(server_url: &str, fetch_repo_metadata: bool) -> AuditConfig {
        AuditConfig::builder()
            .fetch_repo_metadata(fetch_repo_metadata)
            .network(NetworkConfig {
                proxy_url: server_url.to_string(),
                github_api: server_url.to_string(),
                gitlab_api: server_url.to_string(),
                github_token: None,
                gitlab_token: None,
                ..NetworkConfig::default()
            })
            .build()
    }

    #[tokio::test]
    async fn test_proxy_only_fetch() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/golang.org/x/text/@v/v0.14.0.info")
            .with_status(200)
            .with_body(r#"{"Version":"v0.14.0","Time":"2023-10-11T19:46:40Z"}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/golang.org/x/text/@v/list")
            .with_status(200)
            .with_body("v0.13.0\nv0.14.0\n")
            .create_async()
            .await;

        let fetcher = ProxyFetcher::new(&test_config(&server.url(), true)).unwrap();
        let meta = fetcher.fetch("golang.org/x/text", "v0.14.0").await.unwrap();

        assert_eq!(meta.version_count, 2);
        assert!(meta.last_commit_date.is_some());
        assert!(meta.repository_url.is_none());
    }

    #[tokio::test]
    async fn test_version_list_failure_is_tolerated() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/github.com/x/y/@v/v1.0.0.info")
            .with_status(200)
            .with_body(r#"{"Version":"v1.0.0","Time":"2024-01-01T00:00:00Z"}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/github.com/x/y/@v/list")
            .with_status(500)
            .create_async()
            .await;

        let fetcher = ProxyFetcher::new(&test_config(&server.url(), false)).unwrap();
        let meta = fetcher.fetch("github.com/x/y", "v1.0.0").await.unwrap();

        assert_eq!(meta.version_count, 0);
        assert!(meta.repository_url.is_none());
    }

    #[tokio::test]
    async fn test_repo_failure_leaves_repository_unset() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/github.com/x/y/@v/v1.0.0.info")
            .with_status(200)
            .with_body(r#"{"Version":"v1.0.0","Time":"2024-01-01T00:00:00Z"}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/github.com/x/y/@v/list")
            .with_status(200)
            .with_body("v1.0.0\n")
            .create_async()
            .await;
        server
            .mock("GET", "/repos/x/y")
            .with_status(500)
            .create_async()
            .await;

        let fetcher = ProxyFetcher::new(&test_config(&server.url(), true)).unwrap();
        let meta = fetcher.fetch("github.com/x/y", "v1.0.0").await.unwrap();

        assert_eq!(meta.version_count, 1);
        assert!(meta.repository_url.is_none());
        assert_eq!(meta.stars, 0);
    }

    #[tokio::test]
    async fn test_missing_module_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/github.com/x/gone/@v/v1.0.0.info")
            .with_status(410)
            .create_async()
            .await;

        let fetcher = ProxyFetcher::new(&test_config(&server.url(), false)).unwrap();
        assert!(fetcher.fetch("github.com/x/gone", "v1.0.0").await.is_err());
    }
}
