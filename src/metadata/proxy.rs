//! Fetch module information from a Go module proxy

use crate::error::{AuditError, Result};
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

/// Response of `{proxy}/{module}/@v/{version}.info`
#[derive(Debug, Clone, Deserialize)]
pub struct ProxyInfo {
    #[serde(rename = "Version")]
    pub version: String,
    #[serde(rename = "Time")]
    pub time: DateTime<Utc>,
}

/// Client for the GOPROXY protocol
#[derive(Debug, Clone)]
pub struct ProxyClient {
    client: Client,
    base_url: String,
}

impl ProxyClient {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Fetch version info (publish time) for one module version
    pub async fn fetch_info(&self, module_path: &str, version: &str) -> Result<ProxyInfo> {
        let url = format!(
            "{}/{}/@v/{}.info",
            self.base_url,
            escape_path(module_path),
            escape_path(version)
        );
        debug!("Fetching proxy info: {}", url);

        let response = self.client.get(&url).send().await?;
        match response.status() {
            status if status.is_success() => Ok(response.json::<ProxyInfo>().await?),
            StatusCode::NOT_FOUND | StatusCode::GONE => Err(AuditError::ModuleNotFound(format!(
                "{}@{}",
                module_path, version
            ))),
            status => Err(AuditError::api("module proxy", format!("HTTP {}", status))),
        }
    }

    /// Count the versions the proxy lists for a module
    pub async fn fetch_version_count(&self, module_path: &str) -> Result<u32> {
        let url = format!("{}/{}/@v/list", self.base_url, escape_path(module_path));
        debug!("Fetching proxy version list: {}", url);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(AuditError::api(
                "module proxy",
                format!("HTTP {}", response.status()),
            ));
        }

        let body = response.text().await?;
        Ok(count_versions(&body))
    }
}

/// One version per line; blank lines are ignored
fn count_versions(list: &str) -> u32 {
    list.lines().filter(|line| !line.trim().is_empty()).count() as u32
}

/// Apply the proxy case-encoding: every upper-case letter becomes `!` followed
/// by its lower-case form.
pub fn escape_path(path: &str) -> String {
    let mut escaped = String::with_capacity(path.len());
    for c in path.chars() {
        if c.is_ascii_uppercase() {
            escaped.push('!');
            escaped.push(c.to_ascii_lowercase());
        } else {
            escaped.push(c);
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_path() {
        assert_eq!(escape_path("github.com/pkg/errors"), "github.com/pkg/errors");
        assert_eq!(
            escape_path("github.com/Azure/azure-sdk-for-go"),
            "github.com/!azure/azure-sdk-for-go"
        );
        assert_eq!(escape_path("github.com/BurntSushi/toml"), "github.com/!burnt!sushi/toml");
    }

    #[test]
    fn test_count_versions() {
        assert_eq!(count_versions(""), 0);
        assert_eq!(count_versions("v1.0.0\nv1.1.0\n\nv1.2.0\n"), 3);
    }

    #[tokio::test]
    async fn test_fetch_info_and_versions() {
        let mut server = mockito::Server::new_async().await;
        let info = server
            .mock("GET", "/github.com/!burnt!sushi/toml/@v/v1.3.2.info")
            .with_status(200)
            .with_body(r#"{"Version":"v1.3.2","Time":"2023-06-08T06:26:36Z"}"#)
            .create_async()
            .await;
        let list = server
            .mock("GET", "/github.com/!burnt!sushi/toml/@v/list")
            .with_status(200)
            .with_body("v1.0.0\nv1.1.0\nv1.2.0\nv1.3.2\n")
            .create_async()
            .await;

        let client = ProxyClient::new(Client::new(), &server.url());

        let fetched = client.fetch_info("github.com/BurntSushi/toml", "v1.3.2").await.unwrap();
        assert_eq!(fetched.version, "v1.3.2");
        assert_eq!(fetched.time.to_rfc3339(), "2023-06-08T06:26:36+00:00");

        let count = client.fetch_version_count("github.com/BurntSushi/toml").await.unwrap();
        assert_eq!(count, 4);

        info.assert_async().await;
        list.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_info_not_found() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/example.com/missing/@v/v0.1.0.info")
            .with_status(404)
            .create_async()
            .await;

        let client = ProxyClient::new(Client::new(), &server.url());
        let err = client.fetch_info("example.com/missing", "v0.1.0").await.unwrap_err();
        assert!(matches!(err, AuditError::ModuleNotFound(_)));
    }
}
