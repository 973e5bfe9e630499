//! Module graph resolution from `go list` or, as a fallback, `go.mod`

use crate::error::{AuditError, Result};
use crate::types::Module;
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Produces the ordered module list of a project
#[async_trait]
pub trait ModuleResolver: Send + Sync {
    async fn resolve(&self, project_path: &Path) -> Result<Vec<Module>>;
}

/// Resolves the full module graph with `go list -m -json all`
#[derive(Debug, Clone, Default)]
pub struct GoListResolver {
    cancel: CancellationToken,
}

impl GoListResolver {
    pub fn new(cancel: CancellationToken) -> Self {
        Self { cancel }
    }
}

#[async_trait]
impl ModuleResolver for GoListResolver {
    async fn resolve(&self, project_path: &Path) -> Result<Vec<Module>> {
        let manifest = project_path.join("go.mod");
        if !manifest.exists() {
            return Err(AuditError::resolve(format!(
                "go.mod not found at {}",
                manifest.display()
            )));
        }

        if self.cancel.is_cancelled() {
            return Err(AuditError::Cancelled);
        }

        let child = Command::new("go")
            .args(["list", "-m", "-json", "all"])
            .current_dir(project_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| AuditError::resolve(format!("Failed to run go list: {}", e)))?;

        let output = tokio::select! {
            _ = self.cancel.cancelled() => return Err(AuditError::Cancelled),
            output = child.wait_with_output() => output?,
        };

        if !output.status.success() {
            return Err(AuditError::resolve(format!(
                "go list failed ({}): {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        parse_go_list_output(&output.stdout)
    }
}

/// Decode the stream of JSON objects printed by `go list -m -json`
pub fn parse_go_list_output(stdout: &[u8]) -> Result<Vec<Module>> {
    serde_json::Deserializer::from_slice(stdout)
        .into_iter::<Module>()
        .map(|module| {
            module.map_err(|e| AuditError::parse(format!("Failed to decode module JSON: {}", e)))
        })
        .collect()
}

/// Reads `require` directives from `go.mod` directly.
///
/// Only what go.mod lists is returned; modules annotated `// indirect` are
/// flagged as indirect.
#[derive(Debug, Clone, Copy, Default)]
pub struct GoModResolver;

#[async_trait]
impl ModuleResolver for GoModResolver {
    async fn resolve(&self, project_path: &Path) -> Result<Vec<Module>> {
        let manifest = project_path.join("go.mod");
        let content = tokio::fs::read_to_string(&manifest).await.map_err(|e| {
            AuditError::resolve(format!("Failed to read {}: {}", manifest.display(), e))
        })?;
        Ok(parse_go_mod(&content))
    }
}

/// Parse the `require` directives of a go.mod file
pub fn parse_go_mod(content: &str) -> Vec<Module> {
    let mut modules = Vec::new();
    let mut block: Option<&str> = None;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with("//") {
            continue;
        }

        if let Some(directive) = block {
            if line == ")" {
                block = None;
            } else if directive == "require" {
                if let Some(module) = parse_require_line(line) {
                    modules.push(module);
                }
            }
            continue;
        }

        if let Some(directive) = line.strip_suffix('(').map(str::trim) {
            if !directive.contains(' ') {
                block = Some(directive);
                continue;
            }
        }

        if let Some(rest) = line.strip_prefix("require ") {
            if let Some(module) = parse_require_line(rest.trim()) {
                modules.push(module);
            }
        }
    }

    modules
}

/// Parse `path version [// indirect]`
fn parse_require_line(line: &str) -> Option<Module> {
    let (spec, comment) = match line.split_once("//") {
        Some((spec, comment)) => (spec, Some(comment)),
        None => (line, None),
    };

    let mut fields = spec.split_whitespace();
    let path = fields.next()?;
    let version = fields.next()?;

    let indirect = comment
        .map(|c| c.split(|ch: char| ch.is_whitespace() || ch == ';').any(|w| w == "indirect"))
        .unwrap_or(false);

    Some(Module {
        path: path.to_string(),
        version: version.to_string(),
        indirect,
        ..Module::default()
    })
}

/// Resolve with `go list`, falling back to go.mod parsing.
///
/// Only fails when neither source yields a module list.
pub async fn resolve_modules(project_path: &Path, cancel: &CancellationToken) -> Result<Vec<Module>> {
    match GoListResolver::new(cancel.clone()).resolve(project_path).await {
        Ok(modules) => {
            info!("Resolved {} modules with go list", modules.len());
            Ok(modules)
        }
        Err(AuditError::Cancelled) => Err(AuditError::Cancelled),
        Err(_) if cancel.is_cancelled() => Err(AuditError::Cancelled),
        Err(e) => {
            warn!("'go list' failed ({}), falling back to go.mod parsing", e);
            let modules = GoModResolver.resolve(project_path).await?;
            debug!("Parsed {} requirements from go.mod", modules.len());
            Ok(modules)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GO_MOD: &str = r#"module example.com/app

go 1.21

require github.com/spf13/cobra v1.8.0

require (
	github.com/stretchr/testify v1.8.4
	golang.org/x/text v0.14.0 // indirect
	// a commented-out requirement
	gopkg.in/yaml.v3 v3.0.1 // indirect; pinned
)

replace (
	github.com/old/mod v1.0.0 => github.com/new/mod v1.1.0
)

exclude github.com/bad/mod v0.0.1
"#;

    #[test]
    fn test_parse_go_mod() {
        let modules = parse_go_mod(GO_MOD);
        let paths: Vec<_> = modules.iter().map(|m| m.path.as_str()).collect();

        assert_eq!(
            paths,
            vec![
                "github.com/spf13/cobra",
                "github.com/stretchr/testify",
                "golang.org/x/text",
                "gopkg.in/yaml.v3",
            ]
        );
        assert_eq!(modules[0].version, "v1.8.0");
        assert!(!modules[0].indirect);
        assert!(!modules[1].indirect);
        assert!(modules[2].indirect);
        assert!(modules[3].indirect);
        assert!(modules.iter().all(|m| !m.main));
    }

    #[test]
    fn test_parse_go_list_output() {
        let stdout = br#"{
	"Path": "example.com/app",
	"Main": true,
	"GoVersion": "1.21"
}
{
	"Path": "github.com/spf13/cobra",
	"Version": "v1.8.0",
	"Time": "2023-11-04T04:33:51Z"
}
{
	"Path": "golang.org/x/text",
	"Version": "v0.14.0",
	"Indirect": true
}
"#;

        let modules = parse_go_list_output(stdout).unwrap();
        assert_eq!(modules.len(), 3);
        assert!(modules[0].main);
        assert_eq!(modules[1].path, "github.com/spf13/cobra");
        assert!(modules[2].indirect);
    }

    #[test]
    fn test_parse_go_list_output_rejects_garbage() {
        assert!(parse_go_list_output(b"{\"Path\": ").is_err());
    }

    #[tokio::test]
    async fn test_go_mod_resolver() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("go.mod"), GO_MOD).unwrap();

        let modules = GoModResolver.resolve(dir.path()).await.unwrap();
        assert_eq!(modules.len(), 4);
    }

    #[tokio::test]
    async fn test_cancelled_resolution_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("go.mod"), GO_MOD).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = resolve_modules(dir.path(), &cancel).await;
        assert!(matches!(result, Err(AuditError::Cancelled)));
    }

    #[test]
    fn test_missing_manifest_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let cancel = CancellationToken::new();

        let result = tokio_test::block_on(resolve_modules(dir.path(), &cancel));
        assert!(matches!(result, Err(AuditError::ResolveError(_))));
    }
}
