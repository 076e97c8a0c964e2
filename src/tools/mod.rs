//! Adapters that drive external static-analysis programs.
//!
//! Every adapter implements [`AnalysisTool`]. Which adapters are active is
//! decided by [`ToolKind`] entries in the settings; unavailable binaries are
//! skipped at registration with a warning.

mod golangci;
mod govet;
pub mod process;

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{AnalysisError, Result};
use crate::models::Issue;
use crate::settings::ToolsSettings;

pub use golangci::{category_for_linter, GolangciLint};
pub use govet::{categorize_message, parse_vet_output, GoVet};

/// Uniform contract over heterogeneous external analyzers.
///
/// Implementations must not write into the work area. Dropping the future
/// returned by `run` cancels the invocation and kills any child process.
#[async_trait]
pub trait AnalysisTool: Send + Sync {
    /// Stable tool name, used as the issue `source`.
    fn name(&self) -> &str;

    /// Whether the external binary can be resolved. Side-effect free.
    fn is_available(&self) -> bool;

    /// Run the tool against `work_dir`, optionally scoped to a config artifact.
    async fn run(&self, work_dir: &Path, config: Option<&Path>) -> Result<Vec<Issue>>;
}

/// The known tool variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    GolangciLint,
    GoVet,
}

impl ToolKind {
    pub const ALL: [ToolKind; 2] = [ToolKind::GolangciLint, ToolKind::GoVet];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolKind::GolangciLint => "golangci-lint",
            ToolKind::GoVet => "govet",
        }
    }

    /// Executable used when the settings do not name one.
    pub fn default_binary(&self) -> &'static str {
        match self {
            ToolKind::GolangciLint => "golangci-lint",
            ToolKind::GoVet => "go",
        }
    }

    /// Build the adapter for this kind using the configured binary.
    pub fn build(&self, settings: &ToolsSettings) -> Arc<dyn AnalysisTool> {
        match self {
            ToolKind::GolangciLint => Arc::new(GolangciLint::new(
                settings.golangci_lint.binary_or(self.default_binary()),
            )),
            ToolKind::GoVet => Arc::new(GoVet::new(settings.govet.binary_or(self.default_binary()))),
        }
    }

    pub fn is_enabled(&self, settings: &ToolsSettings) -> bool {
        match self {
            ToolKind::GolangciLint => settings.golangci_lint.enabled,
            ToolKind::GoVet => settings.govet.enabled,
        }
    }
}

impl std::fmt::Display for ToolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Check availability, turning a missing binary into a typed error.
pub fn ensure_available(tool: &dyn AnalysisTool) -> Result<()> {
    if tool.is_available() {
        Ok(())
    } else {
        Err(AnalysisError::ToolUnavailable {
            tool: tool.name().to_string(),
        })
    }
}

/// Build the set of enabled and available tools.
pub fn register_tools(settings: &ToolsSettings) -> Vec<Arc<dyn AnalysisTool>> {
    let mut tools = Vec::new();

    for kind in ToolKind::ALL {
        if !kind.is_enabled(settings) {
            continue;
        }
        let tool = kind.build(settings);
        match ensure_available(tool.as_ref()) {
            Ok(()) => {
                info!(tool = tool.name(), "initialized tool");
                tools.push(tool);
            }
            Err(e) => warn!(tool = tool.name(), error = %e, "skipping unavailable tool"),
        }
    }

    if tools.is_empty() {
        warn!("no analysis tools available; analyses will report zero issues");
    }

    tools
}

/// Rewrite a tool-reported path relative to the work area root.
///
/// Absolute paths under the root are stripped; anything else is kept,
/// minus a leading `./`.
pub fn relative_path(work_dir: &Path, reported: &str) -> String {
    let path = Path::new(reported);
    let rel = if path.is_absolute() {
        path.strip_prefix(work_dir)
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_else(|_| reported.to_string())
    } else {
        reported.to_string()
    };
    let rel = rel.replace('\\', "/");
    rel.strip_prefix("./").map(str::to_string).unwrap_or(rel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;

    #[test]
    fn test_relative_path() {
        let root = Path::new("/tmp/work");
        assert_eq!(relative_path(root, "/tmp/work/pkg/a.go"), "pkg/a.go");
        assert_eq!(relative_path(root, "./main.go"), "main.go");
        assert_eq!(relative_path(root, "main.go"), "main.go");
        assert_eq!(relative_path(root, "/elsewhere/b.go"), "/elsewhere/b.go");
    }

    #[test]
    fn test_disabled_tools_not_registered() {
        let mut settings = Settings::default();
        settings.tools.golangci_lint.enabled = false;
        settings.tools.govet.enabled = false;
        assert!(register_tools(&settings.tools).is_empty());
    }

    #[test]
    fn test_missing_binary_skipped() {
        let mut settings = Settings::default();
        settings.tools.golangci_lint.binary = Some("definitely-not-a-real-linter-binary".to_string());
        settings.tools.govet.enabled = false;
        assert!(register_tools(&settings.tools).is_empty());
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(ToolKind::GolangciLint.to_string(), "golangci-lint");
        assert_eq!(ToolKind::GoVet.to_string(), "govet");
    }
}
