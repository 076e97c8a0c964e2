//! Core data model: requests, normalized issues, and result bundles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{AnalysisError, Result};

/// Named strictness profile, mapped to a predefined config template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Standard {
    Strict,
    #[default]
    Standard,
    Relaxed,
    Custom,
}

impl Standard {
    pub fn as_str(&self) -> &'static str {
        match self {
            Standard::Strict => "strict",
            Standard::Standard => "standard",
            Standard::Relaxed => "relaxed",
            Standard::Custom => "custom",
        }
    }
}

impl std::fmt::Display for Standard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Standard {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "strict" => Ok(Standard::Strict),
            "standard" => Ok(Standard::Standard),
            "relaxed" => Ok(Standard::Relaxed),
            "custom" => Ok(Standard::Custom),
            _ => Err(format!(
                "unknown standard: {} (must be strict, standard, relaxed, or custom)",
                s
            )),
        }
    }
}

/// Report format requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Markdown,
    Pretty,
    Sarif,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "pretty" | "text" => Ok(OutputFormat::Pretty),
            "sarif" => Ok(OutputFormat::Sarif),
            _ => Err(format!(
                "invalid format {:?}, must be 'json', 'markdown', 'pretty', or 'sarif'",
                s
            )),
        }
    }
}

/// A code analysis request, agnostic to the transport that produced it.
///
/// Exactly one of `code`, `file_path`, or `project_dir` must be set.
/// Empty values count as unset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_dir: Option<PathBuf>,
    #[serde(default)]
    pub standard: Standard,
    /// Inline config text, required iff `standard` is `custom`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<String>,
    #[serde(default)]
    pub format: OutputFormat,
}

/// The validated input mode of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode<'a> {
    Snippet(&'a str),
    File(&'a Path),
    Project(&'a Path),
}

impl AnalysisRequest {
    /// Request analysis of an inline code snippet.
    pub fn snippet(code: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            ..Default::default()
        }
    }

    /// Request analysis of a single file (and its package directory).
    pub fn file<P: AsRef<Path>>(path: P) -> Self {
        Self {
            file_path: Some(path.as_ref().to_path_buf()),
            ..Default::default()
        }
    }

    /// Request analysis of a whole project directory.
    pub fn project<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            project_dir: Some(dir.as_ref().to_path_buf()),
            ..Default::default()
        }
    }

    pub fn with_standard(mut self, standard: Standard) -> Self {
        self.standard = standard;
        self
    }

    /// Use inline config text; switches the standard to `custom`.
    pub fn with_custom_config(mut self, config: impl Into<String>) -> Self {
        self.standard = Standard::Custom;
        self.config = Some(config.into());
        self
    }

    /// Resolve the single populated input mode.
    pub fn input(&self) -> Result<InputMode<'_>> {
        let code = self.code.as_deref().filter(|c| !c.is_empty());
        let file = self
            .file_path
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty());
        let project = self
            .project_dir
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty());

        match (code, file, project) {
            (Some(code), None, None) => Ok(InputMode::Snippet(code)),
            (None, Some(file), None) => Ok(InputMode::File(file)),
            (None, None, Some(dir)) => Ok(InputMode::Project(dir)),
            (None, None, None) => Err(AnalysisError::Input(
                "no code, file, or directory specified".to_string(),
            )),
            _ => Err(AnalysisError::Input(
                "code, file, and directory are mutually exclusive".to_string(),
            )),
        }
    }

    /// Validate the request before any work is done.
    pub fn validate(&self) -> Result<()> {
        self.input()?;
        let has_config = self.config.as_deref().is_some_and(|c| !c.trim().is_empty());
        match (self.standard, has_config) {
            (Standard::Custom, false) => Err(AnalysisError::Input(
                "custom standard requires config content".to_string(),
            )),
            (Standard::Custom, true) | (_, false) => Ok(()),
            (standard, true) => Err(AnalysisError::Input(format!(
                "config content is only accepted with the custom standard, not {}",
                standard
            ))),
        }
    }
}

/// Severity levels for issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    /// Map a tool-reported severity string; anything unrecognized is info.
    pub fn from_tool(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "error" => Severity::Error,
            "warning" => Severity::Warning,
            _ => Severity::Info,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Closed set of issue categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Format,
    Logic,
    Security,
    Performance,
    ErrorHandling,
    DeadCode,
    Complexity,
    Duplication,
    Maintainability,
    Style,
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Format => "format",
            Category::Logic => "logic",
            Category::Security => "security",
            Category::Performance => "performance",
            Category::ErrorHandling => "error-handling",
            Category::DeadCode => "dead-code",
            Category::Complexity => "complexity",
            Category::Duplication => "duplication",
            Category::Maintainability => "maintainability",
            Category::Style => "style",
            Category::Other => "other",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single normalized finding from any tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Path relative to the work area root.
    pub file: String,
    /// 1-based line.
    pub line: usize,
    /// 1-based column, 0 when the tool did not report one.
    pub column: usize,
    pub severity: Severity,
    pub category: Category,
    pub rule: String,
    pub message: String,
    /// Name of the tool that produced the issue.
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl Issue {
    /// Sort key used for deterministic output.
    pub fn position_key(&self) -> (&str, usize, usize, &str, &str, &str) {
        (
            &self.file,
            self.line,
            self.column,
            &self.source,
            &self.rule,
            &self.message,
        )
    }
}

/// Aggregate statistics over an issue set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total_issues: usize,
    pub error_count: usize,
    pub warning_count: usize,
    pub info_count: usize,
    pub files_analyzed: usize,
    pub lines_analyzed: usize,
    pub duration_ms: u64,
    /// Quality score, 0-100, higher is better.
    pub score: f64,
    pub category_counts: BTreeMap<Category, usize>,
}

impl Summary {
    pub fn category_count(&self, category: Category) -> usize {
        self.category_counts.get(&category).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::High => write!(f, "high"),
            Priority::Medium => write!(f, "medium"),
        }
    }
}

/// An improvement suggestion derived from category counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub examples: Option<String>,
}

/// Outcome discriminator of an analysis call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

/// Tool provenance for a result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub standard: Option<Standard>,
    pub tools_used: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools_failed: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_path: Option<PathBuf>,
    pub config_hash: String,
    pub server_version: String,
}

/// The full output of one analysis invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub id: String,
    pub status: Status,
    pub issues: Vec<Issue>,
    pub summary: Summary,
    pub metadata: Metadata,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<Suggestion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AnalysisResult {
    /// Build an `error` result for an analysis that was aborted.
    pub fn failed(err: &AnalysisError) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            status: Status::Error,
            issues: Vec::new(),
            summary: Summary::default(),
            metadata: Metadata {
                server_version: crate::VERSION.to_string(),
                ..Default::default()
            },
            suggestions: Vec::new(),
            error: Some(err.to_string()),
            created_at: Utc::now(),
        }
    }

    /// Whether any error-severity issues were found.
    pub fn has_errors(&self) -> bool {
        self.summary.error_count > 0
    }
}

/// A named project directory in a batch request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub name: String,
    pub path: PathBuf,
}

/// Summary across all projects of a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total_projects: usize,
    pub successful_projects: usize,
    pub failed_projects: usize,
    pub total_issues: usize,
    pub average_score: f64,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchAnalysisResult {
    pub id: String,
    pub status: Status,
    /// Project name -> result. Failed projects carry an `error` result.
    pub results: BTreeMap<String, AnalysisResult>,
    pub summary: BatchSummary,
    pub created_at: DateTime<Utc>,
}

/// Predefined template description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigTemplate {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub level: Standard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: HealthState,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub checks: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_mode_requires_exactly_one() {
        let req = AnalysisRequest::default();
        assert!(matches!(req.input(), Err(AnalysisError::Input(_))));

        let req = AnalysisRequest {
            code: Some("package main".to_string()),
            project_dir: Some(PathBuf::from(".")),
            ..Default::default()
        };
        assert!(matches!(req.input(), Err(AnalysisError::Input(_))));

        let req = AnalysisRequest::project(".");
        assert_eq!(req.input().unwrap(), InputMode::Project(Path::new(".")));
    }

    #[test]
    fn test_empty_values_count_as_unset() {
        let req = AnalysisRequest {
            code: Some(String::new()),
            file_path: Some(PathBuf::from("main.go")),
            ..Default::default()
        };
        assert_eq!(req.input().unwrap(), InputMode::File(Path::new("main.go")));
    }

    #[test]
    fn test_custom_standard_requires_config() {
        let req = AnalysisRequest::snippet("package main").with_standard(Standard::Custom);
        assert!(req.validate().is_err());

        let req = AnalysisRequest::snippet("package main").with_custom_config("run:\n  timeout: 1m\n");
        assert_eq!(req.standard, Standard::Custom);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_config_rejected_for_named_standard() {
        let req = AnalysisRequest {
            code: Some("package main".to_string()),
            standard: Standard::Strict,
            config: Some("linters: {}".to_string()),
            ..Default::default()
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_severity_from_tool() {
        assert_eq!(Severity::from_tool("error"), Severity::Error);
        assert_eq!(Severity::from_tool("Warning"), Severity::Warning);
        assert_eq!(Severity::from_tool(""), Severity::Info);
        assert_eq!(Severity::from_tool("major"), Severity::Info);
    }

    #[test]
    fn test_category_serializes_kebab_case() {
        let json = serde_json::to_string(&Category::ErrorHandling).unwrap();
        assert_eq!(json, "\"error-handling\"");
        let parsed: Category = serde_json::from_str("\"dead-code\"").unwrap();
        assert_eq!(parsed, Category::DeadCode);
        assert!(serde_json::from_str::<Category>("\"nonsense\"").is_err());
    }

    #[test]
    fn test_standard_from_str() {
        assert_eq!("Relaxed".parse::<Standard>().unwrap(), Standard::Relaxed);
        assert!("lenient".parse::<Standard>().is_err());
    }

    #[test]
    fn test_failed_result() {
        let result = AnalysisResult::failed(&AnalysisError::Input("nothing to do".into()));
        assert_eq!(result.status, Status::Error);
        assert!(result.issues.is_empty());
        assert!(result.error.unwrap().contains("nothing to do"));
    }
}
