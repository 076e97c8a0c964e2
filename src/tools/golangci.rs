//! golangci-lint adapter.
//!
//! golangci-lint exits non-zero whenever it reports findings, so the exit
//! status is only consulted when there is no output at all.

use async_trait::async_trait;
use phf::phf_map;
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, warn};

use super::{process, relative_path, AnalysisTool};
use crate::error::{AnalysisError, Result};
use crate::models::{Category, Issue, Severity};

const NAME: &str = "golangci-lint";

/// Sub-linter name -> issue category.
static LINTER_CATEGORIES: phf::Map<&'static str, Category> = phf_map! {
    "gofmt" => Category::Format,
    "goimports" => Category::Format,
    "gofumpt" => Category::Format,
    "gosec" => Category::Security,
    "govet" => Category::Logic,
    "staticcheck" => Category::Logic,
    "errcheck" => Category::ErrorHandling,
    "ineffassign" => Category::Performance,
    "prealloc" => Category::Performance,
    "unused" => Category::DeadCode,
    "deadcode" => Category::DeadCode,
    "varcheck" => Category::DeadCode,
    "structcheck" => Category::DeadCode,
    "gocyclo" => Category::Complexity,
    "gocognit" => Category::Complexity,
    "nestif" => Category::Complexity,
    "dupl" => Category::Duplication,
    "goconst" => Category::Maintainability,
    "revive" => Category::Style,
    "stylecheck" => Category::Style,
};

/// Map a golangci-lint sub-linter name to a category (`other` if unknown).
pub fn category_for_linter(linter: &str) -> Category {
    LINTER_CATEGORIES
        .get(linter)
        .copied()
        .unwrap_or(Category::Other)
}

/// Drives `golangci-lint run` in JSON output mode.
pub struct GolangciLint {
    binary: String,
}

impl GolangciLint {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn args(config: Option<&Path>) -> Vec<String> {
        let mut args = vec![
            "run".to_string(),
            "--out-format=json".to_string(),
            "--print-issued-lines=false".to_string(),
        ];
        if let Some(config) = config {
            args.push("--config".to_string());
            args.push(config.to_string_lossy().to_string());
        }
        args.push("./...".to_string());
        args
    }
}

impl Default for GolangciLint {
    fn default() -> Self {
        Self::new(NAME)
    }
}

#[async_trait]
impl AnalysisTool for GolangciLint {
    fn name(&self) -> &str {
        NAME
    }

    fn is_available(&self) -> bool {
        process::find_executable(&self.binary).is_some()
    }

    async fn run(&self, work_dir: &Path, config: Option<&Path>) -> Result<Vec<Issue>> {
        let args = Self::args(config);
        let output = process::run(&self.binary, &args, work_dir)
            .await
            .map_err(|e| AnalysisError::ToolExecution {
                tool: NAME.to_string(),
                message: e.to_string(),
            })?;

        if output.stdout.trim().is_empty() {
            if output.status.success() {
                return Ok(Vec::new());
            }
            return Err(AnalysisError::ToolExecution {
                tool: NAME.to_string(),
                message: format!("{}: {}", output.status, output.stderr.trim()),
            });
        }

        match parse_output(work_dir, &output.stdout) {
            Ok(issues) => {
                debug!(tool = NAME, issues = issues.len(), "completed");
                Ok(issues)
            }
            Err(e) => {
                warn!(tool = NAME, error = %e, output = %output.stdout, "discarding unparseable output");
                Ok(Vec::new())
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct LintReport {
    #[serde(rename = "Issues", default)]
    issues: Option<Vec<LintIssue>>,
}

#[derive(Debug, Deserialize)]
struct LintIssue {
    #[serde(rename = "FromLinter", default)]
    from_linter: String,
    #[serde(rename = "Text", default)]
    text: String,
    #[serde(rename = "Severity", default)]
    severity: String,
    #[serde(rename = "SourceLines", default)]
    source_lines: Option<SourceLines>,
    #[serde(rename = "Pos", default)]
    pos: LintPosition,
}

/// Older releases emit a single string, newer ones an array of lines.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SourceLines {
    Lines(Vec<String>),
    Text(String),
}

impl SourceLines {
    fn into_text(self) -> Option<String> {
        let text = match self {
            SourceLines::Lines(lines) => lines.join("\n"),
            SourceLines::Text(text) => text,
        };
        (!text.is_empty()).then_some(text)
    }
}

#[derive(Debug, Default, Deserialize)]
struct LintPosition {
    #[serde(rename = "Filename", default)]
    filename: String,
    #[serde(rename = "Line", default)]
    line: usize,
    #[serde(rename = "Column", default)]
    column: usize,
}

/// Parse a golangci-lint JSON report into issues.
pub(crate) fn parse_output(work_dir: &Path, output: &str) -> Result<Vec<Issue>> {
    let report: LintReport =
        serde_json::from_str(output.trim()).map_err(|e| AnalysisError::OutputParse {
            tool: NAME.to_string(),
            message: e.to_string(),
        })?;

    let issues = report
        .issues
        .unwrap_or_default()
        .into_iter()
        .map(|raw| Issue {
            file: relative_path(work_dir, &raw.pos.filename),
            line: raw.pos.line,
            column: raw.pos.column,
            severity: Severity::from_tool(&raw.severity),
            category: category_for_linter(&raw.from_linter),
            message: raw.text,
            source: NAME.to_string(),
            code: raw.source_lines.and_then(SourceLines::into_text),
            rule: raw.from_linter,
        })
        .collect();

    Ok(issues)
}
