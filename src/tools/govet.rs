//! go vet adapter.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use tracing::debug;

use super::{process, relative_path, AnalysisTool};
use crate::error::{AnalysisError, Result};
use crate::models::{Category, Issue, Severity};

const NAME: &str = "govet";

/// `path:line[:column]: message`
static DIAGNOSTIC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.+?):(\d+):(?:(\d+):)?\s*(.+)$").expect("valid regex"));

/// Drives `go vet ./...` and parses its textual diagnostics.
pub struct GoVet {
    binary: String,
}

impl GoVet {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for GoVet {
    fn default() -> Self {
        Self::new("go")
    }
}

#[async_trait]
impl AnalysisTool for GoVet {
    fn name(&self) -> &str {
        NAME
    }

    fn is_available(&self) -> bool {
        process::find_executable(&self.binary).is_some()
    }

    /// go vet has no config file; `config` is ignored.
    async fn run(&self, work_dir: &Path, _config: Option<&Path>) -> Result<Vec<Issue>> {
        let args = vec!["vet".to_string(), "./...".to_string()];
        let output = process::run(&self.binary, &args, work_dir)
            .await
            .map_err(|e| AnalysisError::ToolExecution {
                tool: NAME.to_string(),
                message: e.to_string(),
            })?;

        // Non-zero exit is expected when vet reports anything.
        let issues = parse_vet_output(work_dir, &output.combined());
        debug!(tool = NAME, issues = issues.len(), status = %output.status, "completed");
        Ok(issues)
    }
}

/// Parse line-oriented vet diagnostics. Lines that do not match are skipped.
///
/// Type-check errors carry a `vet: ` prefix ahead of the position.
pub fn parse_vet_output(work_dir: &Path, output: &str) -> Vec<Issue> {
    output
        .lines()
        .map(str::trim)
        .map(|line| line.strip_prefix("vet: ").unwrap_or(line))
        .filter(|line| !line.is_empty())
        .filter_map(|line| DIAGNOSTIC_RE.captures(line))
        .filter_map(|caps| {
            let line = caps[2].parse::<usize>().ok()?;
            let column = caps
                .get(3)
                .and_then(|m| m.as_str().parse::<usize>().ok())
                .unwrap_or(0);
            let message = caps[4].to_string();

            Some(Issue {
                file: relative_path(work_dir, &caps[1]),
                line,
                column,
                severity: Severity::Warning,
                category: categorize_message(&message),
                rule: NAME.to_string(),
                message,
                source: NAME.to_string(),
                code: None,
            })
        })
        .collect()
}

/// Guess a category from keywords in a vet message.
pub fn categorize_message(message: &str) -> Category {
    let message = message.to_lowercase();

    if message.contains("shadow") {
        Category::Logic
    } else if message.contains("printf") || message.contains("format") {
        Category::Format
    } else if message.contains("composite literal") {
        Category::Style
    } else if message.contains("unreachable") {
        Category::DeadCode
    } else if message.contains("nil") {
        Category::ErrorHandling
    } else {
        Category::Logic
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_and_without_column() {
        let output = "\
# example.com/demo
./main.go:12:2: fmt.Printf format %d has arg s of wrong type string
./pkg/util.go:30: unreachable code
";
        let issues = parse_vet_output(Path::new("/work"), output);

        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].file, "main.go");
        assert_eq!((issues[0].line, issues[0].column), (12, 2));
        assert_eq!(issues[0].category, Category::Format);
        assert_eq!(issues[0].severity, Severity::Warning);

        assert_eq!(issues[1].file, "pkg/util.go");
        assert_eq!((issues[1].line, issues[1].column), (30, 0));
        assert_eq!(issues[1].category, Category::DeadCode);
        assert_eq!(issues[1].message, "unreachable code");
    }

    #[test]
    fn test_absolute_paths_are_relativized() {
        let issues = parse_vet_output(
            Path::new("/work"),
            "/work/cmd/app.go:4:9: declaration of \"err\" shadows declaration at line 2",
        );
        assert_eq!(issues[0].file, "cmd/app.go");
        assert_eq!(issues[0].category, Category::Logic);
    }

    #[test]
    fn test_type_check_errors_drop_vet_prefix() {
        let output = "\
# example.com/demo
vet: ./main.go:2:1: expected 'package', found fun
";
        let issues = parse_vet_output(Path::new("/work"), output);

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].file, "main.go");
        assert_eq!((issues[0].line, issues[0].column), (2, 1));
        assert_eq!(issues[0].message, "expected 'package', found fun");
    }

    #[test]
    fn test_unparseable_output_yields_nothing() {
        let output = "go: go.mod file not found in current directory or any parent directory\n";
        assert!(parse_vet_output(Path::new("/work"), output).is_empty());
        assert!(parse_vet_output(Path::new("/work"), "").is_empty());
    }

    #[test]
    fn test_categorize_message() {
        assert_eq!(categorize_message("possible nil pointer dereference"), Category::ErrorHandling);
        assert_eq!(categorize_message("composite literal uses unkeyed fields"), Category::Style);
        assert_eq!(categorize_message("self-assignment of x to x"), Category::Logic);
        assert_eq!(categorize_message("Printf call has arguments"), Category::Format);
    }
}
