//! Output formatting for analysis results.
//!
//! Supports four output formats:
//! - JSON: the full result bundle for programmatic consumption
//! - Markdown: a human-readable report for documents and PR comments
//! - Pretty: colored terminal output
//! - SARIF: Static Analysis Results Interchange Format for IDE/CI integration

use colored::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::models::{AnalysisResult, Issue, OutputFormat, Severity, Status};

/// Render a result in the requested format.
pub fn render(result: &AnalysisResult, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => render_json(result),
        OutputFormat::Markdown => render_markdown(result),
        OutputFormat::Pretty => render_pretty(result),
        OutputFormat::Sarif => render_sarif(result),
    }
}

/// Print a result to stdout in the requested format.
pub fn write(result: &AnalysisResult, format: OutputFormat) -> anyhow::Result<()> {
    println!("{}", render(result, format)?);
    Ok(())
}

// =============================================================================
// JSON Format
// =============================================================================

pub fn render_json(result: &AnalysisResult) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(result)?)
}

// =============================================================================
// Markdown Format
// =============================================================================

pub fn render_markdown(result: &AnalysisResult) -> anyhow::Result<String> {
    let mut md = String::new();
    write_markdown(&mut md, result)?;
    Ok(md)
}

fn write_markdown(md: &mut impl fmt::Write, result: &AnalysisResult) -> fmt::Result {
    let summary = &result.summary;

    writeln!(md, "# Code Analysis Report\n")?;
    writeln!(md, "Status: {}", status_label(result.status))?;
    if let Some(error) = &result.error {
        writeln!(md, "Error: {}", error)?;
    }
    writeln!(md, "Score: {:.1}/100\n", summary.score)?;

    writeln!(md, "## Summary\n")?;
    writeln!(md, "- Total Issues: {}", summary.total_issues)?;
    writeln!(md, "- Errors: {}", summary.error_count)?;
    writeln!(md, "- Warnings: {}", summary.warning_count)?;
    writeln!(md, "- Info: {}", summary.info_count)?;
    writeln!(md, "- Files Analyzed: {}", summary.files_analyzed)?;
    writeln!(md, "- Lines Analyzed: {}", summary.lines_analyzed)?;
    writeln!(md, "- Duration: {}ms", summary.duration_ms)?;
    if !result.metadata.tools_used.is_empty() {
        writeln!(md, "- Tools: {}", result.metadata.tools_used.join(", "))?;
    }
    if !result.metadata.tools_failed.is_empty() {
        writeln!(md, "- Tools Failed: {}", result.metadata.tools_failed.join(", "))?;
    }
    writeln!(md)?;

    if !summary.category_counts.is_empty() {
        writeln!(md, "## Categories\n")?;
        writeln!(md, "| Category | Issues |")?;
        writeln!(md, "|----------|--------|")?;
        for (category, count) in &summary.category_counts {
            writeln!(md, "| {} | {} |", category, count)?;
        }
        writeln!(md)?;
    }

    if !result.issues.is_empty() {
        writeln!(md, "## Issues\n")?;
        for (i, issue) in result.issues.iter().enumerate() {
            writeln!(md, "{}. [{}] {}", i + 1, issue.severity, issue.message)?;
            writeln!(md, "   File: {}", location(issue))?;
            writeln!(md, "   Rule: {} ({})\n", issue.rule, issue.source)?;
        }
    }

    if !result.suggestions.is_empty() {
        writeln!(md, "## Suggestions\n")?;
        for (i, s) in result.suggestions.iter().enumerate() {
            writeln!(md, "{}. [{}] {}", i + 1, s.priority, s.title)?;
            writeln!(md, "   {}", s.description)?;
            if let Some(examples) = &s.examples {
                writeln!(md, "   `{}`", examples)?;
            }
            writeln!(md)?;
        }
    }

    Ok(())
}

fn status_label(status: Status) -> &'static str {
    match status {
        Status::Success => "success",
        Status::Error => "error",
    }
}

fn location(issue: &Issue) -> String {
    format!("{}:{}:{}", issue.file, issue.line, issue.column)
}

// =============================================================================
// Pretty Format
// =============================================================================

pub fn render_pretty(result: &AnalysisResult) -> anyhow::Result<String> {
    let mut out = String::new();
    write_pretty(&mut out, result)?;
    Ok(out)
}

fn write_pretty(out: &mut impl fmt::Write, result: &AnalysisResult) -> fmt::Result {
    // Header
    writeln!(out)?;
    writeln!(
        out,
        "  {} v{}",
        "go-standards".cyan().bold(),
        result.metadata.server_version
    )?;
    writeln!(out)?;

    if let Some(standard) = result.metadata.standard {
        writeln!(out, "  {}{}", "Standard: ".dimmed(), standard)?;
    }
    if !result.metadata.tools_used.is_empty() {
        writeln!(
            out,
            "  {}{}",
            "Tools:    ".dimmed(),
            result.metadata.tools_used.join(", ")
        )?;
    }
    if !result.metadata.tools_failed.is_empty() {
        writeln!(
            out,
            "  {}{}",
            "Failed:   ".dimmed(),
            result.metadata.tools_failed.join(", ").yellow()
        )?;
    }
    writeln!(out)?;

    if let Some(error) = &result.error {
        return writeln!(out, "  {} {}", "✗ ERROR".red(), error);
    }

    write_result_summary(out, result)?;

    if !result.issues.is_empty() {
        write_issues(out, &result.issues)?;
    }

    if !result.summary.category_counts.is_empty() {
        write_categories(out, result)?;
    }

    if !result.suggestions.is_empty() {
        writeln!(out, "  {}", "Suggestions:".bold())?;
        for s in &result.suggestions {
            writeln!(out, "    [{}] {}", s.priority, s.title.bold())?;
            writeln!(out, "        {}", s.description)?;
        }
        writeln!(out)?;
    }

    Ok(())
}

fn write_result_summary(out: &mut impl fmt::Write, result: &AnalysisResult) -> fmt::Result {
    let summary = &result.summary;
    let verdict = if summary.error_count == 0 {
        "✓ PASS".green()
    } else {
        "✗ FAIL".red()
    };
    writeln!(
        out,
        "  {}  Score: {}  Files: {}  ({} errors, {} warnings, {} info)",
        verdict,
        colored_score(summary.score),
        summary.files_analyzed,
        summary.error_count,
        summary.warning_count,
        summary.info_count
    )?;
    writeln!(out)
}

fn write_issues(out: &mut impl fmt::Write, issues: &[Issue]) -> fmt::Result {
    writeln!(out, "  {} ({}):", "Issues".bold(), issues.len())?;
    writeln!(out)?;

    for issue in issues {
        writeln!(
            out,
            "    {} {:<18}{}{}",
            severity_tag(issue.severity),
            issue.rule.dimmed(),
            issue.file.blue(),
            format!(":{}:{}", issue.line, issue.column).dimmed()
        )?;
        // Message on next line, indented
        writeln!(out, "            {}", issue.message)?;
        writeln!(out)?;
    }
    Ok(())
}

fn write_categories(out: &mut impl fmt::Write, result: &AnalysisResult) -> fmt::Result {
    writeln!(out, "  {}", "Categories:".bold())?;

    let mut categories: Vec<_> = result.summary.category_counts.iter().collect();
    categories.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));
    for (category, count) in categories {
        let plural = if *count != 1 { "s" } else { "" };
        writeln!(out, "    {:<18} {} issue{}", category.as_str(), count, plural)?;
    }
    writeln!(out)
}

fn colored_score(score: f64) -> ColoredString {
    let text = format!("{:.1}", score);
    match score {
        s if s >= 90.0 => text.green().bold(),
        s if s >= 75.0 => text.green(),
        s if s >= 50.0 => text.yellow(),
        s if s >= 25.0 => text.yellow().bold(),
        _ => text.red(),
    }
}

fn severity_tag(severity: Severity) -> ColoredString {
    match severity {
        Severity::Error => "ERROR".red(),
        Severity::Warning => "WARN ".yellow(),
        Severity::Info => "INFO ".blue(),
    }
}

// =============================================================================
// SARIF Format
// =============================================================================

const SARIF_VERSION: &str = "2.1.0";
const SARIF_SCHEMA: &str = "https://raw.githubusercontent.com/oasis-tcs/sarif-spec/master/Schemata/sarif-schema-2.1.0.json";
const TOOL_NAME: &str = "go-standards";
const INFO_URI: &str = "https://github.com/zen-systems/go-standards";

#[derive(Serialize, Deserialize)]
struct SarifReport {
    version: String,
    #[serde(rename = "$schema")]
    schema: String,
    runs: Vec<SarifRun>,
}

#[derive(Serialize, Deserialize)]
struct SarifRun {
    tool: SarifTool,
    results: Vec<SarifResult>,
}

#[derive(Serialize, Deserialize)]
struct SarifTool {
    driver: SarifDriver,
}

#[derive(Serialize, Deserialize)]
struct SarifDriver {
    name: String,
    version: String,
    #[serde(rename = "informationUri")]
    information_uri: String,
    rules: Vec<SarifRule>,
}

#[derive(Serialize, Deserialize)]
struct SarifRule {
    id: String,
    name: String,
    #[serde(rename = "shortDescription")]
    short_description: SarifMessage,
    #[serde(rename = "defaultConfiguration")]
    default_config: SarifRuleConfig,
}

#[derive(Serialize, Deserialize)]
struct SarifRuleConfig {
    level: String,
}

#[derive(Serialize, Deserialize)]
struct SarifResult {
    #[serde(rename = "ruleId")]
    rule_id: String,
    level: String,
    message: SarifMessage,
    locations: Vec<SarifLocation>,
}

#[derive(Serialize, Deserialize)]
struct SarifMessage {
    text: String,
}

#[derive(Serialize, Deserialize)]
struct SarifLocation {
    #[serde(rename = "physicalLocation")]
    physical_location: SarifPhysicalLocation,
}

#[derive(Serialize, Deserialize)]
struct SarifPhysicalLocation {
    #[serde(rename = "artifactLocation")]
    artifact_location: SarifArtifact,
    region: SarifRegion,
}

#[derive(Serialize, Deserialize)]
struct SarifArtifact {
    uri: String,
}

#[derive(Serialize, Deserialize)]
struct SarifRegion {
    #[serde(rename = "startLine")]
    start_line: usize,
    #[serde(rename = "startColumn", skip_serializing_if = "Option::is_none")]
    start_column: Option<usize>,
}

fn sarif_level(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
        Severity::Info => "note",
    }
}

/// SARIF rule id: `<tool>/<rule>`, or just the tool when they coincide.
fn sarif_rule_id(issue: &Issue) -> String {
    if issue.rule == issue.source || issue.rule.is_empty() {
        issue.source.clone()
    } else {
        format!("{}/{}", issue.source, issue.rule)
    }
}

pub fn render_sarif(result: &AnalysisResult) -> anyhow::Result<String> {
    // Most severe level seen per rule becomes its default.
    let mut rule_levels: BTreeMap<String, (Severity, String)> = BTreeMap::new();
    for issue in &result.issues {
        let entry = rule_levels
            .entry(sarif_rule_id(issue))
            .or_insert((issue.severity, issue.category.to_string()));
        if issue.severity < entry.0 {
            entry.0 = issue.severity;
        }
    }

    let rules: Vec<SarifRule> = rule_levels
        .into_iter()
        .map(|(id, (severity, category))| SarifRule {
            name: id.clone(),
            short_description: SarifMessage {
                text: format!("{} ({})", id, category),
            },
            default_config: SarifRuleConfig {
                level: sarif_level(severity).to_string(),
            },
            id,
        })
        .collect();

    let results: Vec<SarifResult> = result
        .issues
        .iter()
        .map(|issue| SarifResult {
            rule_id: sarif_rule_id(issue),
            level: sarif_level(issue.severity).to_string(),
            message: SarifMessage {
                text: issue.message.clone(),
            },
            locations: vec![SarifLocation {
                physical_location: SarifPhysicalLocation {
                    artifact_location: SarifArtifact {
                        uri: issue.file.clone(),
                    },
                    region: SarifRegion {
                        start_line: issue.line.max(1),
                        start_column: (issue.column > 0).then_some(issue.column),
                    },
                },
            }],
        })
        .collect();

    let report = SarifReport {
        version: SARIF_VERSION.to_string(),
        schema: SARIF_SCHEMA.to_string(),
        runs: vec![SarifRun {
            tool: SarifTool {
                driver: SarifDriver {
                    name: TOOL_NAME.to_string(),
                    version: crate::VERSION.to_string(),
                    information_uri: INFO_URI.to_string(),
                    rules,
                },
            },
            results,
        }],
    };

    Ok(serde_json::to_string_pretty(&report)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, Metadata, Priority, Suggestion, Summary};
    use crate::score;
    use std::time::Duration;

    fn sample_result() -> AnalysisResult {
        let issues = vec![
            Issue {
                file: "main.go".to_string(),
                line: 3,
                column: 2,
                severity: Severity::Error,
                category: Category::Security,
                rule: "gosec".to_string(),
                message: "G101: potential hardcoded credentials".to_string(),
                source: "golangci-lint".to_string(),
                code: None,
            },
            Issue {
                file: "main.go".to_string(),
                line: 7,
                column: 0,
                severity: Severity::Warning,
                category: Category::Logic,
                rule: "govet".to_string(),
                message: "unreachable code".to_string(),
                source: "govet".to_string(),
                code: None,
            },
        ];
        let summary = score::summarize(&issues, 1, 10, Duration::from_millis(42));
        AnalysisResult {
            id: "test-id".to_string(),
            status: Status::Success,
            suggestions: vec![Suggestion {
                title: "Address Security Issues".to_string(),
                description: "Fix them.".to_string(),
                priority: Priority::High,
                category: Category::Security,
                examples: None,
            }],
            issues,
            summary,
            metadata: Metadata {
                tools_used: vec!["golangci-lint".to_string(), "govet".to_string()],
                server_version: "0.1.0".to_string(),
                ..Default::default()
            },
            error: None,
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_json_contains_all_sections() {
        let json = render_json(&sample_result()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["status"], "success");
        assert_eq!(value["summary"]["error_count"], 1);
        assert_eq!(value["summary"]["category_counts"]["security"], 1);
        assert_eq!(value["issues"][0]["category"], "security");
        assert_eq!(value["suggestions"][0]["priority"], "high");
        assert!(value.get("error").is_none());
    }

    #[test]
    fn test_markdown_report() {
        let md = render_markdown(&sample_result()).unwrap();

        assert!(md.starts_with("# Code Analysis Report"));
        assert!(md.contains("Score: 93.0/100"));
        assert!(md.contains("- Errors: 1"));
        assert!(md.contains("File: main.go:3:2"));
        assert!(md.contains("Rule: govet (govet)"));
        assert!(md.contains("1. [high] Address Security Issues"));
        assert!(md.contains("| security | 1 |"));
    }

    #[test]
    fn test_markdown_for_failed_result() {
        let result = AnalysisResult::failed(&crate::error::AnalysisError::Input(
            "no code, file, or directory specified".into(),
        ));
        let md = render_markdown(&result).unwrap();
        assert!(md.contains("Status: error"));
        assert!(md.contains("Error: invalid request"));
        assert!(!md.contains("## Issues"));
    }

    #[test]
    fn test_pretty_report() {
        colored::control::set_override(false);
        let out = render_pretty(&sample_result()).unwrap();

        assert!(out.contains("go-standards v0.1.0"));
        assert!(out.contains("✗ FAIL"));
        assert!(out.contains("Score: 93.0"));
        assert!(out.contains("main.go:3:2"));
        assert!(out.contains("security           1 issue"));
    }

    /// A sink that rejects every write.
    struct Closed;

    impl fmt::Write for Closed {
        fn write_str(&mut self, _: &str) -> fmt::Result {
            Err(fmt::Error)
        }
    }

    #[test]
    fn test_write_errors_propagate() {
        let result = sample_result();
        assert!(write_markdown(&mut Closed, &result).is_err());
        assert!(write_pretty(&mut Closed, &result).is_err());
    }

    #[test]
    fn test_sarif_rules_and_levels() {
        let sarif = render_sarif(&sample_result()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&sarif).unwrap();

        let run = &value["runs"][0];
        assert_eq!(run["tool"]["driver"]["name"], "go-standards");
        assert_eq!(run["tool"]["driver"]["rules"].as_array().unwrap().len(), 2);
        assert_eq!(run["results"][0]["ruleId"], "golangci-lint/gosec");
        assert_eq!(run["results"][0]["level"], "error");
        assert_eq!(run["results"][1]["ruleId"], "govet");
        assert_eq!(run["results"][1]["level"], "warning");
        assert!(run["results"][1]["locations"][0]["physicalLocation"]["region"]
            .get("startColumn")
            .is_none());
    }

    #[test]
    fn test_summary_default_renders() {
        let mut result = sample_result();
        result.issues.clear();
        result.suggestions.clear();
        result.summary = Summary {
            score: 100.0,
            ..Default::default()
        };
        let md = render_markdown(&result).unwrap();
        assert!(md.contains("Score: 100.0/100"));
        assert!(!md.contains("## Suggestions"));
    }
}
