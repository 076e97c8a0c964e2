//! Aggregation, scoring, and suggestion generation.
//!
//! Everything here is a pure function of an issue set: the same issues,
//! file count, and duration always yield the same summary.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::models::{Category, Issue, Priority, Severity, Summary, Suggestion};

/// Points deducted from the score per issue severity.
pub mod points {
    pub const ERROR: f64 = 5.0;
    pub const WARNING: f64 = 2.0;
    pub const INFO: f64 = 0.5;
}

/// Category counts above which a suggestion is emitted.
pub mod thresholds {
    pub const FORMAT: usize = 5;
    pub const SECURITY: usize = 0;
    pub const PERFORMANCE: usize = 3;
}

pub const MAX_SCORE: f64 = 100.0;

/// Quality score for the given severity counts, floored at 0.
pub fn calculate_score(errors: usize, warnings: usize, infos: usize) -> f64 {
    let deductions = errors as f64 * points::ERROR
        + warnings as f64 * points::WARNING
        + infos as f64 * points::INFO;
    (MAX_SCORE - deductions).max(0.0)
}

/// Count issues per category.
pub fn category_counts(issues: &[Issue]) -> BTreeMap<Category, usize> {
    let mut counts = BTreeMap::new();
    for issue in issues {
        *counts.entry(issue.category).or_insert(0) += 1;
    }
    counts
}

/// Compute the summary for an issue set.
pub fn summarize(
    issues: &[Issue],
    files_analyzed: usize,
    lines_analyzed: usize,
    duration: Duration,
) -> Summary {
    let mut summary = Summary {
        total_issues: issues.len(),
        files_analyzed,
        lines_analyzed,
        duration_ms: duration.as_millis() as u64,
        category_counts: category_counts(issues),
        ..Default::default()
    };

    for issue in issues {
        match issue.severity {
            Severity::Error => summary.error_count += 1,
            Severity::Warning => summary.warning_count += 1,
            Severity::Info => summary.info_count += 1,
        }
    }

    summary.score = calculate_score(
        summary.error_count,
        summary.warning_count,
        summary.info_count,
    );
    summary
}

/// Generate improvement suggestions from category counts.
///
/// Order is fixed: format, security, performance.
pub fn generate_suggestions(counts: &BTreeMap<Category, usize>) -> Vec<Suggestion> {
    let count = |c: Category| counts.get(&c).copied().unwrap_or(0);
    let mut suggestions = Vec::new();

    if count(Category::Format) > thresholds::FORMAT {
        suggestions.push(Suggestion {
            title: "Improve Code Formatting".to_string(),
            description:
                "Multiple formatting issues detected. Run 'gofmt' or 'goimports' to auto-fix."
                    .to_string(),
            priority: Priority::Medium,
            category: Category::Format,
            examples: Some("go fmt ./... or goimports -w .".to_string()),
        });
    }

    if count(Category::Security) > thresholds::SECURITY {
        suggestions.push(Suggestion {
            title: "Address Security Issues".to_string(),
            description:
                "Security vulnerabilities detected. Review and fix these issues immediately."
                    .to_string(),
            priority: Priority::High,
            category: Category::Security,
            examples: None,
        });
    }

    if count(Category::Performance) > thresholds::PERFORMANCE {
        suggestions.push(Suggestion {
            title: "Optimize Performance".to_string(),
            description:
                "Several performance issues found. Consider profiling and optimization."
                    .to_string(),
            priority: Priority::Medium,
            category: Category::Performance,
            examples: None,
        });
    }

    suggestions
}

/// Sort issues by position so output does not depend on tool completion order.
pub fn sort_issues(issues: &mut [Issue]) {
    issues.sort_by(|a, b| a.position_key().cmp(&b.position_key()));
}
