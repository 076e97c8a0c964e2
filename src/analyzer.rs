//! The analysis pipeline.
//!
//! ```text
//! request ─▶ WorkArea ─▶ ResolvedConfig ─▶ tools (fan-out) ─▶ score ─▶ result
//!               │
//!               └──────────── dropped on every exit path ────────────┘
//! ```
//!
//! Tools run concurrently, bounded by `analyzer.concurrent_limit`, under a
//! single deadline shared by the whole call. A tool that fails, times out,
//! or panics is logged and contributes no issues; it never stops the others.

use chrono::Utc;
use futures::stream::{self, StreamExt};
use futures::FutureExt;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::ConfigResolver;
use crate::error::{AnalysisError, Result};
use crate::models::{
    AnalysisRequest, AnalysisResult, BatchAnalysisResult, BatchSummary, HealthState, HealthStatus,
    Issue, Metadata, ProjectInfo, Standard, Status,
};
use crate::score;
use crate::settings::Settings;
use crate::tools::{self, AnalysisTool, ToolKind};
use crate::workarea::WorkArea;

/// Issues gathered from one fan-out over the registered tools.
#[derive(Debug, Default)]
pub struct ToolRun {
    /// Union of every successful tool's issues, in completion order.
    pub issues: Vec<Issue>,
    /// Tools whose invocation failed, sorted by name.
    pub failed: Vec<String>,
}

/// Runs analysis requests against a fixed set of tools.
pub struct Analyzer {
    settings: Settings,
    tools: Vec<Arc<dyn AnalysisTool>>,
    resolver: ConfigResolver,
}

impl Analyzer {
    /// Create an analyzer with every enabled and available tool.
    pub fn new(settings: Settings) -> Self {
        let tools = tools::register_tools(&settings.tools);
        let resolver = ConfigResolver::from_settings(&settings.analyzer);
        Self {
            settings,
            tools,
            resolver,
        }
    }

    /// Replace the registered tool set.
    pub fn with_tools(mut self, tools: Vec<Arc<dyn AnalysisTool>>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_resolver(mut self, resolver: ConfigResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Names of the registered tools, sorted.
    pub fn tool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.iter().map(|t| t.name().to_string()).collect();
        names.sort();
        names
    }

    /// Run one analysis.
    ///
    /// Fatal errors (bad input, work area, config) are returned as `Err`;
    /// tool failures only show up in `metadata.tools_failed`.
    pub async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult> {
        let start = Instant::now();
        let id = Uuid::new_v4().to_string();
        info!(id = %id, standard = %request.standard, "starting analysis");

        request.validate()?;
        let work_area = WorkArea::resolve(request.input()?, &self.settings.analyzer.temp_dir())?;
        let config = self
            .resolver
            .resolve(request.standard, request.config.as_deref())?;

        let run = self.run_tools(work_area.root(), Some(&config.path)).await;
        let mut issues = run.issues;
        score::sort_issues(&mut issues);

        let sources = work_area.count_sources();
        let summary = score::summarize(&issues, sources.files, sources.lines, start.elapsed());
        let suggestions = score::generate_suggestions(&summary.category_counts);

        info!(
            id = %id,
            issues = issues.len(),
            score = summary.score,
            duration_ms = summary.duration_ms,
            "analysis completed"
        );

        Ok(AnalysisResult {
            id,
            status: Status::Success,
            issues,
            summary,
            metadata: Metadata {
                standard: Some(request.standard),
                tools_used: self.tool_names(),
                tools_failed: run.failed,
                config_path: Some(config.path),
                config_hash: config.hash,
                server_version: crate::VERSION.to_string(),
            },
            suggestions,
            error: None,
            created_at: Utc::now(),
        })
    }

    /// Run every registered tool against `work_dir` and union the results.
    pub async fn run_tools(&self, work_dir: &Path, config: Option<&Path>) -> ToolRun {
        let timeout = self.settings.analyzer.timeout();
        let deadline = tokio::time::Instant::now() + timeout;
        let limit = self.settings.analyzer.concurrent_limit.max(1);

        let outcomes: Vec<(String, Result<Vec<Issue>>)> = stream::iter(self.tools.iter().cloned())
            .map(|tool| async move {
                let name = tool.name().to_string();
                debug!(tool = %name, "running tool");

                let invocation = AssertUnwindSafe(tool.run(work_dir, config)).catch_unwind();
                let outcome = match tokio::time::timeout_at(deadline, invocation).await {
                    Ok(Ok(result)) => result,
                    Ok(Err(_)) => Err(AnalysisError::ToolExecution {
                        tool: name.clone(),
                        message: "panicked".to_string(),
                    }),
                    Err(_) => Err(AnalysisError::ToolExecution {
                        tool: name.clone(),
                        message: format!("timed out after {}s", timeout.as_secs()),
                    }),
                };
                (name, outcome)
            })
            .buffer_unordered(limit)
            .collect()
            .await;

        let mut run = ToolRun::default();
        for (name, outcome) in outcomes {
            match outcome {
                Ok(issues) => {
                    debug!(tool = %name, issues = issues.len(), "tool completed");
                    run.issues.extend(issues);
                }
                Err(e) => {
                    warn!(tool = %name, kind = e.kind(), error = %e, "tool failed");
                    run.failed.push(name);
                }
            }
        }
        run.failed.sort();
        run
    }

    /// Analyze several project directories, one after another.
    pub async fn analyze_batch(
        &self,
        projects: &[ProjectInfo],
        standard: Standard,
        custom_config: Option<&str>,
    ) -> BatchAnalysisResult {
        let start = Instant::now();
        let mut results = BTreeMap::new();
        let mut summary = BatchSummary {
            total_projects: projects.len(),
            ..Default::default()
        };
        let mut score_total = 0.0;

        for project in projects {
            let mut request = AnalysisRequest::project(&project.path).with_standard(standard);
            if let Some(text) = custom_config {
                request = request.with_custom_config(text);
            }

            let result = match self.analyze(&request).await {
                Ok(result) => {
                    summary.successful_projects += 1;
                    summary.total_issues += result.summary.total_issues;
                    score_total += result.summary.score;
                    result
                }
                Err(e) => {
                    warn!(project = %project.name, error = %e, "project analysis failed");
                    summary.failed_projects += 1;
                    AnalysisResult::failed(&e)
                }
            };
            results.insert(project.name.clone(), result);
        }

        if summary.successful_projects > 0 {
            summary.average_score = score_total / summary.successful_projects as f64;
        }
        summary.duration_ms = start.elapsed().as_millis() as u64;

        BatchAnalysisResult {
            id: Uuid::new_v4().to_string(),
            status: if summary.successful_projects > 0 {
                Status::Success
            } else {
                Status::Error
            },
            results,
            summary,
            created_at: Utc::now(),
        }
    }

    /// Report which configured tools can run.
    pub fn health(&self) -> HealthStatus {
        let mut checks = BTreeMap::new();
        let mut enabled = 0;
        let mut available = 0;

        for kind in ToolKind::ALL {
            let state = if !kind.is_enabled(&self.settings.tools) {
                "disabled"
            } else {
                enabled += 1;
                if kind.build(&self.settings.tools).is_available() {
                    available += 1;
                    "ok"
                } else {
                    "unavailable"
                }
            };
            checks.insert(kind.as_str().to_string(), state.to_string());
        }

        let status = if enabled > 0 && available == enabled {
            HealthState::Healthy
        } else if available > 0 {
            HealthState::Degraded
        } else {
            HealthState::Unhealthy
        };

        HealthStatus {
            status,
            timestamp: Utc::now(),
            version: crate::VERSION.to_string(),
            checks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, Severity};
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;

    enum Behavior {
        Report(Vec<Issue>),
        Fail,
        Panic,
        Hang,
        Track(Arc<InFlight>),
    }

    /// Counts tools running at once and the highest count seen.
    #[derive(Default)]
    struct InFlight {
        current: AtomicUsize,
        peak: AtomicUsize,
    }

    struct FakeTool {
        name: &'static str,
        behavior: Behavior,
    }

    #[async_trait]
    impl AnalysisTool for FakeTool {
        fn name(&self) -> &str {
            self.name
        }

        fn is_available(&self) -> bool {
            true
        }

        async fn run(&self, _work_dir: &Path, _config: Option<&Path>) -> Result<Vec<Issue>> {
            match &self.behavior {
                Behavior::Report(issues) => Ok(issues.clone()),
                Behavior::Fail => Err(AnalysisError::ToolExecution {
                    tool: self.name.to_string(),
                    message: "exit status 3".to_string(),
                }),
                Behavior::Panic => panic!("tool blew up"),
                Behavior::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(Vec::new())
                }
                Behavior::Track(in_flight) => {
                    let now = in_flight.current.fetch_add(1, Ordering::SeqCst) + 1;
                    in_flight.peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(200)).await;
                    in_flight.current.fetch_sub(1, Ordering::SeqCst);
                    Ok(Vec::new())
                }
            }
        }
    }

    fn issue(file: &str, line: usize, severity: Severity, category: Category) -> Issue {
        Issue {
            file: file.to_string(),
            line,
            column: 1,
            severity,
            category,
            rule: "fake".to_string(),
            message: format!("{} issue", category),
            source: "fake".to_string(),
            code: None,
        }
    }

    fn tool(name: &'static str, behavior: Behavior) -> Arc<dyn AnalysisTool> {
        Arc::new(FakeTool { name, behavior })
    }

    fn analyzer(temp: &TempDir, tools: Vec<Arc<dyn AnalysisTool>>) -> Analyzer {
        limited_analyzer(temp, tools, Settings::default().analyzer.concurrent_limit)
    }

    fn limited_analyzer(
        temp: &TempDir,
        tools: Vec<Arc<dyn AnalysisTool>>,
        concurrent_limit: usize,
    ) -> Analyzer {
        let mut settings = Settings::default();
        settings.analyzer.temp_dir = Some(temp.path().join("work"));
        settings.analyzer.timeout_secs = 1;
        settings.analyzer.concurrent_limit = concurrent_limit;
        let templates = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("configs/templates");
        let resolver = ConfigResolver::new(vec![templates], temp.path().join("cache"));
        Analyzer::new(settings)
            .with_tools(tools)
            .with_resolver(resolver)
    }

    fn work_dir_entries(temp: &TempDir) -> usize {
        std::fs::read_dir(temp.path().join("work"))
            .map(|d| d.count())
            .unwrap_or(0)
    }

    async fn peak_in_flight(concurrent_limit: usize) -> usize {
        let temp = TempDir::new().unwrap();
        let in_flight = Arc::new(InFlight::default());
        let tools = vec![
            tool("first", Behavior::Track(in_flight.clone())),
            tool("second", Behavior::Track(in_flight.clone())),
        ];
        let analyzer = limited_analyzer(&temp, tools, concurrent_limit);

        let result = analyzer
            .analyze(&AnalysisRequest::snippet("package main\n"))
            .await
            .unwrap();
        assert!(result.metadata.tools_failed.is_empty());
        assert_eq!(in_flight.current.load(Ordering::SeqCst), 0);
        in_flight.peak.load(Ordering::SeqCst)
    }

    #[tokio::test]
    async fn test_tools_run_concurrently() {
        assert_eq!(peak_in_flight(2).await, 2);
    }

    #[tokio::test]
    async fn test_concurrent_limit_bounds_running_tools() {
        assert_eq!(peak_in_flight(1).await, 1);
    }

    #[tokio::test]
    async fn test_failing_tool_is_isolated() {
        let temp = TempDir::new().unwrap();
        let analyzer = analyzer(
            &temp,
            vec![
                tool("broken", Behavior::Fail),
                tool(
                    "good",
                    Behavior::Report(vec![issue("main.go", 2, Severity::Error, Category::Logic)]),
                ),
            ],
        );

        let request = AnalysisRequest::snippet("package main\n").with_standard(Standard::Relaxed);
        let result = analyzer.analyze(&request).await.unwrap();

        assert_eq!(result.status, Status::Success);
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.summary.error_count, 1);
        assert_eq!(result.metadata.tools_failed, vec!["broken".to_string()]);
        assert_eq!(
            result.metadata.tools_used,
            vec!["broken".to_string(), "good".to_string()]
        );
        assert_eq!(work_dir_entries(&temp), 0);
    }

    #[tokio::test]
    async fn test_panicking_tool_is_isolated() {
        let temp = TempDir::new().unwrap();
        let analyzer = analyzer(
            &temp,
            vec![
                tool("panics", Behavior::Panic),
                tool(
                    "good",
                    Behavior::Report(vec![issue("a.go", 1, Severity::Info, Category::Style)]),
                ),
            ],
        );

        let request = AnalysisRequest::snippet("package main\n").with_standard(Standard::Strict);
        let result = analyzer.analyze(&request).await.unwrap();

        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.metadata.tools_failed, vec!["panics".to_string()]);
        assert_eq!(work_dir_entries(&temp), 0);
    }

    #[tokio::test]
    async fn test_hanging_tool_hits_shared_deadline() {
        let temp = TempDir::new().unwrap();
        let analyzer = analyzer(
            &temp,
            vec![
                tool("slow", Behavior::Hang),
                tool(
                    "fast",
                    Behavior::Report(vec![issue("a.go", 1, Severity::Warning, Category::Format)]),
                ),
            ],
        );

        let started = Instant::now();
        let run = analyzer.run_tools(temp.path(), None).await;

        assert!(started.elapsed() < Duration::from_secs(30));
        assert_eq!(run.issues.len(), 1);
        assert_eq!(run.failed, vec!["slow".to_string()]);
    }

    #[tokio::test]
    async fn test_issues_sorted_regardless_of_tool_order() {
        let temp = TempDir::new().unwrap();
        let first = vec![issue("b.go", 1, Severity::Warning, Category::Format)];
        let second = vec![
            issue("a.go", 9, Severity::Warning, Category::Format),
            issue("a.go", 3, Severity::Warning, Category::Format),
        ];

        let forward = analyzer(
            &temp,
            vec![
                tool("one", Behavior::Report(first.clone())),
                tool("two", Behavior::Report(second.clone())),
            ],
        );
        let backward = analyzer(
            &temp,
            vec![
                tool("two", Behavior::Report(second)),
                tool("one", Behavior::Report(first)),
            ],
        );

        let request = AnalysisRequest::snippet("package main\n").with_standard(Standard::Relaxed);
        let a = forward.analyze(&request).await.unwrap();
        let b = backward.analyze(&request).await.unwrap();

        assert_eq!(a.issues, b.issues);
        let lines: Vec<_> = a.issues.iter().map(|i| (i.file.as_str(), i.line)).collect();
        assert_eq!(lines, vec![("a.go", 3), ("a.go", 9), ("b.go", 1)]);
    }

    #[tokio::test]
    async fn test_union_is_not_deduplicated() {
        let temp = TempDir::new().unwrap();
        let same = vec![issue("a.go", 1, Severity::Warning, Category::Logic)];
        let analyzer = analyzer(
            &temp,
            vec![
                tool("one", Behavior::Report(same.clone())),
                tool("two", Behavior::Report(same)),
            ],
        );

        let run = analyzer.run_tools(temp.path(), None).await;
        assert_eq!(run.issues.len(), 2);
    }

    #[tokio::test]
    async fn test_input_error_runs_nothing() {
        let temp = TempDir::new().unwrap();
        let analyzer = analyzer(&temp, vec![tool("panics", Behavior::Panic)]);

        let err = analyzer
            .analyze(&AnalysisRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Input(_)));
    }

    #[tokio::test]
    async fn test_config_failure_cleans_up_snippet() {
        let temp = TempDir::new().unwrap();
        let mut settings = Settings::default();
        settings.analyzer.temp_dir = Some(temp.path().join("work"));
        let analyzer = Analyzer::new(settings)
            .with_tools(Vec::new())
            .with_resolver(ConfigResolver::new(
                vec![temp.path().join("no-templates")],
                temp.path().join("cache"),
            ));

        let request = AnalysisRequest::snippet("package main\n").with_standard(Standard::Strict);
        let err = analyzer.analyze(&request).await.unwrap_err();

        assert!(matches!(err, AnalysisError::ConfigNotFound { .. }));
        assert_eq!(work_dir_entries(&temp), 0);
    }

    #[tokio::test]
    async fn test_suggestions_follow_categories() {
        let temp = TempDir::new().unwrap();
        let analyzer = analyzer(
            &temp,
            vec![tool(
                "sec",
                Behavior::Report(vec![issue("a.go", 1, Severity::Error, Category::Security)]),
            )],
        );

        let request = AnalysisRequest::snippet("package main\n").with_standard(Standard::Standard);
        let result = analyzer.analyze(&request).await.unwrap();

        assert_eq!(result.suggestions.len(), 1);
        assert_eq!(result.suggestions[0].category, Category::Security);
        assert_eq!(result.summary.score, 95.0);
    }

    #[tokio::test]
    async fn test_batch_counts_failures() {
        let temp = TempDir::new().unwrap();
        let project = temp.path().join("proj");
        std::fs::create_dir_all(&project).unwrap();
        std::fs::write(project.join("main.go"), "package main\n").unwrap();

        let analyzer = analyzer(
            &temp,
            vec![tool(
                "fake",
                Behavior::Report(vec![issue("main.go", 1, Severity::Warning, Category::Logic)]),
            )],
        );
        let projects = vec![
            ProjectInfo {
                name: "ok".to_string(),
                path: project,
            },
            ProjectInfo {
                name: "missing".to_string(),
                path: temp.path().join("does-not-exist"),
            },
        ];

        let batch = analyzer
            .analyze_batch(&projects, Standard::Relaxed, None)
            .await;

        assert_eq!(batch.status, Status::Success);
        assert_eq!(batch.summary.total_projects, 2);
        assert_eq!(batch.summary.successful_projects, 1);
        assert_eq!(batch.summary.failed_projects, 1);
        assert_eq!(batch.summary.total_issues, 1);
        assert_eq!(batch.summary.average_score, 98.0);
        assert_eq!(batch.results["missing"].status, Status::Error);
    }

    #[test]
    fn test_health_with_everything_disabled() {
        let mut settings = Settings::default();
        settings.tools.golangci_lint.enabled = false;
        settings.tools.govet.enabled = false;
        let health = Analyzer::new(settings).health();

        assert_eq!(health.status, HealthState::Unhealthy);
        assert_eq!(health.checks["govet"], "disabled");
        assert_eq!(health.checks["golangci-lint"], "disabled");
    }

    #[test]
    fn test_health_degraded_when_one_binary_missing() {
        let mut settings = Settings::default();
        settings.tools.golangci_lint.binary = Some("no-such-golangci-lint".to_string());
        settings.tools.govet.binary = Some("sh".to_string());
        let health = Analyzer::new(settings).health();

        assert_eq!(health.checks["golangci-lint"], "unavailable");
        if health.checks["govet"] == "ok" {
            assert_eq!(health.status, HealthState::Degraded);
        }
    }
}
