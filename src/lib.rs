//! go-standards - Go code quality analysis.
//!
//! go-standards drives external Go static-analysis tools (golangci-lint and
//! go vet), normalizes their heterogeneous output into a single issue
//! model, and derives summary statistics, a quality score, and improvement
//! suggestions.
//!
//! # Architecture
//!
//! - `analyzer`: the orchestration pipeline (work area, config, tool fan-out)
//! - `tools`: the `AnalysisTool` contract and its golangci-lint / go vet adapters
//! - `workarea`: snippet, file, and project work areas with scoped cleanup
//! - `config`: standard templates and content-addressed custom configs
//! - `score`: summary statistics, quality score, and suggestions
//! - `report`: output formatting (JSON, Markdown, pretty, SARIF)
//! - `settings` / `logging`: application settings and tracing setup
//!
//! # Adding a New Tool
//!
//! Implement `AnalysisTool` in `src/tools/`, add a `ToolKind` variant, and
//! give it a settings entry in `ToolsSettings`.

pub mod analyzer;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod report;
pub mod score;
pub mod settings;
pub mod templates;
pub mod tools;
pub mod workarea;

pub use analyzer::{Analyzer, ToolRun};
pub use config::{ConfigResolver, ResolvedConfig};
pub use error::{AnalysisError, Result};
pub use models::{
    AnalysisRequest, AnalysisResult, BatchAnalysisResult, Category, HealthStatus, Issue,
    Metadata, OutputFormat, Severity, Standard, Status, Suggestion, Summary,
};
pub use settings::Settings;
pub use tools::{AnalysisTool, GoVet, GolangciLint, ToolKind};
pub use workarea::WorkArea;

/// Crate version, reported in result metadata.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
