//! Error taxonomy for the analysis pipeline.
//!
//! Only four kinds abort an analysis: input validation, work area
//! preparation, and the two config failures. Any failure inside a single
//! tool degrades into "that tool contributed zero issues".

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while resolving, running, or parsing an analysis.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("invalid request: {0}")]
    Input(String),

    #[error("failed to prepare work area: {message}")]
    WorkArea {
        message: String,
        #[source]
        source: std::io::Error,
    },

    #[error("template not found: {name} (tried: {})", display_paths(.tried))]
    ConfigNotFound { name: String, tried: Vec<PathBuf> },

    #[error("failed to write custom config {}: {source}", .path.display())]
    ConfigWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} not found in PATH")]
    ToolUnavailable { tool: String },

    #[error("{tool} failed: {message}")]
    ToolExecution { tool: String, message: String },

    #[error("failed to parse {tool} output: {message}")]
    OutputParse { tool: String, message: String },
}

impl AnalysisError {
    /// Whether this error aborts the whole analysis call.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AnalysisError::Input(_)
                | AnalysisError::WorkArea { .. }
                | AnalysisError::ConfigNotFound { .. }
                | AnalysisError::ConfigWrite { .. }
        )
    }

    /// Short machine-readable kind, used in structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisError::Input(_) => "input",
            AnalysisError::WorkArea { .. } => "work_area",
            AnalysisError::ConfigNotFound { .. } => "config_not_found",
            AnalysisError::ConfigWrite { .. } => "config_write",
            AnalysisError::ToolUnavailable { .. } => "tool_unavailable",
            AnalysisError::ToolExecution { .. } => "tool_execution",
            AnalysisError::OutputParse { .. } => "output_parse",
        }
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
