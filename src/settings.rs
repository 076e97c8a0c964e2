//! Application settings.
//!
//! Settings come from an optional YAML file, then `GO_STANDARDS_*`
//! environment overrides, then validation.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Settings file names searched in the working directory.
const DEFAULT_SETTINGS_NAMES: &[&str] = &["go-standards.yaml", ".go-standards.yaml"];

const ENV_PREFIX: &str = "GO_STANDARDS_";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub log: LogSettings,
    #[serde(default)]
    pub analyzer: AnalyzerSettings,
    #[serde(default)]
    pub tools: ToolsSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LogSettings {
    /// debug, info, warn, or error
    #[serde(default = "default_log_level")]
    pub level: String,
    /// text or json
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnalyzerSettings {
    /// Deadline for all tool invocations of one analysis.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Maximum number of tools running at once.
    #[serde(default = "default_concurrent_limit")]
    pub concurrent_limit: usize,
    /// Where snippet work areas are created. Defaults to the system temp dir.
    #[serde(default)]
    pub temp_dir: Option<PathBuf>,
    /// Where custom config artifacts are cached. Defaults to the user cache dir.
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
    /// Extra template directory, searched before the built-in locations.
    #[serde(default)]
    pub template_dir: Option<PathBuf>,
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            concurrent_limit: default_concurrent_limit(),
            temp_dir: None,
            cache_dir: None,
            template_dir: None,
        }
    }
}

impl AnalyzerSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Parent of snippet work areas, always absolute.
    pub fn temp_dir(&self) -> PathBuf {
        absolute(self.temp_dir.clone().unwrap_or_else(std::env::temp_dir))
    }

    /// Directory for content-addressed custom configs, always absolute.
    pub fn cache_dir(&self) -> PathBuf {
        if let Some(dir) = &self.cache_dir {
            return absolute(dir.clone());
        }
        directories::ProjectDirs::from("", "", "go-standards")
            .map(|dirs| dirs.cache_dir().join("configs"))
            .unwrap_or_else(|| self.temp_dir().join("go-standards-configs"))
    }
}

/// Anchor a relative path at the current directory.
///
/// Tools run with the work area as their working directory, so any path
/// handed to them must not depend on ours.
pub fn absolute(path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        return path;
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path,
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ToolsSettings {
    #[serde(default)]
    pub golangci_lint: ToolSettings,
    #[serde(default)]
    pub govet: ToolSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ToolSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Executable name or path; each tool has its own default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binary: Option<String>,
}

impl ToolSettings {
    pub fn binary_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.binary.as_deref().unwrap_or(default)
    }
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            binary: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_timeout_secs() -> u64 {
    300
}

fn default_concurrent_limit() -> usize {
    10
}

fn default_true() -> bool {
    true
}

impl Settings {
    /// Load settings from `path`, or from a discovered file, or defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut settings = match path {
            Some(p) => Self::parse_file(p)?,
            None => match discover_settings() {
                Some(p) => Self::parse_file(p)?,
                None => Self::default(),
            },
        };
        settings.apply_env(|key| std::env::var(format!("{}{}", ENV_PREFIX, key)).ok())?;
        settings.validate()?;
        Ok(settings)
    }

    /// Parse settings from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::parse_str(&content)
    }

    pub fn parse_str(content: &str) -> anyhow::Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Apply overrides; `lookup` receives the key without the prefix.
    pub fn apply_env<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("LOG_LEVEL") {
            self.log.level = v;
        }
        if let Some(v) = lookup("LOG_FORMAT") {
            self.log.format = v;
        }
        if let Some(v) = lookup("TIMEOUT_SECS") {
            self.analyzer.timeout_secs = v
                .parse()
                .map_err(|e| anyhow::anyhow!("invalid {}TIMEOUT_SECS {:?}: {}", ENV_PREFIX, v, e))?;
        }
        if let Some(v) = lookup("CONCURRENT_LIMIT") {
            self.analyzer.concurrent_limit = v.parse().map_err(|e| {
                anyhow::anyhow!("invalid {}CONCURRENT_LIMIT {:?}: {}", ENV_PREFIX, v, e)
            })?;
        }
        if let Some(v) = lookup("TEMP_DIR") {
            self.analyzer.temp_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("CACHE_DIR") {
            self.analyzer.cache_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("TEMPLATE_DIR") {
            self.analyzer.template_dir = Some(PathBuf::from(v));
        }
        Ok(())
    }

    /// Validate settings values.
    pub fn validate(&self) -> anyhow::Result<()> {
        const LEVELS: &[&str] = &["debug", "info", "warn", "error"];
        if !LEVELS.contains(&self.log.level.as_str()) {
            anyhow::bail!("invalid log level: {}", self.log.level);
        }
        if self.log.format != "text" && self.log.format != "json" {
            anyhow::bail!(
                "invalid log format: {} (must be text or json)",
                self.log.format
            );
        }
        if self.analyzer.concurrent_limit == 0 {
            anyhow::bail!("analyzer.concurrent_limit must be at least 1");
        }
        if self.analyzer.timeout_secs == 0 {
            anyhow::bail!("analyzer.timeout_secs must be at least 1");
        }
        Ok(())
    }
}

fn discover_settings() -> Option<PathBuf> {
    DEFAULT_SETTINGS_NAMES
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
}
