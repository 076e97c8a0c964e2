//! Command-line interface for go-standards.

use clap::{Args, Parser, Subcommand};
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::analyzer::Analyzer;
use crate::logging;
use crate::models::{
    AnalysisRequest, AnalysisResult, HealthState, OutputFormat, ProjectInfo, Standard, Status,
};
use crate::report;
use crate::settings::Settings;
use crate::templates;

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Go code quality analysis.
///
/// Runs golangci-lint and go vet against a snippet, a file, or a project,
/// normalizes their findings into one issue model, and scores the result.
#[derive(Parser)]
#[command(name = "go-standards")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Settings file (default: go-standards.yaml in the working directory)
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze Go code
    #[command(visible_alias = "check")]
    Analyze(AnalyzeArgs),
    /// List or write the predefined standard templates
    Templates(TemplatesArgs),
    /// Analyze several project directories
    Batch(BatchArgs),
    /// Report which analysis tools are available
    Health,
}

/// Arguments for the analyze command.
#[derive(Args)]
pub struct AnalyzeArgs {
    /// Inline Go code to analyze ("-" reads from stdin)
    #[arg(long, conflicts_with_all = ["file", "project"])]
    pub code: Option<String>,

    /// Go file to analyze, along with its package directory
    #[arg(long, conflicts_with = "project")]
    pub file: Option<PathBuf>,

    /// Project directory to analyze
    #[arg(long)]
    pub project: Option<PathBuf>,

    /// Standard: strict, standard, relaxed, or custom
    #[arg(short, long, default_value = "standard")]
    pub standard: String,

    /// Custom golangci-lint config file (implies --standard custom)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format: json, markdown, pretty, or sarif
    #[arg(short, long, default_value = "json")]
    pub format: String,
}

/// Arguments for the templates command.
#[derive(Args)]
pub struct TemplatesArgs {
    /// Directory to write a template into
    #[arg(short, long)]
    pub write: Option<PathBuf>,

    /// Template to write
    #[arg(short, long, default_value = "standard")]
    pub name: String,
}

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Project directories to analyze
    #[arg(required = true)]
    pub projects: Vec<PathBuf>,

    /// Standard: strict, standard, relaxed, or custom
    #[arg(short, long, default_value = "standard")]
    pub standard: String,

    /// Custom golangci-lint config file (implies --standard custom)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format: json, markdown, pretty, or sarif
    #[arg(short, long, default_value = "json")]
    pub format: String,
}

/// Load settings and install logging. Shared by every command.
fn bootstrap(settings_path: Option<&Path>) -> anyhow::Result<Settings> {
    let settings = Settings::load(settings_path)?;
    logging::init(&settings.log);
    Ok(settings)
}

fn runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?)
}

/// Parse `--standard` and `--config`; a config file always means custom.
fn resolve_standard(
    standard: &str,
    config: Option<&Path>,
) -> anyhow::Result<(Standard, Option<String>)> {
    let standard: Standard = standard.parse().map_err(anyhow::Error::msg)?;
    match config {
        Some(path) => {
            let text = std::fs::read_to_string(path).map_err(|e| {
                anyhow::anyhow!("failed to read config {}: {}", path.display(), e)
            })?;
            Ok((Standard::Custom, Some(text)))
        }
        None => Ok((standard, None)),
    }
}

/// Build an analysis request from command-line arguments.
pub fn build_request(args: &AnalyzeArgs) -> anyhow::Result<AnalysisRequest> {
    let format: OutputFormat = args.format.parse().map_err(anyhow::Error::msg)?;
    let (standard, config) = resolve_standard(&args.standard, args.config.as_deref())?;

    let code = match args.code.as_deref() {
        Some("-") => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Some(buf)
        }
        other => other.map(str::to_string),
    };

    Ok(AnalysisRequest {
        code,
        file_path: args.file.clone(),
        project_dir: args.project.clone(),
        standard,
        config,
        format,
    })
}

/// Exit code for a completed analysis.
pub fn exit_code(result: &AnalysisResult) -> i32 {
    match result.status {
        Status::Error => EXIT_ERROR,
        Status::Success if result.has_errors() => EXIT_FAILED,
        Status::Success => EXIT_SUCCESS,
    }
}

/// Run the analyze command.
pub fn run_analyze(args: &AnalyzeArgs, settings_path: Option<&Path>) -> anyhow::Result<i32> {
    let settings = bootstrap(settings_path)?;

    let request = match build_request(args) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    let analyzer = Analyzer::new(settings);
    let result = match runtime()?.block_on(analyzer.analyze(&request)) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Error: {}", e);
            AnalysisResult::failed(&e)
        }
    };

    report::write(&result, request.format)?;
    Ok(exit_code(&result))
}

/// Run the templates command.
pub fn run_templates(args: &TemplatesArgs) -> anyhow::Result<i32> {
    let Some(dir) = &args.write else {
        return list_templates();
    };

    let standard: Standard = match args.name.parse() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    match templates::write(standard, dir) {
        Ok(path) => {
            println!("Created {} from template '{}'", path.display(), standard);
            println!();
            println!("Next steps:");
            println!("  1. Edit {} to customize for your project", path.display());
            println!(
                "  2. Run: go-standards analyze --project . --config {}",
                path.display()
            );
            Ok(EXIT_SUCCESS)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            Ok(EXIT_ERROR)
        }
    }
}

fn list_templates() -> anyhow::Result<i32> {
    println!("Available templates:");
    println!();

    for template in templates::list() {
        let name = if template.level == Standard::default() {
            format!("{} (default)", template.name)
        } else {
            template.name
        };
        println!("  {:<20} {}", name, template.description);
    }

    println!();
    println!("Usage:");
    println!("  go-standards templates --write <dir> --name <template>");

    Ok(EXIT_SUCCESS)
}

/// Name each project after its directory, falling back to the full path
/// when two directories share a name.
pub fn project_infos(dirs: &[PathBuf]) -> Vec<ProjectInfo> {
    let base_name = |dir: &PathBuf| {
        dir.file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| dir.display().to_string())
    };

    dirs.iter()
        .map(|dir| {
            let name = base_name(dir);
            let shared = dirs.iter().filter(|d| base_name(d) == name).count() > 1;
            ProjectInfo {
                name: if shared { dir.display().to_string() } else { name },
                path: dir.clone(),
            }
        })
        .collect()
}

/// Run the batch command.
pub fn run_batch(args: &BatchArgs, settings_path: Option<&Path>) -> anyhow::Result<i32> {
    let settings = bootstrap(settings_path)?;

    let parsed = args
        .format
        .parse::<OutputFormat>()
        .map_err(anyhow::Error::msg)
        .and_then(|format| {
            resolve_standard(&args.standard, args.config.as_deref()).map(|s| (format, s))
        });
    let (format, (standard, config)) = match parsed {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    let analyzer = Analyzer::new(settings);
    let projects = project_infos(&args.projects);
    let batch =
        runtime()?.block_on(analyzer.analyze_batch(&projects, standard, config.as_deref()));

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&batch)?);
    } else {
        for (name, result) in &batch.results {
            println!("==> {} <==", name);
            report::write(result, format)?;
        }
    }

    let code = batch.results.values().map(exit_code).max().unwrap_or(EXIT_SUCCESS);
    Ok(code)
}

/// Run the health command.
pub fn run_health(settings_path: Option<&Path>) -> anyhow::Result<i32> {
    let settings = bootstrap(settings_path)?;
    let health = Analyzer::new(settings).health();

    println!("{}", serde_json::to_string_pretty(&health)?);

    Ok(match health.status {
        HealthState::Unhealthy => EXIT_FAILED,
        HealthState::Healthy | HealthState::Degraded => EXIT_SUCCESS,
    })
}
