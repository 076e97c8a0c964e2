//! go-standards CLI entry point.

use clap::Parser;
use go_standards::cli::{self, Cli, Commands, EXIT_ERROR};

fn main() {
    let cli = Cli::parse();
    let settings = cli.settings.as_deref();

    let outcome = match &cli.command {
        Commands::Analyze(args) => cli::run_analyze(args, settings),
        Commands::Templates(args) => cli::run_templates(args),
        Commands::Batch(args) => cli::run_batch(args, settings),
        Commands::Health => cli::run_health(settings),
    };

    let exit_code = match outcome {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            EXIT_ERROR
        }
    };

    std::process::exit(exit_code);
}
