//! CLI entry point and dispatch logic
//!
//! `run()` parses arguments, loads `.env`, discovers configuration, creates
//! the tokio runtime, dispatches to a command, and prints every error.

use clap::Parser;

use super::args::{Cli, Commands};
use super::commands;

use crate::{ArchitectError, CliArgs, Config, ExitCode};
use archsmith_utils::logging::init_tracing;
use archsmith_utils::redaction::redact_secrets;

/// Map parsed flags onto configuration overrides.
pub(crate) fn cli_args_from(cli: &Cli) -> CliArgs {
    let no_clean = matches!(cli.command, Commands::Run { no_clean: true, .. });
    CliArgs {
        config_path: cli.config.clone(),
        output_dir: cli.output_dir.clone(),
        provider: cli.provider.clone(),
        model: cli.model.clone(),
        verbose: cli.verbose.then_some(true),
        clean_output: no_clean.then_some(false),
        stage_timeout: None,
        max_tool_rounds: None,
        no_delay: cli.no_delay,
    }
}

/// Main CLI execution function.
///
/// Handles ALL output including errors and returns the exit code to use.
/// main.rs only calls `std::process::exit(code.as_i32())` on error.
pub fn run() -> Result<(), ExitCode> {
    let cli = Cli::parse();

    // A missing .env is normal
    let _ = dotenvy::dotenv();

    let cli_args = cli_args_from(&cli);
    let config = match Config::discover(&cli_args) {
        Ok(config) => config,
        Err(err) => return Err(report_error(&err, "config")),
    };

    // A second subscriber (for example under tests) is not an error
    let _ = init_tracing(config.verbose());

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("✗ Failed to create async runtime: {e}");
            return Err(ExitCode::INTERNAL);
        }
    };

    let operation = cli.command.operation();

    let result = rt.block_on(async {
        match cli.command {
            Commands::Run {
                briefs,
                brief_files,
                example,
                json,
                no_clean: _,
            } => commands::execute_run_command(&briefs, &brief_files, example, json, &config).await,
            Commands::Scan { json } => commands::execute_scan_command(json, &config),
            Commands::Lint { file, language } => {
                commands::execute_lint_command(&file, language.as_deref())
            }
            Commands::Config { json } => commands::execute_config_command(json, &config),
        }
    });

    match result {
        Ok(code) if code == ExitCode::SUCCESS => Ok(()),
        Ok(code) => Err(code),
        Err(error) => Err(report_error(&error, operation)),
    }
}

/// Print an error for the user and pick the exit code.
fn report_error(error: &anyhow::Error, operation: &str) -> ExitCode {
    if let Some(architect_error) = error.downcast_ref::<ArchitectError>() {
        eprintln!("{}", architect_error.display_for_user());
        return architect_error.to_exit_code();
    }

    eprintln!("✗ {operation} failed: {}", redact_secrets(&format!("{error:#}")));
    if let Some(suggestions) = enhance_error_context(error) {
        eprintln!("\n  Suggestions:");
        for (i, suggestion) in suggestions.iter().enumerate() {
            eprintln!("    {}. {}", i + 1, suggestion);
        }
    }
    eprintln!("\n  Run with --verbose for more detailed output");
    ExitCode::INTERNAL
}

/// Suggestions for common failure scenarios
fn enhance_error_context(error: &anyhow::Error) -> Option<Vec<String>> {
    let error_str = format!("{error:#}");

    if error_str.contains("Permission denied") {
        Some(vec![
            "Check file and directory permissions".to_string(),
            "Use --output-dir to pick a writable location".to_string(),
        ])
    } else if error_str.contains("No such file or directory") {
        Some(vec![
            "Verify the specified paths exist".to_string(),
            "Check that you're running from the correct directory".to_string(),
        ])
    } else {
        None
    }
}
