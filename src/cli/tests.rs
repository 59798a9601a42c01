//! CLI tests module
//!
//! Argument parsing, flag mapping and the command helpers that do not need
//! a model backend.

use super::args::{Cli, Commands};
use super::commands::{
    EXAMPLE_BRIEF, clean_output_dir, collect_briefs, execute_config_command,
    execute_lint_command, execute_run_command, execute_scan_command, format_structure,
};
use super::run::cli_args_from;
use crate::{Config, ExitCode, ProjectScanner};
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn config_with_output(dir: &std::path::Path) -> Config {
    let mut config = Config::minimal_for_testing();
    config.defaults.output_dir = Some(dir.to_string_lossy().into_owned());
    config
}

#[test]
fn test_parse_run_with_briefs_and_files() {
    let cli = Cli::try_parse_from([
        "archsmith",
        "run",
        "A blog",
        "A shop",
        "--brief-file",
        "briefs/one.txt",
        "--json",
    ])
    .unwrap();

    match cli.command {
        Commands::Run {
            briefs,
            brief_files,
            example,
            json,
            no_clean,
        } => {
            assert_eq!(briefs, vec!["A blog".to_string(), "A shop".to_string()]);
            assert_eq!(brief_files, vec![PathBuf::from("briefs/one.txt")]);
            assert!(!example);
            assert!(json);
            assert!(!no_clean);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn test_global_flags_after_subcommand() {
    let cli = Cli::try_parse_from([
        "archsmith",
        "scan",
        "--output-dir",
        "out",
        "--provider",
        "openrouter",
        "-v",
        "--no-delay",
    ])
    .unwrap();

    assert_eq!(cli.output_dir.as_deref(), Some("out"));
    assert_eq!(cli.provider.as_deref(), Some("openrouter"));
    assert!(cli.verbose);
    assert!(cli.no_delay);
    assert_eq!(cli.command.operation(), "scan");
}

#[test]
fn test_lint_requires_file() {
    assert!(Cli::try_parse_from(["archsmith", "lint"]).is_err());

    let cli = Cli::try_parse_from(["archsmith", "lint", "app.js", "--language", "typescript"])
        .unwrap();
    match cli.command {
        Commands::Lint { file, language } => {
            assert_eq!(file, PathBuf::from("app.js"));
            assert_eq!(language.as_deref(), Some("typescript"));
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn test_unknown_subcommand_is_rejected() {
    assert!(Cli::try_parse_from(["archsmith", "deploy"]).is_err());
}

#[test]
fn test_cli_args_mapping() {
    let cli = Cli::try_parse_from(["archsmith", "run", "--example", "--no-clean", "--model", "m1"])
        .unwrap();
    let args = cli_args_from(&cli);
    assert_eq!(args.clean_output, Some(false));
    assert_eq!(args.model.as_deref(), Some("m1"));
    assert_eq!(args.verbose, None);
    assert!(!args.no_delay);

    let cli = Cli::try_parse_from(["archsmith", "config", "--verbose"]).unwrap();
    let args = cli_args_from(&cli);
    assert_eq!(args.clean_output, None);
    assert_eq!(args.verbose, Some(true));
}

#[test]
fn test_collect_briefs_order_and_blank_skipping() {
    let temp = TempDir::new().unwrap();
    let brief_file = temp.path().join("brief.txt");
    fs::write(&brief_file, "  A chat app  \n").unwrap();
    let blank_file = temp.path().join("blank.txt");
    fs::write(&blank_file, "\n\n").unwrap();

    let briefs = collect_briefs(
        &["A blog".to_string(), "   ".to_string()],
        &[brief_file, blank_file],
        true,
    )
    .unwrap();

    assert_eq!(
        briefs,
        vec![
            "A blog".to_string(),
            "A chat app".to_string(),
            EXAMPLE_BRIEF.to_string()
        ]
    );
}

#[test]
fn test_collect_briefs_missing_file_errors() {
    let err = collect_briefs(&[], &[PathBuf::from("/nonexistent/brief.txt")], false).unwrap_err();
    assert!(err.to_string().contains("Failed to read brief file"));
}

#[tokio::test]
async fn test_run_without_briefs_is_usage_error() {
    let temp = TempDir::new().unwrap();
    let config = config_with_output(temp.path());

    let code = execute_run_command(&[], &[], false, false, &config).await.unwrap();
    assert_eq!(code, ExitCode::CLI_ARGS);
}

#[test]
fn test_clean_output_dir_empties_but_keeps_directory() {
    let temp = TempDir::new().unwrap();
    let output = temp.path().join("output");
    fs::create_dir_all(output.join("backend")).unwrap();
    fs::write(output.join("backend/main.py"), "print('x')").unwrap();

    clean_output_dir(&output).unwrap();

    assert!(output.is_dir());
    assert_eq!(fs::read_dir(&output).unwrap().count(), 0);
}

#[test]
fn test_clean_output_dir_creates_missing_directory() {
    let temp = TempDir::new().unwrap();
    let output = temp.path().join("fresh/output");

    clean_output_dir(&output).unwrap();
    assert!(output.is_dir());
}

#[test]
fn test_format_structure_lists_missing_patterns() {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("backend/models")).unwrap();
    fs::write(
        temp.path().join("backend/models/user.py"),
        "class User:\n    def __init__(self, name):\n        self.name = name\n",
    )
    .unwrap();

    let structure = ProjectScanner::new(temp.path()).scan();
    let text = format_structure(&structure);

    assert!(text.contains("Completeness: "));
    assert!(text.contains("Backend: 1 file(s), 0 placeholder(s)"));
    assert!(text.contains("models: 1"));
    assert!(text.contains("Frontend: 0 file(s)"));
    assert!(text.contains("Missing:\n"));
}

#[test]
fn test_scan_command_on_missing_output_dir() {
    let temp = TempDir::new().unwrap();
    let config = config_with_output(&temp.path().join("absent"));

    assert_eq!(execute_scan_command(true, &config).unwrap(), ExitCode::SUCCESS);
    assert_eq!(execute_scan_command(false, &config).unwrap(), ExitCode::SUCCESS);
}

#[test]
fn test_lint_command_infers_language() {
    let temp = TempDir::new().unwrap();
    let good = temp.path().join("ok.py");
    fs::write(&good, "def add(a, b):\n    return a + b\n").unwrap();
    let bad = temp.path().join("broken.py");
    fs::write(&bad, "def add(a, b)\n    return a +\n").unwrap();

    assert_eq!(execute_lint_command(&good, None).unwrap(), ExitCode::SUCCESS);
    assert_eq!(
        execute_lint_command(&bad, None).unwrap(),
        ExitCode::WORKFLOW_FAILED
    );
}

#[test]
fn test_lint_command_missing_file_errors() {
    let err = execute_lint_command(std::path::Path::new("/nonexistent/x.py"), None).unwrap_err();
    assert!(err.to_string().contains("Failed to read file"));
}

#[test]
fn test_config_command_succeeds_in_both_formats() {
    let temp = TempDir::new().unwrap();
    let config = config_with_output(temp.path());

    assert_eq!(execute_config_command(true, &config).unwrap(), ExitCode::SUCCESS);
    assert_eq!(execute_config_command(false, &config).unwrap(), ExitCode::SUCCESS);
}
