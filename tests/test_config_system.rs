//! Configuration discovery, precedence and source attribution

use anyhow::Result;
use archsmith::{CliArgs, Config};
use serial_test::serial;
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

fn no_env(_key: &str) -> Option<String> {
    None
}

/// Repository root with a config file, so discovery stops here.
fn repo_with_config(toml: &str) -> Result<TempDir> {
    let temp_dir = TempDir::new()?;
    fs::create_dir_all(temp_dir.path().join(".git"))?;
    fs::create_dir_all(temp_dir.path().join(".archsmith"))?;
    fs::write(temp_dir.path().join(".archsmith/config.toml"), toml)?;
    Ok(temp_dir)
}

/// Restores the working directory when dropped.
struct CwdGuard {
    original: std::path::PathBuf,
}

impl CwdGuard {
    fn enter(dir: &Path) -> Result<Self> {
        let original = env::current_dir()?;
        env::set_current_dir(dir)?;
        Ok(Self { original })
    }
}

impl Drop for CwdGuard {
    fn drop(&mut self) {
        let _ = env::set_current_dir(&self.original);
    }
}

#[test]
fn test_file_values_and_sources() -> Result<()> {
    let repo = repo_with_config(
        r#"
[defaults]
output_dir = "generated"
stage_timeout = 120

[llm]
provider = "openrouter"

[llm.openrouter]
model = "meta-llama/llama-3.1-70b-instruct"

[delays]
default = 1
backend = 2
"#,
    )?;

    let config = Config::discover_with_env(repo.path(), &CliArgs::default(), no_env)?;

    assert_eq!(config.output_dir(), Path::new("generated"));
    assert_eq!(config.stage_timeout(), Duration::from_secs(120));
    assert_eq!(config.provider(), "openrouter");
    assert_eq!(config.delay_for("backend"), Duration::from_secs(2));
    assert_eq!(config.delay_for("frontend"), Duration::from_secs(45));
    assert_eq!(config.delay_for("unknown"), Duration::from_secs(1));
    // Review has no built-in entry, so it follows the file's default
    assert_eq!(config.delay_for("review"), Duration::from_secs(1));

    let effective = config.effective_config();
    assert_eq!(effective["output_dir"], ("generated".to_string(), "config".to_string()));
    assert_eq!(effective["llm.provider"].1, "config");
    assert_eq!(effective["max_tool_rounds"].1, "default");
    assert_eq!(
        effective["llm.openrouter.model"].0,
        "meta-llama/llama-3.1-70b-instruct"
    );
    Ok(())
}

#[test]
fn test_precedence_cli_over_env_over_file() -> Result<()> {
    let repo = repo_with_config("[defaults]\noutput_dir = \"from-file\"\n")?;

    let env_lookup = |key: &str| match key {
        "ARCHSMITH_OUTPUT_DIR" => Some("from-env".to_string()),
        _ => None,
    };

    let config = Config::discover_with_env(repo.path(), &CliArgs::default(), env_lookup)?;
    assert_eq!(config.output_dir(), Path::new("from-env"));
    assert_eq!(config.effective_config()["output_dir"].1, "env");

    let cli_args = CliArgs {
        output_dir: Some("from-cli".to_string()),
        ..CliArgs::default()
    };
    let config = Config::discover_with_env(repo.path(), &cli_args, env_lookup)?;
    assert_eq!(config.output_dir(), Path::new("from-cli"));
    assert_eq!(config.effective_config()["output_dir"].1, "cli");
    Ok(())
}

#[test]
fn test_no_delay_overrides_file_delays() -> Result<()> {
    let repo = repo_with_config("[delays]\ndefault = 10\nbackend = 20\n")?;
    let cli_args = CliArgs {
        no_delay: true,
        ..CliArgs::default()
    };

    let config = Config::discover_with_env(repo.path(), &cli_args, no_env)?;
    for stage in ["specification", "backend", "frontend", "integration", "review"] {
        assert_eq!(config.delay_for(stage), Duration::ZERO, "stage {stage}");
    }
    Ok(())
}

#[test]
fn test_out_of_range_values_are_rejected() -> Result<()> {
    let repo = repo_with_config("[defaults]\nstage_timeout = 1\n")?;
    assert!(Config::discover_with_env(repo.path(), &CliArgs::default(), no_env).is_err());

    let repo = repo_with_config("[llm]\nprovider = \"carrier-pigeon\"\n")?;
    assert!(Config::discover_with_env(repo.path(), &CliArgs::default(), no_env).is_err());
    Ok(())
}

#[test]
fn test_discovery_stops_at_repository_root() -> Result<()> {
    let outer = repo_with_config("[defaults]\noutput_dir = \"outer\"\n")?;
    let inner = outer.path().join("nested/project");
    fs::create_dir_all(inner.join(".git"))?;

    assert!(Config::discover_config_file_from(&inner).is_none());
    let config = Config::discover_with_env(&inner, &CliArgs::default(), no_env)?;
    assert_eq!(config.output_dir(), Path::new("output"));
    Ok(())
}

#[test]
#[serial]
fn test_discover_uses_current_directory() -> Result<()> {
    let repo = repo_with_config("[defaults]\nmax_tool_rounds = 7\n")?;
    let subdir = repo.path().join("src/deep");
    fs::create_dir_all(&subdir)?;

    let _cwd = CwdGuard::enter(&subdir)?;
    let config = Config::discover(&CliArgs::default())?;

    assert_eq!(config.max_tool_rounds(), 7);
    assert_eq!(config.effective_config()["max_tool_rounds"].1, "config");
    Ok(())
}

#[test]
#[serial]
fn test_explicit_config_path_skips_discovery() -> Result<()> {
    let repo = repo_with_config("[defaults]\nmax_tool_rounds = 7\n")?;
    let custom = repo.path().join("custom.toml");
    fs::write(&custom, "[defaults]\nmax_tool_rounds = 9\n")?;

    let _cwd = CwdGuard::enter(repo.path())?;
    let cli_args = CliArgs {
        config_path: Some(custom),
        ..CliArgs::default()
    };
    let config = Config::discover(&cli_args)?;

    assert_eq!(config.max_tool_rounds(), 9);
    Ok(())
}
