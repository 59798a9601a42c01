use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::{
    CliArgs, Config, ConfigSource, DelaysConfig, Defaults, HttpProviderConfig, LlmConfig,
};

/// Environment variable overriding `llm.provider`.
pub const ENV_PROVIDER: &str = "ARCHSMITH_LLM_PROVIDER";

/// Environment variable overriding `defaults.output_dir`.
pub const ENV_OUTPUT_DIR: &str = "ARCHSMITH_OUTPUT_DIR";

/// Directory holding the config file.
pub const CONFIG_DIR_NAME: &str = ".archsmith";

/// TOML configuration file structure
#[derive(Debug, Default, Deserialize, Serialize)]
struct TomlConfig {
    defaults: Option<Defaults>,
    llm: Option<LlmConfig>,
    delays: Option<DelaysConfig>,
}

impl Config {
    /// Discover and load configuration with precedence: CLI > env > file > defaults.
    pub fn discover(cli_args: &CliArgs) -> Result<Self> {
        let start_dir = std::env::current_dir().context("Failed to get current directory")?;
        Self::discover_from(&start_dir, cli_args)
    }

    /// Discover configuration starting from a specific directory.
    pub fn discover_from(start_dir: &Path, cli_args: &CliArgs) -> Result<Self> {
        Self::discover_with_env(start_dir, cli_args, |key| std::env::var(key).ok())
    }

    /// Discovery with an injected environment lookup.
    ///
    /// Tests use this instead of mutating the process environment.
    pub fn discover_with_env<F>(start_dir: &Path, cli_args: &CliArgs, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut source_attribution = HashMap::new();

        let mut defaults = Defaults::default();
        let mut llm = LlmConfig::default();
        let mut delays = DelaysConfig::default();

        for key in [
            "output_dir",
            "verbose",
            "clean_output",
            "stage_timeout",
            "max_tool_rounds",
            "delays",
        ] {
            source_attribution.insert(key.to_string(), ConfigSource::Default);
        }

        let config_path = match &cli_args.config_path {
            Some(explicit_path) => Some(explicit_path.clone()),
            None => Self::discover_config_file_from(start_dir),
        };

        if let Some(path) = &config_path {
            let file_config = Self::load_config_file(path)
                .with_context(|| format!("Failed to load config file: {}", path.display()))?;
            let source = ConfigSource::Config;

            if let Some(file_defaults) = file_config.defaults {
                if file_defaults.output_dir.is_some() {
                    defaults.output_dir = file_defaults.output_dir;
                    source_attribution.insert("output_dir".to_string(), source);
                }
                if file_defaults.verbose.is_some() {
                    defaults.verbose = file_defaults.verbose;
                    source_attribution.insert("verbose".to_string(), source);
                }
                if file_defaults.clean_output.is_some() {
                    defaults.clean_output = file_defaults.clean_output;
                    source_attribution.insert("clean_output".to_string(), source);
                }
                if file_defaults.stage_timeout.is_some() {
                    defaults.stage_timeout = file_defaults.stage_timeout;
                    source_attribution.insert("stage_timeout".to_string(), source);
                }
                if file_defaults.max_tool_rounds.is_some() {
                    defaults.max_tool_rounds = file_defaults.max_tool_rounds;
                    source_attribution.insert("max_tool_rounds".to_string(), source);
                }
            }

            if let Some(file_llm) = file_config.llm {
                if file_llm.provider.is_some() {
                    llm.provider = file_llm.provider;
                    source_attribution.insert("llm_provider".to_string(), source);
                }
                if file_llm.budget.is_some() {
                    llm.budget = file_llm.budget;
                    source_attribution.insert("llm_budget".to_string(), source);
                }
                if file_llm.gemini.is_some() {
                    llm.gemini = file_llm.gemini;
                    source_attribution.insert("llm_gemini".to_string(), source);
                }
                if file_llm.openrouter.is_some() {
                    llm.openrouter = file_llm.openrouter;
                    source_attribution.insert("llm_openrouter".to_string(), source);
                }
            }

            if let Some(file_delays) = file_config.delays {
                if file_delays.default.is_some() {
                    delays.default = file_delays.default;
                }
                delays.stages.extend(file_delays.stages);
                source_attribution.insert("delays".to_string(), source);
            }
        }

        // Environment overrides the file
        if let Some(provider) = env(ENV_PROVIDER).filter(|v| !v.is_empty()) {
            llm.provider = Some(provider);
            source_attribution.insert("llm_provider".to_string(), ConfigSource::Env);
        }
        if let Some(output_dir) = env(ENV_OUTPUT_DIR).filter(|v| !v.is_empty()) {
            defaults.output_dir = Some(output_dir);
            source_attribution.insert("output_dir".to_string(), ConfigSource::Env);
        }

        // CLI overrides everything
        if let Some(output_dir) = &cli_args.output_dir {
            defaults.output_dir = Some(output_dir.clone());
            source_attribution.insert("output_dir".to_string(), ConfigSource::Cli);
        }
        if let Some(verbose) = cli_args.verbose {
            defaults.verbose = Some(verbose);
            source_attribution.insert("verbose".to_string(), ConfigSource::Cli);
        }
        if let Some(clean_output) = cli_args.clean_output {
            defaults.clean_output = Some(clean_output);
            source_attribution.insert("clean_output".to_string(), ConfigSource::Cli);
        }
        if let Some(stage_timeout) = cli_args.stage_timeout {
            defaults.stage_timeout = Some(stage_timeout);
            source_attribution.insert("stage_timeout".to_string(), ConfigSource::Cli);
        }
        if let Some(max_tool_rounds) = cli_args.max_tool_rounds {
            defaults.max_tool_rounds = Some(max_tool_rounds);
            source_attribution.insert("max_tool_rounds".to_string(), ConfigSource::Cli);
        }
        if let Some(provider) = &cli_args.provider {
            llm.provider = Some(provider.clone());
            source_attribution.insert("llm_provider".to_string(), ConfigSource::Cli);
        }
        if cli_args.no_delay {
            delays = DelaysConfig::zero();
            source_attribution.insert("delays".to_string(), ConfigSource::Cli);
        }

        if llm.provider.is_none() {
            llm.provider = Some("gemini".to_string());
            source_attribution.insert("llm_provider".to_string(), ConfigSource::Default);
        }

        // --model applies to whichever provider ended up selected
        if let Some(model) = &cli_args.model {
            let section = match llm.provider.as_deref() {
                Some("openrouter") => &mut llm.openrouter,
                _ => &mut llm.gemini,
            };
            section
                .get_or_insert_with(HttpProviderConfig::default)
                .model = Some(model.clone());
            source_attribution.insert("llm_model".to_string(), ConfigSource::Cli);
        }

        let config = Self {
            defaults,
            llm,
            delays,
            source_attribution,
        };

        config.validate()?;

        Ok(config)
    }

    /// Walk up from `start_dir` looking for `.archsmith/config.toml`.
    ///
    /// Stops at repository root markers (.git, .hg, .svn) or the filesystem root.
    #[must_use]
    pub fn discover_config_file_from(start_dir: &Path) -> Option<PathBuf> {
        let mut current_dir = start_dir;

        loop {
            let config_path = current_dir.join(CONFIG_DIR_NAME).join("config.toml");
            if config_path.exists() {
                return Some(config_path);
            }

            if current_dir.join(".git").exists()
                || current_dir.join(".hg").exists()
                || current_dir.join(".svn").exists()
            {
                return None;
            }

            current_dir = current_dir.parent()?;
        }
    }

    fn load_config_file(path: &Path) -> Result<TomlConfig> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let config: TomlConfig = toml::from_str(&content).with_context(|| {
                    format!("Failed to parse TOML config file: {}", path.display())
                })?;
                Ok(config)
            }
            // An explicit path that does not exist falls back to defaults
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "Config file not found, using defaults");
                Ok(TomlConfig::default())
            }
            Err(e) => Err(anyhow::anyhow!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            )),
        }
    }
}
