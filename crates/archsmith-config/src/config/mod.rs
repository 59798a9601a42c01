//! Configuration management for archsmith
//!
//! Hierarchical configuration with discovery and precedence:
//! CLI > environment > file > defaults. TOML files may carry `[defaults]`,
//! `[llm]` (with `[llm.gemini]` / `[llm.openrouter]`) and `[delays]` sections.

mod cli_args;
mod discovery;
mod model;
mod sources;
mod validation;

pub use archsmith_utils::types::ConfigSource;
pub use cli_args::CliArgs;
pub use discovery::{CONFIG_DIR_NAME, ENV_OUTPUT_DIR, ENV_PROVIDER};
pub use model::*;

use std::path::PathBuf;
use std::time::Duration;

impl Config {
    /// Output root for generated projects.
    #[must_use]
    pub fn output_dir(&self) -> PathBuf {
        PathBuf::from(
            self.defaults
                .output_dir
                .as_deref()
                .unwrap_or(DEFAULT_OUTPUT_DIR),
        )
    }

    #[must_use]
    pub fn verbose(&self) -> bool {
        self.defaults.verbose.unwrap_or(false)
    }

    #[must_use]
    pub fn clean_output(&self) -> bool {
        self.defaults.clean_output.unwrap_or(true)
    }

    /// Timeout applied to each model call.
    #[must_use]
    pub fn stage_timeout(&self) -> Duration {
        Duration::from_secs(
            self.defaults
                .stage_timeout
                .unwrap_or(DEFAULT_STAGE_TIMEOUT_SECS),
        )
    }

    #[must_use]
    pub fn max_tool_rounds(&self) -> u32 {
        self.defaults
            .max_tool_rounds
            .unwrap_or(DEFAULT_MAX_TOOL_ROUNDS)
    }

    /// Selected provider name; discovery always fills this in.
    #[must_use]
    pub fn provider(&self) -> &str {
        self.llm.provider.as_deref().unwrap_or("gemini")
    }

    /// Pause after `stage` completes.
    #[must_use]
    pub fn delay_for(&self, stage: &str) -> Duration {
        Duration::from_secs(self.delays.seconds_for(stage))
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl Config {
    /// Defaults with no delays, for tests that must not sleep.
    pub fn minimal_for_testing() -> Self {
        Config {
            defaults: Defaults::default(),
            llm: LlmConfig {
                provider: Some("gemini".to_string()),
                ..LlmConfig::default()
            },
            delays: DelaysConfig::zero(),
            source_attribution: std::collections::HashMap::new(),
        }
    }
}
