use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use archsmith_utils::types::ConfigSource;

/// Default output directory, relative to the working directory.
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// Default per-call timeout in seconds.
pub const DEFAULT_STAGE_TIMEOUT_SECS: u64 = 600;

/// Default cap on tool-calling rounds per agent task.
pub const DEFAULT_MAX_TOOL_ROUNDS: u32 = 25;

/// Default cap on model calls per process.
pub const DEFAULT_LLM_BUDGET: u32 = 200;

/// Fallback pause after any stage without its own entry.
pub const DEFAULT_STAGE_DELAY_SECS: u64 = 30;

/// Built-in pauses after each stage, in seconds.
///
/// These keep a free-tier model key under its per-minute quota. Review has
/// no entry and pauses for `default`.
pub const DEFAULT_STAGE_DELAYS: [(&str, u64); 4] = [
    ("specification", 30),
    ("backend", 45),
    ("frontend", 45),
    ("integration", 30),
];

/// Providers this build can construct.
pub const SUPPORTED_PROVIDERS: [&str; 2] = ["gemini", "openrouter"];

/// Configuration for archsmith runs.
///
/// Use [`Config::discover()`] for CLI behavior: it searches upward for
/// `.archsmith/config.toml`, applies `ARCHSMITH_*` environment overrides and
/// then CLI flags.
///
/// # Configuration File Format
///
/// ```toml
/// [defaults]
/// output_dir = "output"
/// clean_output = true
/// stage_timeout = 600
/// max_tool_rounds = 25
///
/// [llm]
/// provider = "gemini"
/// budget = 200
///
/// [llm.gemini]
/// model = "gemini-2.5-flash"
/// temperature = 0.1
///
/// [delays]
/// default = 30
/// backend = 45
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    pub defaults: Defaults,
    pub llm: LlmConfig,
    pub delays: DelaysConfig,
    /// Source attribution for each setting (for `archsmith config`).
    pub source_attribution: HashMap<String, ConfigSource>,
}

/// `[defaults]` section
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    pub output_dir: Option<String>,
    pub verbose: Option<bool>,
    /// Wipe and recreate the output directory before a run.
    pub clean_output: Option<bool>,
    /// Per model-call timeout in seconds.
    pub stage_timeout: Option<u64>,
    pub max_tool_rounds: Option<u32>,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output_dir: Some(DEFAULT_OUTPUT_DIR.to_string()),
            verbose: Some(false),
            clean_output: Some(true),
            stage_timeout: Some(DEFAULT_STAGE_TIMEOUT_SECS),
            max_tool_rounds: Some(DEFAULT_MAX_TOOL_ROUNDS),
        }
    }
}

/// `[llm]` section
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LlmConfig {
    pub provider: Option<String>,
    /// Maximum model calls per process.
    pub budget: Option<u32>,
    pub gemini: Option<HttpProviderConfig>,
    pub openrouter: Option<HttpProviderConfig>,
}

/// `[llm.gemini]` / `[llm.openrouter]` sections
///
/// Unset fields fall back to provider defaults inside the backend.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct HttpProviderConfig {
    /// Name of the environment variable holding the API key.
    pub api_key_env: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

/// `[delays]` section: stage name to seconds, plus a `default` entry.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DelaysConfig {
    pub default: Option<u64>,
    #[serde(flatten)]
    pub stages: BTreeMap<String, u64>,
}

impl Default for DelaysConfig {
    fn default() -> Self {
        Self {
            default: Some(DEFAULT_STAGE_DELAY_SECS),
            stages: DEFAULT_STAGE_DELAYS
                .iter()
                .map(|(stage, secs)| ((*stage).to_string(), *secs))
                .collect(),
        }
    }
}

impl DelaysConfig {
    /// All-zero delays, used by `--no-delay` and tests.
    #[must_use]
    pub fn zero() -> Self {
        Self {
            default: Some(0),
            stages: BTreeMap::new(),
        }
    }

    /// Seconds to pause after `stage`; unknown stages use `default`.
    #[must_use]
    pub fn seconds_for(&self, stage: &str) -> u64 {
        self.stages
            .get(stage)
            .copied()
            .or(self.default)
            .unwrap_or(DEFAULT_STAGE_DELAY_SECS)
    }
}
