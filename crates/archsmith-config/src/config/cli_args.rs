use std::path::PathBuf;

/// Overrides collected from the command line.
///
/// Every field is optional; `None` leaves the lower-precedence value alone.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    /// Explicit config file; skips upward discovery.
    pub config_path: Option<PathBuf>,
    pub output_dir: Option<String>,
    pub provider: Option<String>,
    /// Model for the selected provider.
    pub model: Option<String>,
    pub verbose: Option<bool>,
    pub clean_output: Option<bool>,
    pub stage_timeout: Option<u64>,
    pub max_tool_rounds: Option<u32>,
    /// Zero every inter-stage delay.
    pub no_delay: bool,
}
