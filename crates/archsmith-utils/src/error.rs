use std::fmt;
use std::time::Duration;
use thiserror::Error;

pub use crate::paths::SandboxError;

/// Library-level error type with rich context and user-friendly reporting.
///
/// `ArchitectError` is returned by archsmith operations that can fail before
/// or outside the stage pipeline: configuration discovery, backend
/// construction, and output-directory preparation. Failures *inside* a stage
/// never surface here; the workflow folds them into its result record.
///
/// # Exit Code Mapping
///
/// | Exit Code | Error Type |
/// |-----------|------------|
/// | 2 | Configuration errors, missing credentials, unsupported providers |
/// | 10 | Model invocation timeouts |
/// | 70 | Model provider failures |
/// | 1 | Other errors |
///
/// # Example
///
/// ```rust
/// use archsmith_utils::error::{ArchitectError, ConfigError};
/// use archsmith_utils::exit_codes::ExitCode;
///
/// let err = ArchitectError::Config(ConfigError::InvalidFile("bad toml".to_string()));
/// assert_eq!(err.to_exit_code(), ExitCode::CLI_ARGS);
/// assert!(err.display_for_user().contains("Suggestions:"));
/// ```
///
/// Library code returns `ArchitectError` and does NOT call `std::process::exit()`.
#[derive(Error, Debug)]
pub enum ArchitectError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Stage execution error: {0}")]
    Stage(#[from] StageError),

    #[error("LLM backend error: {0}")]
    Llm(#[from] LlmError),

    #[error("Output sandbox error: {0}")]
    Sandbox(#[from] SandboxError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait for providing user-friendly error reporting with context and suggestions
pub trait UserFriendlyError {
    /// Get a user-friendly error message
    fn user_message(&self) -> String;

    /// Get contextual information about the error
    fn context(&self) -> Option<String>;

    /// Get suggested actions to resolve the error
    fn suggestions(&self) -> Vec<String>;

    /// Get the error category for grouping similar errors
    fn category(&self) -> ErrorCategory;
}

/// Categories of errors for better organization and handling
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    StageExecution,
    ModelIntegration,
    FileSystem,
    Security,
    ResourceLimits,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "Configuration"),
            Self::StageExecution => write!(f, "Stage Execution"),
            Self::ModelIntegration => write!(f, "Model Integration"),
            Self::FileSystem => write!(f, "File System"),
            Self::Security => write!(f, "Security"),
            Self::ResourceLimits => write!(f, "Resource Limits"),
        }
    }
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration file: {0}")]
    InvalidFile(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found at {path}")]
    NotFound { path: String },

    #[error("Configuration discovery failed: {reason}")]
    DiscoveryFailed { reason: String },
}

impl UserFriendlyError for ConfigError {
    fn user_message(&self) -> String {
        match self {
            Self::InvalidFile(reason) => {
                format!("Configuration file has invalid format: {reason}")
            }
            Self::MissingRequired(key) => {
                format!("Required configuration '{key}' is missing")
            }
            Self::InvalidValue { key, value } => {
                format!("Configuration '{key}' has invalid value: {value}")
            }
            Self::NotFound { path } => {
                format!("Configuration file not found: {path}")
            }
            Self::DiscoveryFailed { reason } => {
                format!("Failed to discover configuration: {reason}")
            }
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::InvalidFile(_) => Some(
                "Configuration files must be valid TOML with optional [defaults], [llm] and [delays] sections."
                    .to_string(),
            ),
            Self::MissingRequired(_) => Some(
                "Some configuration values have no default and must be provided.".to_string(),
            ),
            Self::InvalidValue { key, value: _ } => Some(format!(
                "The '{key}' configuration option has specific format requirements."
            )),
            Self::NotFound { path: _ } => Some(
                "archsmith searches for .archsmith/config.toml starting from the current directory upward."
                    .to_string(),
            ),
            Self::DiscoveryFailed { reason: _ } => Some(
                "Configuration discovery walks up the directory tree looking for .archsmith/config.toml."
                    .to_string(),
            ),
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidFile(_) => vec![
                "Check the TOML syntax using a TOML validator".to_string(),
                "Compare with the example configuration in the README".to_string(),
            ],
            Self::MissingRequired(key) => vec![
                format!("Add '{key}' to .archsmith/config.toml"),
                "Use CLI flags as a temporary workaround".to_string(),
            ],
            Self::InvalidValue { key, value: _ } => match key.as_str() {
                "provider" | "llm.provider" => vec![
                    "Use 'gemini' or 'openrouter' as the provider".to_string(),
                    "Set ARCHSMITH_LLM_PROVIDER or pass --provider".to_string(),
                ],
                "temperature" => vec!["Use a value between 0.0 and 2.0".to_string()],
                "stage_timeout" => vec![
                    "Use a timeout between 5 and 7200 seconds".to_string(),
                ],
                "max_tool_rounds" => vec!["Use a value between 1 and 200".to_string()],
                key if key.starts_with("delays.") => vec![
                    "Use a delay between 0 and 600 seconds".to_string(),
                    "Pass --no-delay to skip inter-stage pauses entirely".to_string(),
                ],
                _ => vec![
                    "Check the documentation for valid values for this option".to_string(),
                    "Remove the option to use the default value".to_string(),
                ],
            },
            Self::NotFound { path: _ } => vec![
                "Create .archsmith/config.toml in your project root".to_string(),
                "Use CLI flags instead of a configuration file".to_string(),
            ],
            Self::DiscoveryFailed { reason: _ } => vec![
                "Check read permissions on the current directory and its parents".to_string(),
                "Use --config <path> to specify the configuration file explicitly".to_string(),
            ],
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Configuration
    }
}

/// Errors raised while an agent works on a stage task.
///
/// The workflow converts these into a failed stage result; they only reach
/// the user through the final summary.
#[derive(Error, Debug)]
pub enum StageError {
    #[error("Agent failed during {stage} stage: {reason}")]
    AgentFailed { stage: String, reason: String },

    #[error("Model call failed during {stage} stage: {source}")]
    Llm {
        stage: String,
        #[source]
        source: LlmError,
    },
}

impl UserFriendlyError for StageError {
    fn user_message(&self) -> String {
        match self {
            Self::AgentFailed { stage, reason } => {
                format!("The {stage} stage did not complete: {reason}")
            }
            Self::Llm { stage, source } => {
                format!("The {stage} stage could not reach the model: {}", source.user_message())
            }
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::AgentFailed { .. } => Some(
                "Stages run one agent task each; later stages continue with fallback inputs."
                    .to_string(),
            ),
            Self::Llm { source, .. } => source.context(),
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::AgentFailed { .. } => vec![
                "Re-run with --verbose to see the agent's tool calls".to_string(),
                "Raise max_tool_rounds if the agent ran out of rounds".to_string(),
            ],
            Self::Llm { source, .. } => source.suggestions(),
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::AgentFailed { .. } => ErrorCategory::StageExecution,
            Self::Llm { source, .. } => source.category(),
        }
    }
}

/// Errors that can occur during LLM backend operations
#[derive(Debug, Clone, Error)]
pub enum LlmError {
    /// Transport-level failure (HTTP connectivity, malformed responses)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Provider authentication failure (401, 403)
    #[error("Provider authentication error: {0}")]
    ProviderAuth(String),

    /// Provider quota/rate limit exceeded (429)
    #[error("Provider quota exceeded: {0}")]
    ProviderQuota(String),

    /// Provider service outage (5xx errors)
    #[error("Provider outage: {0}")]
    ProviderOutage(String),

    /// Invocation timed out
    #[error("Timeout after {duration:?}")]
    Timeout { duration: Duration },

    /// Budget limit exceeded
    #[error("Budget exceeded: attempted {attempted} calls, limit is {limit}")]
    BudgetExceeded { limit: u32, attempted: u32 },

    /// Configuration error, including a missing API key
    #[error("Misconfiguration: {0}")]
    Misconfiguration(String),

    /// Unsupported feature or provider
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

impl UserFriendlyError for LlmError {
    fn user_message(&self) -> String {
        match self {
            Self::Transport(msg) => format!("LLM transport error: {msg}"),
            Self::ProviderAuth(msg) => format!("LLM provider authentication failed: {msg}"),
            Self::ProviderQuota(msg) => format!("LLM provider quota exceeded: {msg}"),
            Self::ProviderOutage(msg) => format!("LLM provider service outage: {msg}"),
            Self::Timeout { duration } => {
                format!("LLM invocation timed out after {duration:?}")
            }
            Self::BudgetExceeded { limit, attempted } => {
                format!("LLM budget exceeded: attempted {attempted} calls, limit is {limit}")
            }
            Self::Misconfiguration(msg) => format!("LLM configuration error: {msg}"),
            Self::Unsupported(msg) => format!("LLM feature not supported: {msg}"),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::Transport(_) => Some(
                "Transport errors occur when the model provider cannot be reached or returns an unreadable response."
                    .to_string(),
            ),
            Self::ProviderAuth(_) => Some(
                "Authentication errors indicate a missing or invalid API key.".to_string(),
            ),
            Self::ProviderQuota(_) => Some(
                "Quota errors occur when rate limits or usage limits are exceeded.".to_string(),
            ),
            Self::ProviderOutage(_) => {
                Some("Provider outages are temporary service disruptions.".to_string())
            }
            Self::Timeout { .. } => Some(
                "Timeouts occur when a model call takes longer than the configured stage timeout."
                    .to_string(),
            ),
            Self::BudgetExceeded { .. } => Some(
                "The call budget caps how many model requests one archsmith process may make."
                    .to_string(),
            ),
            Self::Misconfiguration(_) => Some(
                "Configuration errors indicate missing or invalid LLM provider settings."
                    .to_string(),
            ),
            Self::Unsupported(_) => Some(
                "Only the providers compiled into this build of archsmith can be selected."
                    .to_string(),
            ),
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Transport(_) => vec![
                "Verify network connectivity to the provider".to_string(),
                "Try running with --verbose to see detailed error information".to_string(),
            ],
            Self::ProviderAuth(_) => vec![
                "Check that the required API key environment variable is set".to_string(),
                "Verify the API key is valid and not expired".to_string(),
            ],
            Self::ProviderQuota(_) | Self::ProviderOutage(_) => vec![
                "Wait a few minutes and try again".to_string(),
                "Check your provider's usage dashboard or status page".to_string(),
            ],
            Self::Timeout { .. } => vec![
                "Increase stage_timeout in .archsmith/config.toml".to_string(),
                "Check your internet connection".to_string(),
            ],
            Self::BudgetExceeded { .. } => vec![
                "Increase llm.budget in configuration or set ARCHSMITH_LLM_BUDGET".to_string(),
                "Lower max_tool_rounds so each stage makes fewer calls".to_string(),
            ],
            Self::Misconfiguration(_) => vec![
                "Check the [llm] section of .archsmith/config.toml".to_string(),
                "Put the API key in the environment or in a .env file".to_string(),
            ],
            Self::Unsupported(_) => vec![
                "Use 'gemini' or 'openrouter' as the provider".to_string(),
            ],
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Transport(_) | Self::ProviderOutage(_) => ErrorCategory::ModelIntegration,
            Self::ProviderAuth(_) | Self::Misconfiguration(_) | Self::Unsupported(_) => {
                ErrorCategory::Configuration
            }
            Self::ProviderQuota(_) | Self::BudgetExceeded { .. } => ErrorCategory::ResourceLimits,
            Self::Timeout { .. } => ErrorCategory::StageExecution,
        }
    }
}

impl UserFriendlyError for SandboxError {
    fn user_message(&self) -> String {
        format!("Refused to touch a path outside the output directory: {self}")
    }

    fn context(&self) -> Option<String> {
        Some("All generated files must stay inside the configured output directory.".to_string())
    }

    fn suggestions(&self) -> Vec<String> {
        vec![
            "Check output_dir in .archsmith/config.toml or --output-dir".to_string(),
            "Make sure the output directory exists and is not a symlink".to_string(),
        ]
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Security
    }
}

impl UserFriendlyError for ArchitectError {
    fn user_message(&self) -> String {
        match self {
            Self::Config(err) => err.user_message(),
            Self::Stage(err) => err.user_message(),
            Self::Llm(err) => err.user_message(),
            Self::Sandbox(err) => err.user_message(),
            Self::Io(err) => format!("File system operation failed: {err}"),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::Config(err) => err.context(),
            Self::Stage(err) => err.context(),
            Self::Llm(err) => err.context(),
            Self::Sandbox(err) => err.context(),
            Self::Io(_) => Some(
                "archsmith writes every generated file under the output directory.".to_string(),
            ),
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Config(err) => err.suggestions(),
            Self::Stage(err) => err.suggestions(),
            Self::Llm(err) => err.suggestions(),
            Self::Sandbox(err) => err.suggestions(),
            Self::Io(_) => vec![
                "Check permissions on the output directory".to_string(),
                "Check available disk space".to_string(),
            ],
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Config(err) => err.category(),
            Self::Stage(err) => err.category(),
            Self::Llm(err) => err.category(),
            Self::Sandbox(err) => err.category(),
            Self::Io(_) => ErrorCategory::FileSystem,
        }
    }
}

impl ArchitectError {
    /// Get a user-friendly error message with context and actionable suggestions.
    ///
    /// Provider text is redacted before it is returned.
    #[must_use]
    pub fn display_for_user(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("Error: {}\n", self.user_message()));

        if let Some(ctx) = self.context() {
            output.push_str(&format!("\nContext: {ctx}\n"));
        }

        let suggestions = self.suggestions();
        if !suggestions.is_empty() {
            output.push_str("\nSuggestions:\n");
            for suggestion in suggestions {
                output.push_str(&format!("  • {suggestion}\n"));
            }
        }

        crate::redaction::redact_secrets(&output)
    }

    /// Map this error to the appropriate CLI exit code.
    #[must_use]
    pub fn to_exit_code(&self) -> crate::exit_codes::ExitCode {
        use crate::exit_codes::ExitCode;

        match self {
            Self::Config(_) => ExitCode::CLI_ARGS,
            Self::Llm(err) | Self::Stage(StageError::Llm { source: err, .. }) => match err {
                LlmError::Timeout { .. } => ExitCode::STAGE_TIMEOUT,
                LlmError::Misconfiguration(_) | LlmError::Unsupported(_) => ExitCode::CLI_ARGS,
                _ => ExitCode::LLM_FAILURE,
            },
            Self::Stage(StageError::AgentFailed { .. }) => ExitCode::WORKFLOW_FAILED,
            Self::Sandbox(_) | Self::Io(_) => ExitCode::INTERNAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exit_codes::ExitCode;

    #[test]
    fn test_display_for_user_has_all_sections() {
        let err = ArchitectError::Config(ConfigError::InvalidValue {
            key: "llm.provider".to_string(),
            value: "llama".to_string(),
        });
        let text = err.display_for_user();

        assert!(text.starts_with("Error: Configuration 'llm.provider' has invalid value: llama"));
        assert!(text.contains("\nContext: "));
        assert!(text.contains("\nSuggestions:\n  • Use 'gemini' or 'openrouter' as the provider"));
    }

    #[test]
    fn test_display_for_user_redacts_provider_text() {
        let err = ArchitectError::Llm(LlmError::ProviderAuth(
            "rejected key AIzaSyD-abcdefghijklmnopqrstuvwxyz0123456".to_string(),
        ));
        let text = err.display_for_user();
        assert!(!text.contains("abcdefghijklmnopqrstuvwxyz0123456"));
        assert!(text.contains("[REDACTED_KEY]"));
    }

    #[test]
    fn test_exit_code_mapping() {
        let cases = [
            (
                ArchitectError::Config(ConfigError::MissingRequired("model".into())),
                ExitCode::CLI_ARGS,
            ),
            (
                ArchitectError::Llm(LlmError::Misconfiguration("no key".into())),
                ExitCode::CLI_ARGS,
            ),
            (
                ArchitectError::Llm(LlmError::Unsupported("llama".into())),
                ExitCode::CLI_ARGS,
            ),
            (
                ArchitectError::Llm(LlmError::Timeout {
                    duration: Duration::from_secs(5),
                }),
                ExitCode::STAGE_TIMEOUT,
            ),
            (
                ArchitectError::Llm(LlmError::ProviderOutage("503".into())),
                ExitCode::LLM_FAILURE,
            ),
            (
                ArchitectError::Stage(StageError::Llm {
                    stage: "backend".into(),
                    source: LlmError::ProviderQuota("429".into()),
                }),
                ExitCode::LLM_FAILURE,
            ),
            (
                ArchitectError::Stage(StageError::AgentFailed {
                    stage: "review".into(),
                    reason: "no answer".into(),
                }),
                ExitCode::WORKFLOW_FAILED,
            ),
            (
                ArchitectError::Io(std::io::Error::other("disk full")),
                ExitCode::INTERNAL,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.to_exit_code(), expected, "wrong exit code for {err}");
        }
    }

    #[test]
    fn test_stage_llm_error_delegates_to_source() {
        let err = StageError::Llm {
            stage: "frontend".into(),
            source: LlmError::BudgetExceeded {
                limit: 3,
                attempted: 4,
            },
        };
        assert_eq!(err.category(), ErrorCategory::ResourceLimits);
        assert!(err.user_message().contains("frontend"));
        assert!(err.user_message().contains("limit is 3"));
    }

    #[test]
    fn test_category_display() {
        assert_eq!(ErrorCategory::StageExecution.to_string(), "Stage Execution");
        assert_eq!(ErrorCategory::ModelIntegration.to_string(), "Model Integration");
    }
}
