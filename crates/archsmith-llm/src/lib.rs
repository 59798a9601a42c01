//! LLM backend abstraction for multi-provider support
//!
//! Every provider implements [`LlmBackend`], so the agent runner works with
//! any of them. Backends speak HTTP directly and support function calling so
//! agents can use tools.

mod budgeted_backend;
mod gemini_backend;
pub(crate) mod http_client;
mod openrouter_backend;
mod types;

pub use archsmith_utils::error::LlmError;
pub use budgeted_backend::{BUDGET_ENV_VAR, BudgetedBackend};
pub use gemini_backend::{DEFAULT_GEMINI_KEY_ENV, DEFAULT_GEMINI_MODEL};
pub use openrouter_backend::DEFAULT_OPENROUTER_KEY_ENV;
pub use types::{
    LlmBackend, LlmInvocation, LlmResult, Message, Role, ToolCall, ToolDeclaration,
};

pub(crate) use gemini_backend::GeminiBackend;
pub(crate) use openrouter_backend::OpenRouterBackend;

use archsmith_config::{Config, SUPPORTED_PROVIDERS};

fn construct_backend_for_provider<F>(
    provider: &str,
    config: &Config,
    env: F,
) -> Result<Box<dyn LlmBackend>, LlmError>
where
    F: Fn(&str) -> Option<String>,
{
    match provider {
        "gemini" => Ok(Box::new(GeminiBackend::new_from_config_with_env(config, env)?)),
        "openrouter" => Ok(Box::new(OpenRouterBackend::new_from_config_with_env(
            config, env,
        )?)),
        unknown => Err(LlmError::Unsupported(format!(
            "Unknown LLM provider '{unknown}'. Supported providers: {}.",
            SUPPORTED_PROVIDERS.join(", ")
        ))),
    }
}

/// Create the configured backend, wrapped in a [`BudgetedBackend`].
///
/// Fails fast when the provider's API key is missing, so a run never starts
/// without credentials.
///
/// # Errors
///
/// Returns `LlmError::Unsupported` if the provider is unknown and
/// `LlmError::Misconfiguration` if provider settings or credentials are missing.
pub fn from_config(config: &Config) -> Result<Box<dyn LlmBackend>, LlmError> {
    from_config_with_env(config, |key| std::env::var(key).ok())
}

/// [`from_config`] with an explicit environment lookup for the API key.
///
/// # Errors
///
/// Same as [`from_config`].
pub fn from_config_with_env<F>(config: &Config, env: F) -> Result<Box<dyn LlmBackend>, LlmError>
where
    F: Fn(&str) -> Option<String>,
{
    let provider = config.provider();
    let backend = construct_backend_for_provider(provider, config, env)?;

    tracing::info!(
        provider = provider,
        model = %resolved_model(config),
        "LLM backend ready"
    );

    Ok(Box::new(BudgetedBackend::with_limit_from_config(
        backend,
        config.llm.budget,
    )))
}

/// Model the configured provider will use, for display.
#[must_use]
pub fn resolved_model(config: &Config) -> String {
    match config.provider() {
        "gemini" => config
            .llm
            .gemini
            .as_ref()
            .and_then(|s| s.model.as_deref())
            .map_or(DEFAULT_GEMINI_MODEL, gemini_backend::normalize_model)
            .to_string(),
        "openrouter" => config
            .llm
            .openrouter
            .as_ref()
            .and_then(|s| s.model.clone())
            .unwrap_or_else(|| "(not configured)".to_string()),
        other => format!("(unknown provider {other})"),
    }
}
