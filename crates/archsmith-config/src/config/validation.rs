use archsmith_utils::error::{ArchitectError, ConfigError};
use archsmith_utils::types::StageId;

use super::{Config, HttpProviderConfig, SUPPORTED_PROVIDERS};

fn invalid(key: impl Into<String>, value: impl Into<String>) -> ArchitectError {
    ArchitectError::Config(ConfigError::InvalidValue {
        key: key.into(),
        value: value.into(),
    })
}

impl Config {
    /// Validate configuration values
    pub(crate) fn validate(&self) -> Result<(), ArchitectError> {
        if let Some(output_dir) = &self.defaults.output_dir
            && output_dir.trim().is_empty()
        {
            return Err(invalid("output_dir", "must not be empty"));
        }

        if let Some(stage_timeout) = self.defaults.stage_timeout {
            if stage_timeout < 5 {
                return Err(invalid("stage_timeout", "must be at least 5 seconds"));
            }
            if stage_timeout > 7200 {
                return Err(invalid(
                    "stage_timeout",
                    "exceeds maximum limit of 7200 seconds (2 hours)",
                ));
            }
        }

        if let Some(rounds) = self.defaults.max_tool_rounds
            && !(1..=200).contains(&rounds)
        {
            return Err(invalid("max_tool_rounds", format!("{rounds} is outside 1..=200")));
        }

        if let Some(provider) = self.llm.provider.as_deref()
            && !SUPPORTED_PROVIDERS.contains(&provider)
        {
            return Err(invalid(
                "llm.provider",
                format!(
                    "unknown provider '{provider}' (supported: {})",
                    SUPPORTED_PROVIDERS.join(", ")
                ),
            ));
        }

        if self.llm.budget == Some(0) {
            return Err(invalid("llm.budget", "must be greater than 0"));
        }

        validate_provider_section("llm.gemini", self.llm.gemini.as_ref())?;
        validate_provider_section("llm.openrouter", self.llm.openrouter.as_ref())?;

        if let Some(default) = self.delays.default
            && default > 600
        {
            return Err(invalid("delays.default", "exceeds maximum of 600 seconds"));
        }
        for (stage, secs) in &self.delays.stages {
            if !StageId::ALL.iter().any(|s| s.as_str() == stage.as_str()) {
                return Err(invalid(
                    format!("delays.{stage}"),
                    "is not a pipeline stage",
                ));
            }
            if *secs > 600 {
                return Err(invalid(
                    format!("delays.{stage}"),
                    "exceeds maximum of 600 seconds",
                ));
            }
        }

        Ok(())
    }
}

fn validate_provider_section(
    prefix: &str,
    section: Option<&HttpProviderConfig>,
) -> Result<(), ArchitectError> {
    let Some(section) = section else {
        return Ok(());
    };

    if let Some(temperature) = section.temperature
        && !(0.0..=2.0).contains(&temperature)
    {
        return Err(invalid(
            format!("{prefix}.temperature"),
            format!("{temperature} is outside 0.0..=2.0"),
        ));
    }
    if section.max_tokens == Some(0) {
        return Err(invalid(format!("{prefix}.max_tokens"), "must be greater than 0"));
    }
    if let Some(env_name) = &section.api_key_env
        && env_name.trim().is_empty()
    {
        return Err(invalid(format!("{prefix}.api_key_env"), "must not be empty"));
    }
    if let Some(model) = &section.model
        && model.trim().is_empty()
    {
        return Err(invalid(format!("{prefix}.model"), "must not be empty"));
    }

    Ok(())
}
