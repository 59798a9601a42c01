use serde::{Deserialize, Serialize};
use std::fmt;

/// Stage identifiers for the generation pipeline.
///
/// Stages always run in the order of [`StageId::ALL`]:
///
/// ```text
/// Specification → Backend → Frontend → Integration → Review
/// ```
///
/// Each stage is one agent running one task. A failed stage never stops the
/// stages after it; the workflow records the failure and moves on.
///
/// # Example
///
/// ```rust
/// use archsmith_utils::types::StageId;
///
/// assert_eq!(StageId::Specification.as_str(), "specification");
/// assert_eq!(StageId::ALL.len(), 5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(any(test, feature = "test-utils"), derive(strum::VariantNames))]
pub enum StageId {
    /// Turns the project brief into backend and frontend specifications.
    Specification,
    /// Generates the backend source tree.
    Backend,
    /// Generates the frontend source tree.
    Frontend,
    /// Reviews the two trees for API mismatches.
    Integration,
    /// Fills gaps found by scanning the generated project.
    Review,
}

impl StageId {
    /// All stages in execution order.
    pub const ALL: [StageId; 5] = [
        Self::Specification,
        Self::Backend,
        Self::Frontend,
        Self::Integration,
        Self::Review,
    ];

    /// Canonical lowercase name, used for delay keys and log fields.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Specification => "specification",
            Self::Backend => "backend",
            Self::Frontend => "frontend",
            Self::Integration => "integration",
            Self::Review => "review",
        }
    }

    /// Human-readable label for progress output.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Specification => "Specification",
            Self::Backend => "Backend generation",
            Self::Frontend => "Frontend generation",
            Self::Integration => "Integration review",
            Self::Review => "Completion review",
        }
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source of a configuration value.
///
/// Precedence, highest first: CLI arguments > environment > config file > built-in defaults.
///
/// Serializes to lowercase strings: `"cli"`, `"env"`, `"config"`, `"default"`.
///
/// ```rust
/// use archsmith_utils::types::ConfigSource;
///
/// let json = serde_json::to_string(&ConfigSource::Env).unwrap();
/// assert_eq!(json, r#""env""#);
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(any(test, feature = "test-utils"), derive(strum::VariantNames))]
pub enum ConfigSource {
    /// Value provided via CLI argument.
    Cli,
    /// Value provided via an `ARCHSMITH_*` environment variable.
    Env,
    /// Value loaded from `.archsmith/config.toml`.
    Config,
    /// Built-in default value.
    Default,
}

impl ConfigSource {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Cli => "cli",
            Self::Env => "env",
            Self::Config => "config",
            Self::Default => "default",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order_is_pipeline_order() {
        let names: Vec<_> = StageId::ALL.iter().map(StageId::as_str).collect();
        assert_eq!(
            names,
            vec!["specification", "backend", "frontend", "integration", "review"]
        );
    }

    #[test]
    fn test_stage_serializes_lowercase() {
        let json = serde_json::to_string(&StageId::Integration).unwrap();
        assert_eq!(json, r#""integration""#);

        let back: StageId = serde_json::from_str(r#""review""#).unwrap();
        assert_eq!(back, StageId::Review);
    }

    #[test]
    fn test_config_source_labels_match_serde() {
        for source in [
            ConfigSource::Cli,
            ConfigSource::Env,
            ConfigSource::Config,
            ConfigSource::Default,
        ] {
            let json = serde_json::to_string(&source).unwrap();
            assert_eq!(json, format!("\"{}\"", source.as_str()));
        }
    }

    #[test]
    fn test_variant_names_cover_all_stages() {
        use strum::VariantNames;
        assert_eq!(StageId::VARIANTS.len(), StageId::ALL.len());
    }
}
