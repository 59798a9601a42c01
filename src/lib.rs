//! archsmith - multi-agent pipeline that turns a project brief into a
//! backend and frontend skeleton
//!
//! Given a one-paragraph brief, archsmith asks a coordinator agent for a
//! technical specification, has specialist agents write the backend and
//! frontend trees with a sandboxed file writer, reviews the two for
//! integration mismatches, and finishes with a completion pass guided by a
//! scan of what was generated.
//!
//! # Quick Start (CLI)
//!
//! ```bash
//! export GEMINI_API_KEY=...
//! archsmith run "A recipe sharing site with user accounts and ratings"
//!
//! # The built-in food delivery example, without pauses between stages
//! archsmith run --example --no-delay
//!
//! # Inspect what was generated
//! archsmith scan --json
//! ```
//!
//! # Library
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use archsmith::{ArchitectWorkflow, CliArgs, Config, LlmAgentRunner, Toolbox};
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let config = Config::discover(&CliArgs::default())?;
//! let backend = archsmith::llm::from_config(&config)?;
//! let runner = LlmAgentRunner::new(
//!     Arc::from(backend),
//!     Toolbox::standard(config.output_dir()),
//!     config.stage_timeout(),
//!     config.max_tool_rounds(),
//! );
//! let result = ArchitectWorkflow::new(Arc::new(runner), config.output_dir())
//!     .execute("A todo list with sharing")
//!     .await;
//! println!("{}", archsmith::render_summary(&result));
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Stable Public API
// ============================================================================

/// Configuration with discovery and precedence: CLI > environment > file > defaults.
pub use archsmith_config::{CliArgs, Config};

/// Library-level error type with user-facing rendering and exit code mapping.
pub use archsmith_utils::error::{ArchitectError, ErrorCategory, UserFriendlyError};

/// Exit codes matching the documented exit code table.
pub use archsmith_utils::exit_codes::ExitCode;

/// Pipeline stage identifiers.
pub use archsmith_utils::types::StageId;

pub use archsmith_engine::{
    AgentRoster, AgentRunner, ArchitectWorkflow, FinalResult, FixedDelayPolicy, LlmAgentRunner,
    NoDelay, ProjectHealth, ProjectScanner, ProjectStructure, RunStatus, WaitPolicy,
    parse_specification, render_summary,
};
pub use archsmith_tools::{CodeLinter, FileWriter, LintReport, Toolbox, WriteRequest};

// ============================================================================
// Module paths for embedding
// ============================================================================

#[doc(hidden)]
pub use archsmith_engine as engine;
#[doc(hidden)]
pub use archsmith_llm as llm;
#[doc(hidden)]
pub use archsmith_tools as tools;

pub mod cli;
