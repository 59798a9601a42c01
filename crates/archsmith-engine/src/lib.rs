//! Agent pipeline that turns a project brief into a generated project.
//!
//! [`ArchitectWorkflow`] sequences the five stages. Agents are plain
//! [`AgentProfile`] records run through an [`AgentRunner`]; generated output
//! is inspected with the [`ProjectScanner`] and rated with [`ProjectHealth`].

pub mod agents;
pub mod delay;
pub mod health;
pub mod heuristics;
pub mod result;
pub mod runner;
pub mod scanner;
pub mod spec_parser;
pub mod tasks;
pub mod workflow;

pub use agents::{AgentKind, AgentProfile, AgentRoster};
pub use delay::{FixedDelayPolicy, NoDelay, WaitPolicy};
pub use health::ProjectHealth;
pub use result::{
    CompletionReview, FileInventory, FinalResult, IntegrationReview, RunStatus, Specification,
    StageResult, render_summary,
};
pub use runner::{AgentRunner, LlmAgentRunner};
pub use scanner::{ImplementationLevel, ProjectScanner, ProjectStructure};
pub use spec_parser::{ParsedSpec, parse_specification};
pub use tasks::TaskSpec;
pub use workflow::{ArchitectWorkflow, fallback_specification};
