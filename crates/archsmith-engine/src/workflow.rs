//! Five-stage workflow: specification, backend, frontend, integration
//! review and completion review.
//!
//! Stage failures are recorded in the stage's result and the run continues.
//! Only problems before the first stage produce a failed run.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use archsmith_utils::error::StageError;
use archsmith_utils::logging::{log_stage_complete, log_stage_error, log_stage_start, stage_span};
use archsmith_utils::paths::ensure_dir_all;
use archsmith_utils::types::StageId;
use chrono::{DateTime, Utc};
use tracing::{Instrument, info, warn};

use crate::agents::{AgentProfile, AgentRoster};
use crate::delay::{FixedDelayPolicy, WaitPolicy};
use crate::health::ProjectHealth;
use crate::heuristics::{completion_detected, integration_issues_found, report_length};
use crate::result::{
    CompletionReview, FileInventory, FinalResult, IntegrationReview, RunStatus, Specification,
    StageResult,
};
use crate::runner::AgentRunner;
use crate::scanner::ProjectScanner;
use crate::spec_parser::parse_specification;
use crate::tasks::TaskSpec;

/// Specification used when the specification stage fails.
#[must_use]
pub fn fallback_specification(brief: &str) -> Specification {
    let backend_spec = format!(
        "Basic backend specification for: {brief}

REQUIREMENTS:
- REST API with CRUD operations
- User authentication system
- Data persistence with database
- Input validation and error handling

SUGGESTED ARCHITECTURE:
- FastAPI framework
- SQLAlchemy ORM
- Pydantic models
- JWT authentication"
    );
    let frontend_spec = format!(
        "Basic frontend specification for: {brief}

REQUIREMENTS:
- React with TypeScript
- Responsive UI with Tailwind CSS
- State management
- API integration
- Routing if multi-page

SUGGESTED STRUCTURE:
- Component-based architecture
- API service layer
- Context for state management
- Responsive design components"
    );

    Specification {
        backend_spec,
        frontend_spec,
        raw_output: format!("Fallback specifications for: {brief}"),
        is_fallback: true,
    }
}

fn new_run_id(now: DateTime<Utc>) -> String {
    format!("run-{}", now.format("%Y%m%dT%H%M%S%.3fZ"))
}

/// Orchestrates one project brief through every stage.
pub struct ArchitectWorkflow {
    runner: Arc<dyn AgentRunner>,
    roster: AgentRoster,
    wait: Arc<dyn WaitPolicy>,
    scanner: ProjectScanner,
}

impl ArchitectWorkflow {
    /// Workflow with the standard roster and no pauses between stages.
    pub fn new(runner: Arc<dyn AgentRunner>, output_root: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            roster: AgentRoster::standard(),
            wait: Arc::new(FixedDelayPolicy::default()),
            scanner: ProjectScanner::new(output_root),
        }
    }

    #[must_use]
    pub fn with_wait_policy(mut self, wait: Arc<dyn WaitPolicy>) -> Self {
        self.wait = wait;
        self
    }

    #[must_use]
    pub fn with_roster(mut self, roster: AgentRoster) -> Self {
        self.roster = roster;
        self
    }

    #[must_use]
    pub fn output_root(&self) -> &Path {
        self.scanner.root()
    }

    /// Run every stage for `brief`. Never fails; problems are recorded in the result.
    pub async fn execute(&self, brief: &str) -> FinalResult {
        let started_at = Utc::now();
        let run_id = new_run_id(started_at);
        info!(run_id = %run_id, brief = %brief, "Starting workflow");

        if let Err(error) = self.prepare(brief) {
            warn!(run_id = %run_id, error = %error, "Workflow failed before the first stage");
            let inventory = FileInventory::from_paths(self.scanner.list_files());
            return FinalResult::failed(brief, error, inventory, started_at);
        }

        let spec = self.generate_specification(&run_id, brief).await;
        self.wait.wait_after(StageId::Specification).await;

        let backend = self.generate_backend(&run_id, &spec).await;
        self.wait.wait_after(StageId::Backend).await;

        let frontend = self.generate_frontend(&run_id, &spec).await;
        self.wait.wait_after(StageId::Frontend).await;

        let integration = self
            .review_integration(&run_id, &backend, &frontend)
            .await;
        self.wait.wait_after(StageId::Integration).await;

        let completion = self.complete_project(&run_id, brief, &spec).await;
        self.wait.wait_after(StageId::Review).await;

        self.finalize(
            &run_id,
            brief,
            spec,
            backend,
            frontend,
            integration,
            completion,
            started_at,
        )
    }

    fn prepare(&self, brief: &str) -> Result<(), String> {
        if brief.trim().is_empty() {
            return Err("Project brief is empty".to_string());
        }
        let root = self.output_root();
        ensure_dir_all(root)
            .map_err(|e| format!("Failed to create output directory {}: {e}", root.display()))
    }

    async fn run_stage(
        &self,
        run_id: &str,
        agent: &AgentProfile,
        task: TaskSpec,
    ) -> Result<String, StageError> {
        let stage = task.stage.as_str();
        let task = task.for_run(run_id);

        async {
            log_stage_start(run_id, stage);
            let start = Instant::now();
            let result = self.runner.run_task(agent, &task).await;
            let elapsed = start.elapsed().as_millis();
            match &result {
                Ok(_) => log_stage_complete(run_id, stage, elapsed),
                Err(e) => log_stage_error(run_id, stage, &e.to_string(), elapsed),
            }
            result
        }
        .instrument(stage_span(run_id, stage))
        .await
    }

    async fn generate_specification(&self, run_id: &str, brief: &str) -> Specification {
        let task = TaskSpec::specification(brief);
        match self.run_stage(run_id, &self.roster.coordinator, task).await {
            Ok(raw_output) => {
                let parsed = parse_specification(&raw_output);
                Specification {
                    backend_spec: parsed.backend,
                    frontend_spec: parsed.frontend,
                    raw_output,
                    is_fallback: false,
                }
            }
            Err(e) => {
                warn!(run_id = %run_id, error = %e, "Specification failed; using fallback specification");
                fallback_specification(brief)
            }
        }
    }

    async fn generate_backend(&self, run_id: &str, spec: &Specification) -> StageResult {
        let task = TaskSpec::backend(&spec.backend_spec);
        match self.run_stage(run_id, &self.roster.backend, task).await {
            Ok(output) => StageResult::succeeded(output),
            Err(e) => StageResult::failed(format!("Backend generation failed: {e}")),
        }
    }

    async fn generate_frontend(&self, run_id: &str, spec: &Specification) -> StageResult {
        // The backend specification stands in for the API structure
        let task = TaskSpec::frontend(&spec.frontend_spec, &spec.backend_spec);
        match self.run_stage(run_id, &self.roster.frontend, task).await {
            Ok(output) => StageResult::succeeded(output),
            Err(e) => StageResult::failed(format!("Frontend generation failed: {e}")),
        }
    }

    async fn review_integration(
        &self,
        run_id: &str,
        backend: &StageResult,
        frontend: &StageResult,
    ) -> IntegrationReview {
        let task = TaskSpec::integration(&backend.raw_output, &frontend.raw_output);
        match self.run_stage(run_id, &self.roster.coordinator, task).await {
            Ok(report) => IntegrationReview {
                issues_found: integration_issues_found(&report),
                report,
                success: true,
                error: None,
            },
            Err(e) => {
                let message = format!("Integration review failed: {e}");
                IntegrationReview {
                    report: message.clone(),
                    issues_found: true,
                    success: false,
                    error: Some(message),
                }
            }
        }
    }

    async fn complete_project(
        &self,
        run_id: &str,
        brief: &str,
        spec: &Specification,
    ) -> CompletionReview {
        let before: BTreeSet<String> = self.scanner.list_files().into_iter().collect();
        let structure = self.scanner.scan();
        info!(
            run_id = %run_id,
            completeness_score = structure.analysis.completeness_score,
            missing_patterns = structure.analysis.missing_patterns.len(),
            "Scanned project before completion review"
        );

        let task = TaskSpec::completion(brief, spec, &structure);
        match self.run_stage(run_id, &self.roster.reviewer, task).await {
            Ok(report) => {
                let after: BTreeSet<String> = self.scanner.list_files().into_iter().collect();
                let new_files: Vec<String> = after.difference(&before).cloned().collect();
                let length = report_length(&report);
                info!(
                    run_id = %run_id,
                    new_files = new_files.len(),
                    report_length = length,
                    "Completion review finished"
                );
                CompletionReview {
                    issues_fixed: completion_detected(new_files.len(), &report),
                    new_files_count: new_files.len(),
                    new_files,
                    report_length: length,
                    report,
                    success: true,
                    error: None,
                }
            }
            Err(e) => {
                let message = format!("Completion review failed: {e}");
                CompletionReview {
                    report_length: report_length(&message),
                    report: message.clone(),
                    issues_fixed: false,
                    new_files: Vec::new(),
                    new_files_count: 0,
                    success: false,
                    error: Some(message),
                }
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn finalize(
        &self,
        run_id: &str,
        brief: &str,
        spec: Specification,
        backend: StageResult,
        frontend: StageResult,
        integration: IntegrationReview,
        completion: CompletionReview,
        started_at: DateTime<Utc>,
    ) -> FinalResult {
        let inventory = FileInventory::from_paths(self.scanner.list_files());
        let project_health = ProjectHealth::assess(
            inventory.backend,
            inventory.frontend,
            completion.issues_fixed,
            integration.issues_found,
        );
        let finished_at = Utc::now();

        info!(
            run_id = %run_id,
            files = inventory.files.len(),
            backend_files = inventory.backend,
            frontend_files = inventory.frontend,
            duplicates = inventory.duplicates,
            health = %project_health,
            "Workflow finished"
        );

        FinalResult {
            status: RunStatus::Completed,
            project_brief: brief.to_string(),
            files_count: inventory.files.len(),
            backend_files_count: inventory.backend,
            frontend_files_count: inventory.frontend,
            other_files_count: inventory.other,
            duplicates_found: inventory.duplicates,
            has_backend: inventory.backend > 0,
            has_frontend: inventory.frontend > 0,
            review_issues_fixed: completion.issues_fixed,
            integration_issues_found: integration.issues_found,
            generated_files: inventory.files,
            project_health,
            summary: format!("Successfully generated and reviewed software skeleton for: {brief}"),
            error: None,
            specifications: Some(spec),
            backend: Some(backend),
            frontend: Some(frontend),
            integration_report: Some(integration),
            final_review: Some(completion),
            started_at,
            finished_at,
            duration_ms: (finished_at - started_at).num_milliseconds(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::AgentKind;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Answers every task with fixed text and records the stages it saw.
    struct EchoRunner {
        fail: Vec<StageId>,
        seen: Mutex<Vec<(AgentKind, StageId, String)>>,
    }

    impl EchoRunner {
        fn failing(fail: Vec<StageId>) -> Arc<Self> {
            Arc::new(Self {
                fail,
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl AgentRunner for EchoRunner {
        async fn run_task(
            &self,
            agent: &AgentProfile,
            task: &TaskSpec,
        ) -> Result<String, StageError> {
            self.seen
                .lock()
                .unwrap()
                .push((agent.kind, task.stage, task.description.clone()));
            if self.fail.contains(&task.stage) {
                return Err(StageError::AgentFailed {
                    stage: task.stage.as_str().to_string(),
                    reason: "scripted failure".to_string(),
                });
            }
            Ok(match task.stage {
                StageId::Specification => {
                    "### BACKEND_SPEC\nOrders API\n### FRONTEND_SPEC\nOrder screens\n---".to_string()
                }
                StageId::Integration => "Everything lines up.".to_string(),
                _ => "ok".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_blank_brief_fails_before_stages() {
        let temp = TempDir::new().unwrap();
        let runner = EchoRunner::failing(vec![]);
        let workflow = ArchitectWorkflow::new(runner.clone(), temp.path());

        let result = workflow.execute("   ").await;

        assert_eq!(result.status, RunStatus::Failed);
        assert_eq!(result.summary, "Workflow failed: Project brief is empty");
        assert!(runner.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stages_run_in_order_with_expected_agents() {
        let temp = TempDir::new().unwrap();
        let runner = EchoRunner::failing(vec![]);
        let workflow = ArchitectWorkflow::new(runner.clone(), temp.path());

        let result = workflow.execute("todo app").await;

        let seen = runner.seen.lock().unwrap();
        let order: Vec<(AgentKind, StageId)> = seen.iter().map(|(a, s, _)| (*a, *s)).collect();
        assert_eq!(
            order,
            vec![
                (AgentKind::Coordinator, StageId::Specification),
                (AgentKind::Backend, StageId::Backend),
                (AgentKind::Frontend, StageId::Frontend),
                (AgentKind::Coordinator, StageId::Integration),
                (AgentKind::Reviewer, StageId::Review),
            ]
        );
        // Parsed sections flow into the generation prompts
        assert!(seen[1].2.contains("Orders API"));
        assert!(seen[2].2.contains("Order screens"));

        assert_eq!(result.status, RunStatus::Completed);
        assert!(!result.specifications.as_ref().unwrap().is_fallback);
        assert!(!result.integration_issues_found);
        assert_eq!(result.project_health, ProjectHealth::Poor);
    }

    #[tokio::test]
    async fn test_specification_failure_uses_fallback() {
        let temp = TempDir::new().unwrap();
        let runner = EchoRunner::failing(vec![StageId::Specification]);
        let workflow = ArchitectWorkflow::new(runner.clone(), temp.path());

        let result = workflow.execute("chat app").await;

        let spec = result.specifications.as_ref().unwrap();
        assert!(spec.is_fallback);
        assert_eq!(spec.raw_output, "Fallback specifications for: chat app");
        assert!(spec.backend_spec.starts_with("Basic backend specification for: chat app"));
        assert_eq!(result.status, RunStatus::Completed);

        let seen = runner.seen.lock().unwrap();
        assert!(seen[1].2.contains("REST API with CRUD operations"));
    }

    #[tokio::test]
    async fn test_stage_failures_are_recorded() {
        let temp = TempDir::new().unwrap();
        let runner = EchoRunner::failing(vec![
            StageId::Backend,
            StageId::Frontend,
            StageId::Integration,
            StageId::Review,
        ]);
        let workflow = ArchitectWorkflow::new(runner, temp.path());

        let result = workflow.execute("shop").await;

        let backend = result.backend.as_ref().unwrap();
        assert!(!backend.success);
        assert!(backend.raw_output.starts_with("Backend generation failed: "));
        assert!(
            result
                .frontend
                .as_ref()
                .unwrap()
                .raw_output
                .starts_with("Frontend generation failed: ")
        );
        let integration = result.integration_report.as_ref().unwrap();
        assert!(integration.issues_found);
        assert!(integration.report.starts_with("Integration review failed: "));
        let review = result.final_review.as_ref().unwrap();
        assert!(!review.issues_fixed);
        assert_eq!(review.new_files_count, 0);
        assert_eq!(result.status, RunStatus::Completed);
    }

    #[test]
    fn test_run_id_is_timestamped() {
        let now = Utc::now();
        let id = new_run_id(now);
        assert!(id.starts_with("run-"));
        assert!(id.ends_with('Z'));
    }
}
