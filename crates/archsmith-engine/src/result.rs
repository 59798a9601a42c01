//! Records produced by a workflow run, and the summary rendering.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt::Write as _;

use crate::health::ProjectHealth;
use crate::scanner::{BACKEND_PREFIX, FRONTEND_PREFIX};

/// Backend and frontend specification for one brief.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Specification {
    pub backend_spec: String,
    pub frontend_spec: String,
    pub raw_output: String,
    /// True when the specification stage failed and fixed text was used
    pub is_fallback: bool,
}

/// Outcome of the backend or frontend generation stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageResult {
    pub raw_output: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StageResult {
    #[must_use]
    pub fn succeeded(raw_output: String) -> Self {
        Self {
            raw_output,
            success: true,
            error: None,
        }
    }

    /// Degraded result whose text is the error message.
    #[must_use]
    pub fn failed(message: String) -> Self {
        Self {
            raw_output: message.clone(),
            success: false,
            error: Some(message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntegrationReview {
    pub report: String,
    pub issues_found: bool,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionReview {
    pub report: String,
    pub issues_fixed: bool,
    /// Files that appeared during the review, sorted
    pub new_files: Vec<String>,
    pub new_files_count: usize,
    /// Report length in characters
    pub report_length: usize,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Deduplicated file list bucketed by top-level folder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileInventory {
    /// Unique paths, sorted
    pub files: Vec<String>,
    pub backend: usize,
    pub frontend: usize,
    pub other: usize,
    /// Raw count minus unique count
    pub duplicates: usize,
}

impl FileInventory {
    #[must_use]
    pub fn from_paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut raw = 0usize;
        let unique: BTreeSet<String> = paths
            .into_iter()
            .inspect(|_| raw += 1)
            .map(Into::into)
            .collect();

        let backend = unique.iter().filter(|p| p.starts_with(BACKEND_PREFIX)).count();
        let frontend = unique.iter().filter(|p| p.starts_with(FRONTEND_PREFIX)).count();

        Self {
            backend,
            frontend,
            other: unique.len() - backend - frontend,
            duplicates: raw - unique.len(),
            files: unique.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RunStatus {
    Completed,
    Failed,
}

/// Everything a run produced. Built once at the end of `execute`.
#[derive(Debug, Clone, Serialize)]
pub struct FinalResult {
    pub status: RunStatus,
    pub project_brief: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specifications: Option<Specification>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<StageResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frontend: Option<StageResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub integration_report: Option<IntegrationReview>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_review: Option<CompletionReview>,
    pub generated_files: Vec<String>,
    pub files_count: usize,
    pub backend_files_count: usize,
    pub frontend_files_count: usize,
    pub other_files_count: usize,
    pub duplicates_found: usize,
    pub has_backend: bool,
    pub has_frontend: bool,
    pub review_issues_fixed: bool,
    pub integration_issues_found: bool,
    pub project_health: ProjectHealth,
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: i64,
}

impl FinalResult {
    /// Result for a run that failed before any stage started.
    ///
    /// Health is rated from whatever files were already on disk, with no
    /// fixes and no integration issues.
    #[must_use]
    pub fn failed(
        brief: &str,
        error: String,
        inventory: FileInventory,
        started_at: DateTime<Utc>,
    ) -> Self {
        let finished_at = Utc::now();
        let project_health =
            ProjectHealth::assess(inventory.backend, inventory.frontend, false, false);
        Self {
            status: RunStatus::Failed,
            project_brief: brief.to_string(),
            specifications: None,
            backend: None,
            frontend: None,
            integration_report: None,
            final_review: None,
            files_count: inventory.files.len(),
            backend_files_count: inventory.backend,
            frontend_files_count: inventory.frontend,
            other_files_count: inventory.other,
            duplicates_found: inventory.duplicates,
            has_backend: inventory.backend > 0,
            has_frontend: inventory.frontend > 0,
            review_issues_fixed: false,
            integration_issues_found: false,
            project_health,
            summary: format!("Workflow failed: {error}"),
            error: Some(error),
            generated_files: inventory.files,
            started_at,
            finished_at,
            duration_ms: (finished_at - started_at).num_milliseconds(),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Completed
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

/// Human-readable completion block for one run.
#[must_use]
pub fn render_summary(result: &FinalResult) -> String {
    let rule = "=".repeat(40);
    let mut out = String::new();

    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "PROJECT COMPLETION SUMMARY");
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "Status: {}", result.status);
    let _ = writeln!(
        out,
        "Project Health: {}",
        result.project_health.to_string().to_uppercase()
    );
    let _ = writeln!(out, "Total Files: {}", result.files_count);
    let _ = writeln!(out, "Backend Files: {}", result.backend_files_count);
    let _ = writeln!(out, "Frontend Files: {}", result.frontend_files_count);
    let _ = writeln!(out, "Other Files: {}", result.other_files_count);
    let _ = writeln!(out, "Duplicates Removed: {}", result.duplicates_found);
    let _ = writeln!(out, "Backend Created: {}", yes_no(result.has_backend));
    let _ = writeln!(out, "Frontend Created: {}", yes_no(result.has_frontend));
    let _ = writeln!(
        out,
        "Review Issues Fixed: {}",
        yes_no(result.review_issues_fixed)
    );
    let _ = writeln!(
        out,
        "Integration Issues Found: {}",
        yes_no(result.integration_issues_found)
    );
    if result
        .specifications
        .as_ref()
        .is_some_and(|spec| spec.is_fallback)
    {
        let _ = writeln!(out, "Specification: fallback");
    }
    let _ = writeln!(out, "Duration: {:.1}s", result.duration_ms as f64 / 1000.0);
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "{}", result.project_health.message());
    let _ = writeln!(out, "Summary: {}", result.summary);
    if let Some(error) = &result.error {
        let _ = writeln!(out, "Error: {error}");
    }
    out
}
