//! Qualitative project health rating.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display, strum::EnumIter)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ProjectHealth {
    Excellent,
    Good,
    Fair,
    Basic,
    Poor,
}

impl ProjectHealth {
    /// Rate a project. Rules are checked top to bottom; the first match wins.
    #[must_use]
    pub fn assess(
        backend_files: usize,
        frontend_files: usize,
        issues_fixed: bool,
        integration_issues: bool,
    ) -> Self {
        if backend_files == 0 && frontend_files == 0 {
            ProjectHealth::Poor
        } else if backend_files > 5 && frontend_files > 5 && issues_fixed && !integration_issues {
            ProjectHealth::Excellent
        } else if backend_files > 3 && frontend_files > 3 && issues_fixed {
            ProjectHealth::Good
        } else if backend_files > 0 && frontend_files > 0 {
            ProjectHealth::Fair
        } else {
            ProjectHealth::Basic
        }
    }

    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            ProjectHealth::Excellent => "Project is production-ready!",
            ProjectHealth::Good => "Project is functional with minor issues.",
            ProjectHealth::Fair => "Project has basic structure but needs improvements.",
            ProjectHealth::Basic => "Project has minimal structure and needs significant work.",
            ProjectHealth::Poor => "Project generation failed or has critical issues.",
        }
    }
}
