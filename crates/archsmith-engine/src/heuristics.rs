//! Keyword heuristics over review text.
//!
//! Matching is a case-insensitive substring test. "fix" also matches
//! "fixed" and "prefix", which is accepted.

/// Words that flag an integration review as having found problems.
pub const ISSUE_KEYWORDS: &[&str] = &[
    "mismatch",
    "error",
    "issue",
    "inconsistent",
    "correction needed",
    "fix",
    "problem",
];

/// Words that flag a completion review as having done real work.
pub const COMPLETION_KEYWORDS: &[&str] = &[
    "implemented",
    "completed",
    "added",
    "created",
    "finished",
    "functional",
    "working",
    "handlers",
    "endpoints",
    "components",
];

/// More new files than this counts as completion.
pub const NEW_FILES_THRESHOLD: usize = 2;

/// A report longer than this many characters counts as completion.
pub const REPORT_LENGTH_THRESHOLD: usize = 800;

fn mentions_any(text: &str, keywords: &[&str]) -> bool {
    let lower = text.to_lowercase();
    keywords.iter().any(|k| lower.contains(k))
}

#[must_use]
pub fn integration_issues_found(report: &str) -> bool {
    mentions_any(report, ISSUE_KEYWORDS)
}

/// Length of a report in characters.
#[must_use]
pub fn report_length(report: &str) -> usize {
    report.chars().count()
}

#[must_use]
pub fn completion_detected(new_files: usize, report: &str) -> bool {
    new_files > NEW_FILES_THRESHOLD
        || mentions_any(report, COMPLETION_KEYWORDS)
        || report_length(report) > REPORT_LENGTH_THRESHOLD
}
