//! Project scanner: inventories the generated tree and scores its completeness.
//!
//! Every scan rebuilds the structure from disk. Maps are ordered, so two
//! scans of an unchanged tree compare equal.

use archsmith_utils::paths::to_forward_slash;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

pub const BACKEND_PREFIX: &str = "backend/";
pub const FRONTEND_PREFIX: &str = "frontend/";

/// Ordered backend rules: the first rule with a matching substring wins.
pub const BACKEND_CATEGORY_RULES: &[(&[&str], &str)] = &[
    (&["router", "route"], "routers"),
    (&["model"], "models"),
    (&["schema"], "schemas"),
    (&["crud", "service"], "services"),
    (&["auth", "security"], "authentication"),
    (&["config", "setting"], "configuration"),
    (&["database", "db"], "database"),
    (&["main", "app"], "application"),
];

/// Ordered frontend rules: the first rule with a matching substring wins.
pub const FRONTEND_CATEGORY_RULES: &[(&[&str], &str)] = &[
    (&["component"], "components"),
    (&["page", "view"], "pages"),
    (&["service", "api"], "services"),
    (&["context", "store"], "state_management"),
    (&["hook"], "hooks"),
    (&["type", "interface"], "types"),
    (&["util", "helper"], "utilities"),
    (&["config"], "configuration"),
];

pub const OTHER_CATEGORY: &str = "other";

const MAX_SIDE_SCORE: u32 = 40;
const POINTS_PER_CATEGORY: u32 = 10;

/// Placeholder markers, matched case-insensitively against whole file content.
static PLACEHOLDER_MARKERS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // bare `pass` statement
        r"(?im)^\s*pass\s*$",
        // ellipsis literal as a statement or body
        r"(?m)(^|:)\s*\.\.\.\s*$",
        r"(?i)(#|//)\s*todo:\s*implement",
        r"(?i)(add|write) your code here",
        r"(?i)return\s+(\{\s*\}|null\b|undefined\b)",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("placeholder marker regex is valid"))
    .collect()
});

/// How far a file is from real code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ImplementationLevel {
    /// The file could not be read as UTF-8 text
    #[serde(rename = "none")]
    #[strum(serialize = "none")]
    Unreadable,
    Empty,
    Skeleton,
    Placeholder,
    Partial,
    Implemented,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    pub relative_path: String,
    /// Bytes of content
    pub size: u64,
    pub line_count: usize,
    /// Lines that are neither blank nor `#` / `//` comments
    pub non_empty_line_count: usize,
    pub has_content: bool,
    pub is_placeholder: bool,
    pub implementation_level: ImplementationLevel,
}

/// Files and categories for one side of the project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SideStructure {
    pub files: BTreeMap<String, FileRecord>,
    pub categories: BTreeMap<String, Vec<String>>,
}

impl SideStructure {
    fn insert(&mut self, record: FileRecord, category: &str) {
        self.categories
            .entry(category.to_string())
            .or_default()
            .push(record.relative_path.clone());
        self.files.insert(record.relative_path.clone(), record);
    }

    fn has(&self, category: &str) -> bool {
        self.categories.get(category).is_some_and(|files| !files.is_empty())
    }

    fn count(&self, category: &str) -> usize {
        self.categories.get(category).map_or(0, Vec::len)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Analysis {
    /// 0..=100
    pub completeness_score: u32,
    pub missing_patterns: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProjectStructure {
    pub backend: SideStructure,
    pub frontend: SideStructure,
    pub analysis: Analysis,
}

/// First rule with a needle in the path wins. Matching is case-sensitive.
fn categorize(relative_path: &str, rules: &[(&[&str], &'static str)]) -> &'static str {
    rules
        .iter()
        .find(|(needles, _)| needles.iter().any(|n| relative_path.contains(n)))
        .map_or(OTHER_CATEGORY, |(_, category)| category)
}

#[must_use]
pub fn categorize_backend_file(relative_path: &str) -> &'static str {
    categorize(relative_path, BACKEND_CATEGORY_RULES)
}

#[must_use]
pub fn categorize_frontend_file(relative_path: &str) -> &'static str {
    categorize(relative_path, FRONTEND_CATEGORY_RULES)
}

#[must_use]
pub fn is_placeholder_content(content: &str) -> bool {
    PLACEHOLDER_MARKERS.iter().any(|marker| marker.is_match(content))
}

fn code_lines(content: &str) -> usize {
    content
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with("//"))
        .count()
}

#[must_use]
pub fn implementation_level(content: &str) -> ImplementationLevel {
    if content.trim().is_empty() {
        return ImplementationLevel::Empty;
    }
    let lines = code_lines(content);
    if lines <= 2 {
        ImplementationLevel::Skeleton
    } else if is_placeholder_content(content) {
        ImplementationLevel::Placeholder
    } else if lines > 10 {
        ImplementationLevel::Implemented
    } else {
        ImplementationLevel::Partial
    }
}

/// Build the record for one file's content.
#[must_use]
pub fn file_record(relative_path: &str, content: &str) -> FileRecord {
    let non_empty = code_lines(content);
    FileRecord {
        relative_path: relative_path.to_string(),
        size: content.len() as u64,
        line_count: content.split('\n').count(),
        non_empty_line_count: non_empty,
        has_content: non_empty > 0,
        is_placeholder: is_placeholder_content(content),
        implementation_level: implementation_level(content),
    }
}

fn unreadable_record(relative_path: &str) -> FileRecord {
    FileRecord {
        relative_path: relative_path.to_string(),
        size: 0,
        line_count: 0,
        non_empty_line_count: 0,
        has_content: false,
        is_placeholder: true,
        implementation_level: ImplementationLevel::Unreadable,
    }
}

/// Score and checklist for a scanned structure.
#[must_use]
pub fn analyze(backend: &SideStructure, frontend: &SideStructure) -> Analysis {
    let mut missing = Vec::new();

    if !backend.has("routers") && !backend.has("application") {
        missing.push("Backend lacks API routing layer".to_string());
    }
    if !backend.has("services") {
        missing.push("Backend lacks business logic layer".to_string());
    }
    if !frontend.has("components") {
        missing.push("Frontend lacks UI components".to_string());
    }
    if !frontend.has("pages") && frontend.count("components") < 3 {
        missing.push("Frontend lacks sufficient component structure".to_string());
    }
    if !frontend.has("services") {
        missing.push("Frontend lacks API service layer".to_string());
    }

    let side_score = |side: &SideStructure| {
        (side.categories.len() as u32 * POINTS_PER_CATEGORY).min(MAX_SIDE_SCORE)
    };

    let implemented = backend
        .files
        .values()
        .chain(frontend.files.values())
        .filter(|f| f.has_content && !f.is_placeholder)
        .count();
    let implementation_score = if implemented > 10 {
        20
    } else if implemented > 5 {
        10
    } else {
        0
    };

    Analysis {
        completeness_score: side_score(backend) + side_score(frontend) + implementation_score,
        missing_patterns: missing,
    }
}

/// Scans a generated project below its output root.
#[derive(Debug, Clone)]
pub struct ProjectScanner {
    root: PathBuf,
}

impl ProjectScanner {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Every file below the root, relative and with forward slashes, sorted.
    /// A missing root yields an empty list.
    #[must_use]
    pub fn list_files(&self) -> Vec<String> {
        if !self.root.is_dir() {
            return Vec::new();
        }

        WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable entry during scan");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| {
                entry
                    .path()
                    .strip_prefix(&self.root)
                    .ok()
                    .map(to_forward_slash)
            })
            .collect()
    }

    /// Inventory `backend/` and `frontend/` and analyze completeness.
    #[must_use]
    pub fn scan(&self) -> ProjectStructure {
        let mut backend = SideStructure::default();
        let mut frontend = SideStructure::default();

        for relative in self.list_files() {
            let is_backend = relative.starts_with(BACKEND_PREFIX);
            let is_frontend = relative.starts_with(FRONTEND_PREFIX);
            if !is_backend && !is_frontend {
                continue;
            }

            let record = match fs::read_to_string(self.root.join(&relative)) {
                Ok(content) => file_record(&relative, &content),
                Err(e) => {
                    debug!(path = %relative, error = %e, "File is not readable text");
                    unreadable_record(&relative)
                }
            };

            if is_backend {
                let category = categorize_backend_file(&relative);
                backend.insert(record, category);
            } else {
                let category = categorize_frontend_file(&relative);
                frontend.insert(record, category);
            }
        }

        let analysis = analyze(&backend, &frontend);
        debug!(
            backend_files = backend.files.len(),
            frontend_files = frontend.files.len(),
            completeness_score = analysis.completeness_score,
            missing_patterns = analysis.missing_patterns.len(),
            "Scanned project structure"
        );

        ProjectStructure {
            backend,
            frontend,
            analysis,
        }
    }
}
