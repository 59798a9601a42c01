//! Lightweight linter for generated code.
//!
//! Python gets a real syntax check through tree-sitter. JavaScript and
//! TypeScript get heuristic checks. Anything else gets a neutral report.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tree_sitter::{Node, Parser};

use crate::Tool;

pub const CODE_LINTER_TOOL: &str = "code_linter";

/// Lines above which a suggestion to split the file is made
const LONG_FILE_LINES: usize = 100;

static VAR_DECLARATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bvar\s").expect("var declaration regex is valid"));

/// Findings for one piece of code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LintReport {
    pub valid_syntax: bool,
    pub issues: Vec<String>,
    pub warnings: Vec<String>,
    pub suggestions: Vec<String>,
}

impl LintReport {
    fn clean() -> Self {
        Self {
            valid_syntax: true,
            ..Self::default()
        }
    }

    fn internal_failure(reason: impl std::fmt::Display) -> Self {
        Self {
            valid_syntax: false,
            issues: vec![format!("Error during linting: {reason}")],
            ..Self::default()
        }
    }
}

/// Language families the linter distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    Python,
    Script,
    Other,
}

fn family(language: &str) -> Family {
    match language.trim().to_ascii_lowercase().as_str() {
        "python" | "py" => Family::Python,
        "javascript" | "js" | "typescript" | "ts" => Family::Script,
        _ => Family::Other,
    }
}

/// Language name for a file extension, for linting files from disk.
#[must_use]
pub fn language_for_extension(extension: &str) -> &str {
    match extension.to_ascii_lowercase().as_str() {
        "py" | "pyi" => "python",
        "js" | "jsx" | "mjs" | "cjs" => "javascript",
        "ts" | "tsx" | "mts" | "cts" => "typescript",
        _ => extension,
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CodeLinter;

impl CodeLinter {
    pub fn new() -> Self {
        Self
    }

    /// Lint `code` as `language`. Never fails; internal errors become an issue.
    pub fn lint(&self, code: &str, language: &str) -> LintReport {
        match family(language) {
            Family::Python => lint_python(code).unwrap_or_else(LintReport::internal_failure),
            Family::Script => lint_script(code),
            Family::Other => LintReport {
                valid_syntax: true,
                issues: Vec::new(),
                warnings: vec!["Language-specific linting not available".to_string()],
                suggestions: vec![
                    "Consider running language-specific linter for detailed analysis".to_string(),
                ],
            },
        }
    }
}

/// First node that is an error or a parser-inserted missing token.
fn first_syntax_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    (0..node.child_count())
        .filter_map(|i| node.child(i))
        .find_map(first_syntax_error)
}

fn lint_python(code: &str) -> Result<LintReport, String> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_python::language())
        .map_err(|e| format!("Failed to set language: {e}"))?;
    let tree = parser
        .parse(code, None)
        .ok_or_else(|| "Failed to parse content".to_string())?;

    let mut report = LintReport::clean();

    let root = tree.root_node();
    if root.has_error() {
        report.valid_syntax = false;
        let (what, line) = match first_syntax_error(root) {
            Some(node) if node.is_missing() => {
                (format!("missing '{}'", node.kind()), node.start_position().row + 1)
            }
            Some(node) => ("invalid syntax".to_string(), node.start_position().row + 1),
            None => ("invalid syntax".to_string(), root.start_position().row + 1),
        };
        report.issues.push(format!("Syntax error: {what} at line {line}"));
    }

    if code.contains("import *") {
        report
            .warnings
            .push("Wildcard import detected - consider importing specific names".to_string());
    }

    if code.split('\n').count() > LONG_FILE_LINES {
        report
            .suggestions
            .push("Consider breaking down into smaller functions/modules".to_string());
    }

    Ok(report)
}

fn lint_script(code: &str) -> LintReport {
    let mut report = LintReport::clean();

    // Strict operators are fine; only bare == counts
    let without_strict = code.replace("===", " ").replace("!==", " ");
    if without_strict.contains("==") {
        report.warnings.push(
            "Consider using strict equality (===) instead of loose equality (==)".to_string(),
        );
    }

    if VAR_DECLARATION.is_match(code) {
        report.suggestions.push(
            "Consider using 'let' or 'const' instead of 'var' for better scoping".to_string(),
        );
    }

    if code.contains("console.log") {
        report
            .warnings
            .push("Found console.log statements - remove for production code".to_string());
    }

    let open = code.matches('{').count();
    let close = code.matches('}').count();
    if open != close {
        report
            .issues
            .push(format!("Mismatched braces: {open} opening vs {close} closing"));
    }

    report
}

#[derive(Debug, Deserialize)]
struct LintArgs {
    code: String,
    #[serde(default = "default_language")]
    language: String,
}

fn default_language() -> String {
    "python".to_string()
}

impl Tool for CodeLinter {
    fn name(&self) -> &'static str {
        CODE_LINTER_TOOL
    }

    fn description(&self) -> &'static str {
        "Analyzes code for syntax errors and common issues and suggests improvements."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "code": {
                    "type": "string",
                    "description": "Source code to analyze"
                },
                "language": {
                    "type": "string",
                    "description": "python, javascript or typescript; python when omitted"
                }
            },
            "required": ["code"]
        })
    }

    fn invoke(&self, args: &Value) -> Value {
        let report = match serde_json::from_value::<LintArgs>(args.clone()) {
            Ok(args) => self.lint(&args.code, &args.language),
            Err(e) => LintReport::internal_failure(format!("invalid arguments: {e}")),
        };
        serde_json::to_value(&report).unwrap_or_else(|e| {
            json!({"valid_syntax": false, "issues": [format!("Error during linting: {e}")]})
        })
    }
}
