//! Splits the coordinator's specification text into backend and frontend parts.

use once_cell::sync::Lazy;
use regex::Regex;

pub const BACKEND_HEADER: &str = "### BACKEND_SPEC";
pub const FRONTEND_HEADER: &str = "### FRONTEND_SPEC";

pub const BACKEND_PLACEHOLDER: &str = "Backend specification not properly generated";
pub const FRONTEND_PLACEHOLDER: &str = "Frontend specification not properly generated";

static BACKEND_HEADER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)### BACKEND_SPEC[ \t]*\r?\n").expect("backend header regex"));
static FRONTEND_HEADER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)### FRONTEND_SPEC[ \t]*\r?\n").expect("frontend header regex"));
/// A horizontal rule or the next `### ` heading ends a section.
static SECTION_END_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)---|### [a-z]").expect("section terminator regex"));

/// Backend and frontend parts of a specification, both non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSpec {
    pub backend: String,
    pub frontend: String,
}

fn section(text: &str, header: &Regex) -> Option<String> {
    let start = header.find(text)?.end();
    let rest = &text[start..];
    let end = SECTION_END_RE.find(rest).map_or(rest.len(), |m| m.start());
    Some(rest[..end].trim().to_string())
}

/// Line-based split used when either header is missing.
///
/// A line mentioning "backend" and "spec" switches to the backend bucket, one
/// mentioning "frontend" and "spec" to the frontend bucket. Marker lines are
/// dropped, as are lines before the first marker and blank lines.
fn split_by_lines(text: &str) -> (String, String) {
    #[derive(Clone, Copy, PartialEq)]
    enum Bucket {
        None,
        Backend,
        Frontend,
    }

    let mut current = Bucket::None;
    let mut backend = Vec::new();
    let mut frontend = Vec::new();

    for line in text.lines() {
        let lower = line.to_lowercase();
        if lower.contains("backend") && lower.contains("spec") {
            current = Bucket::Backend;
            continue;
        }
        if lower.contains("frontend") && lower.contains("spec") {
            current = Bucket::Frontend;
            continue;
        }
        if line.trim().is_empty() {
            continue;
        }
        match current {
            Bucket::Backend => backend.push(line),
            Bucket::Frontend => frontend.push(line),
            Bucket::None => {}
        }
    }

    (
        backend.join("\n").trim().to_string(),
        frontend.join("\n").trim().to_string(),
    )
}

fn or_placeholder(section: String, placeholder: &str) -> String {
    if section.is_empty() {
        placeholder.to_string()
    } else {
        section
    }
}

/// Parse specification text. Never fails and never yields an empty part.
#[must_use]
pub fn parse_specification(text: &str) -> ParsedSpec {
    let (backend, frontend) = match (
        section(text, &BACKEND_HEADER_RE),
        section(text, &FRONTEND_HEADER_RE),
    ) {
        (Some(backend), Some(frontend)) => (backend, frontend),
        _ => split_by_lines(text),
    };

    ParsedSpec {
        backend: or_placeholder(backend, BACKEND_PLACEHOLDER),
        frontend: or_placeholder(frontend, FRONTEND_PLACEHOLDER),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marked_sections() {
        let text = "Intro\n---\n### BACKEND_SPEC\nUse FastAPI\nPostgres\n---\n\
                    ### FRONTEND_SPEC\nReact + TS\n---\n";
        let parsed = parse_specification(text);
        assert_eq!(parsed.backend, "Use FastAPI\nPostgres");
        assert_eq!(parsed.frontend, "React + TS");
    }

    #[test]
    fn test_section_ends_at_next_heading() {
        let text = "### BACKEND_SPEC\nAPI\n### FRONTEND_SPEC\nUI\n### Notes\nignored\n";
        let parsed = parse_specification(text);
        assert_eq!(parsed.backend, "API");
        assert_eq!(parsed.frontend, "UI");
    }

    #[test]
    fn test_headers_are_case_insensitive() {
        let text = "### backend_spec\nAPI\n---\n### Frontend_Spec\nUI";
        let parsed = parse_specification(text);
        assert_eq!(parsed.backend, "API");
        assert_eq!(parsed.frontend, "UI");
    }

    #[test]
    fn test_line_fallback() {
        let text = "Overview of the app\nBackend spec:\nREST API\n\nFrontend spec:\nReact app\nRouting";
        let parsed = parse_specification(text);
        assert_eq!(parsed.backend, "REST API");
        assert_eq!(parsed.frontend, "React app\nRouting");
    }

    #[test]
    fn test_line_fallback_needs_spec_keyword() {
        let text = "Backend spec\nThe backend talks to the frontend\nmore";
        let parsed = parse_specification(text);
        assert_eq!(parsed.backend, "The backend talks to the frontend\nmore");
        assert_eq!(parsed.frontend, FRONTEND_PLACEHOLDER);
    }

    #[test]
    fn test_only_one_header_uses_line_fallback() {
        let text = "### BACKEND_SPEC\nAPI routes\n";
        let parsed = parse_specification(text);
        assert_eq!(parsed.backend, "API routes");
        assert_eq!(parsed.frontend, FRONTEND_PLACEHOLDER);
    }

    #[test]
    fn test_empty_sections_get_placeholders() {
        let parsed = parse_specification("### BACKEND_SPEC\n---\n### FRONTEND_SPEC\n---\n");
        assert_eq!(parsed.backend, BACKEND_PLACEHOLDER);
        assert_eq!(parsed.frontend, FRONTEND_PLACEHOLDER);

        let parsed = parse_specification("");
        assert_eq!(parsed.backend, BACKEND_PLACEHOLDER);
        assert_eq!(parsed.frontend, FRONTEND_PLACEHOLDER);
    }
}
