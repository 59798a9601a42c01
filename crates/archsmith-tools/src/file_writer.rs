//! Sandboxed file writer used by the generation agents.
//!
//! Every write is resolved against the output root through [`SandboxRoot`],
//! so model-supplied paths cannot escape it, and lands atomically.

use archsmith_utils::atomic_write::write_file_atomic;
use archsmith_utils::paths::{SandboxRoot, ensure_dir_all};
use camino::Utf8Path;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::Tool;

pub const FILE_WRITER_TOOL: &str = "file_writer";

fn default_overwrite() -> bool {
    true
}

/// Arguments of one write.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct WriteRequest {
    pub file_path: String,
    #[serde(default)]
    pub content: String,
    #[serde(default = "default_overwrite")]
    pub overwrite: bool,
    #[serde(default)]
    pub subfolder: String,
}

impl WriteRequest {
    pub fn new(file_path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            content: content.into(),
            overwrite: true,
            subfolder: String::new(),
        }
    }

    #[must_use]
    pub fn in_subfolder(mut self, subfolder: impl Into<String>) -> Self {
        self.subfolder = subfolder.into();
        self
    }

    #[must_use]
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }
}

/// Structured result of a write; failures are data, not errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subfolder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WriteOutcome {
    fn failure(error: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            path: path.into(),
            ..Self::default()
        }
    }
}

fn trim_slashes(s: &str) -> &str {
    s.trim().trim_matches(|c| c == '/' || c == '\\')
}

/// Segments of a slash-separated path, with `\` treated as `/` and empty parts dropped.
fn segments(path: &str) -> Vec<&str> {
    path.split(['/', '\\']).filter(|s| !s.is_empty()).collect()
}

/// Drop a leading copy of `subfolder` from `file_path`, comparing whole segments.
///
/// `backend/app/main.py` under `backend` becomes `app/main.py`, while
/// `backend_utils/x.py` is left alone.
pub fn strip_subfolder_prefix(file_path: &str, subfolder: &str) -> String {
    let file_segments = segments(file_path);
    let sub_segments = segments(subfolder);

    if !sub_segments.is_empty()
        && file_segments.len() > sub_segments.len()
        && file_segments[..sub_segments.len()] == sub_segments[..]
    {
        file_segments[sub_segments.len()..].join("/")
    } else {
        file_segments.join("/")
    }
}

/// Writes generated files below an output root.
#[derive(Debug, Clone)]
pub struct FileWriter {
    output_root: PathBuf,
}

impl FileWriter {
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
        }
    }

    #[must_use]
    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Write one file. Never returns an error; failures come back in the outcome.
    pub fn write(&self, request: &WriteRequest) -> WriteOutcome {
        let raw_path = request.file_path.trim();
        if raw_path.is_empty() {
            return WriteOutcome::failure("File path cannot be empty", "");
        }

        let subfolder = segments(trim_slashes(&request.subfolder)).join("/");
        let file_path = strip_subfolder_prefix(raw_path, &subfolder);
        if file_path.is_empty() {
            return WriteOutcome::failure(
                format!("File path '{raw_path}' does not name a file"),
                raw_path,
            );
        }

        let relative = if subfolder.is_empty() {
            file_path.clone()
        } else {
            format!("{subfolder}/{file_path}")
        };

        if let Err(e) = ensure_dir_all(&self.output_root) {
            return WriteOutcome::failure(
                format!("Failed to write file {file_path}: {e}"),
                relative,
            );
        }

        let sandbox = match SandboxRoot::new_default(&self.output_root) {
            Ok(sandbox) => sandbox,
            Err(e) => {
                return WriteOutcome::failure(
                    format!("Failed to write file {file_path}: {e}"),
                    relative,
                );
            }
        };

        let target = match sandbox.join(&relative) {
            Ok(target) => target,
            Err(e) => {
                warn!(path = %relative, error = %e, "Rejected file write outside output root");
                return WriteOutcome::failure(
                    format!("Failed to write file {file_path}: {e}"),
                    relative,
                );
            }
        };
        let full_path = target.as_path().display().to_string();

        if target.as_path().is_dir() {
            return WriteOutcome::failure(
                format!("Failed to write file {file_path}: path is a directory"),
                full_path,
            );
        }

        if target.as_path().exists() && !request.overwrite {
            return WriteOutcome::failure(
                format!("File {file_path} already exists and overwrite is false"),
                full_path,
            );
        }

        let Some(utf8_path) = Utf8Path::from_path(target.as_path()) else {
            return WriteOutcome::failure(
                format!("Failed to write file {file_path}: path is not valid UTF-8"),
                full_path,
            );
        };

        match write_file_atomic(utf8_path, &request.content) {
            Ok(result) => {
                debug!(
                    path = %target.relative_display(),
                    bytes = result.bytes_written,
                    "Wrote generated file"
                );
                let directory = if subfolder.is_empty() {
                    sandbox.as_path().to_path_buf()
                } else {
                    sandbox.as_path().join(&subfolder)
                };
                WriteOutcome {
                    success: true,
                    message: Some(format!("Successfully wrote file: {file_path}")),
                    path: full_path,
                    relative_path: Some(target.relative_display()),
                    file_size: Some(result.bytes_written),
                    subfolder: Some(subfolder),
                    directory: Some(directory.display().to_string()),
                    error: None,
                }
            }
            Err(e) => WriteOutcome::failure(
                format!("Failed to write file {file_path}: {e:#}"),
                full_path,
            ),
        }
    }
}

impl Tool for FileWriter {
    fn name(&self) -> &'static str {
        FILE_WRITER_TOOL
    }

    fn description(&self) -> &'static str {
        "Writes a code file below the project output directory, creating folders as needed. \
         Use subfolder 'backend' or 'frontend' and a file_path relative to it."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "File path relative to the subfolder, e.g. app/main.py"
                },
                "content": {
                    "type": "string",
                    "description": "Complete file content"
                },
                "overwrite": {
                    "type": "boolean",
                    "description": "Replace an existing file; true when omitted"
                },
                "subfolder": {
                    "type": "string",
                    "description": "Top-level folder such as backend or frontend"
                }
            },
            "required": ["file_path", "content"]
        })
    }

    fn invoke(&self, args: &Value) -> Value {
        let outcome = match serde_json::from_value::<WriteRequest>(args.clone()) {
            Ok(request) => self.write(&request),
            Err(e) => WriteOutcome::failure(format!("Invalid arguments for {FILE_WRITER_TOOL}: {e}"), ""),
        };
        serde_json::to_value(&outcome).unwrap_or_else(|e| {
            json!({"success": false, "error": format!("Failed to encode result: {e}")})
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn writer() -> (TempDir, FileWriter) {
        let temp = TempDir::new().unwrap();
        let writer = FileWriter::new(temp.path().join("output"));
        (temp, writer)
    }

    #[test]
    fn test_subfolder_segment_is_not_duplicated() {
        let (_temp, writer) = writer();
        let outcome = writer.write(
            &WriteRequest::new("backend/app/main.py", "print('hi')\n").in_subfolder("backend"),
        );

        assert!(outcome.success, "{outcome:?}");
        assert_eq!(outcome.relative_path.as_deref(), Some("backend/app/main.py"));
        let on_disk = writer.output_root().join("backend/app/main.py");
        assert_eq!(fs::read_to_string(on_disk).unwrap(), "print('hi')\n");
        assert!(!writer.output_root().join("backend/backend").exists());
    }

    #[test]
    fn test_subfolder_match_is_whole_segment() {
        assert_eq!(
            strip_subfolder_prefix("backend_utils/x.py", "backend"),
            "backend_utils/x.py"
        );
        assert_eq!(strip_subfolder_prefix("/frontend/src/App.tsx", "frontend"), "src/App.tsx");
        assert_eq!(strip_subfolder_prefix("src\\App.tsx", ""), "src/App.tsx");
    }

    #[test]
    fn test_subfolder_slashes_are_stripped() {
        let (_temp, writer) = writer();
        let outcome =
            writer.write(&WriteRequest::new("src/App.tsx", "export {}\n").in_subfolder("/frontend/"));

        assert!(outcome.success);
        assert_eq!(outcome.subfolder.as_deref(), Some("frontend"));
        assert!(writer.output_root().join("frontend/src/App.tsx").is_file());
    }

    #[test]
    fn test_empty_path_is_rejected() {
        let (_temp, writer) = writer();
        let outcome = writer.write(&WriteRequest::new("   ", "x"));

        assert!(!outcome.success);
        assert_eq!(outcome.error.as_deref(), Some("File path cannot be empty"));
        assert_eq!(outcome.path, "");
    }

    #[test]
    fn test_overwrite_false_keeps_existing_file() {
        let (_temp, writer) = writer();
        assert!(writer.write(&WriteRequest::new("a.txt", "first")).success);

        let outcome = writer.write(&WriteRequest::new("a.txt", "second").overwrite(false));
        assert!(!outcome.success);
        assert!(outcome.error.unwrap().contains("already exists"));
        assert_eq!(
            fs::read_to_string(writer.output_root().join("a.txt")).unwrap(),
            "first"
        );

        assert!(writer.write(&WriteRequest::new("a.txt", "second")).success);
        assert_eq!(
            fs::read_to_string(writer.output_root().join("a.txt")).unwrap(),
            "second"
        );
    }

    #[test]
    fn test_traversal_is_rejected() {
        let (temp, writer) = writer();
        let outcome = writer.write(&WriteRequest::new("../escape.txt", "x"));

        assert!(!outcome.success);
        assert!(!temp.path().join("escape.txt").exists());
    }

    #[test]
    fn test_leading_slash_is_relative_to_root() {
        let (_temp, writer) = writer();
        let outcome = writer.write(&WriteRequest::new("/etc/app.conf", "x"));

        assert!(outcome.success);
        assert!(writer.output_root().join("etc/app.conf").is_file());
    }

    #[test]
    fn test_file_size_counts_bytes() {
        let (_temp, writer) = writer();
        let outcome = writer.write(&WriteRequest::new("u.txt", "héllo"));
        assert_eq!(outcome.file_size, Some(6));
    }

    #[test]
    fn test_crlf_content_is_written_verbatim() {
        let (_temp, writer) = writer();
        let content = "line one\r\nline two\r\n";

        let outcome = writer.write(&WriteRequest::new("win.txt", content));

        let on_disk = std::fs::read(writer.output_root().join("win.txt")).unwrap();
        assert_eq!(on_disk, content.as_bytes());
        assert_eq!(outcome.file_size, Some(on_disk.len() as u64));
    }

    #[test]
    fn test_tool_invoke_reports_bad_arguments() {
        let (_temp, writer) = writer();
        let result = writer.invoke(&json!({"content": "no path"}));

        assert_eq!(result["success"], false);
        assert!(result["error"].as_str().unwrap().contains("file_path"));
    }

    #[test]
    fn test_tool_invoke_defaults_overwrite_and_subfolder() {
        let (_temp, writer) = writer();
        let result = writer.invoke(&json!({"file_path": "README.md", "content": "# Hi"}));

        assert_eq!(result["success"], true);
        assert_eq!(result["relative_path"], "README.md");
    }

    mod prefix_properties {
        use super::super::strip_subfolder_prefix;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_prefixed_path_loses_exactly_one_copy(
                sub in "[a-z]{1,8}(/[a-z]{1,8}){0,2}",
                rest in "[a-z_]{1,8}(/[a-z_]{1,8}){0,3}\\.py",
            ) {
                let prefixed = format!("{sub}/{rest}");
                prop_assert_eq!(strip_subfolder_prefix(&prefixed, &sub), rest.clone());
                prop_assert_eq!(strip_subfolder_prefix(&rest, ""), rest);
            }
        }
    }
}
