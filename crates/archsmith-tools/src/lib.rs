//! Tools the generation agents can call.
//!
//! A tool takes JSON arguments and returns a JSON result. Tools never fail:
//! bad arguments and I/O problems come back as structured error results so
//! the model can correct itself.

pub mod code_linter;
pub mod file_writer;

pub use code_linter::{CODE_LINTER_TOOL, CodeLinter, LintReport, language_for_extension};
pub use file_writer::{FILE_WRITER_TOOL, FileWriter, WriteOutcome, WriteRequest};

use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

/// A callable tool with a JSON-schema argument description.
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// JSON schema of the arguments object.
    fn parameters_schema(&self) -> Value;

    fn invoke(&self, args: &Value) -> Value;
}

/// Tools available to a run, keyed by name.
#[derive(Clone, Default)]
pub struct Toolbox {
    tools: BTreeMap<&'static str, Arc<dyn Tool>>,
}

impl Toolbox {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// File writer rooted at `output_root` plus the code linter.
    #[must_use]
    pub fn standard(output_root: impl Into<PathBuf>) -> Self {
        Self::new()
            .with(FileWriter::new(output_root))
            .with(CodeLinter::new())
    }

    #[must_use]
    pub fn with(mut self, tool: impl Tool + 'static) -> Self {
        self.tools.insert(tool.name(), Arc::new(tool));
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.tools.keys().copied()
    }
}

impl std::fmt::Debug for Toolbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.tools.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_standard_toolbox_has_both_tools() {
        let temp = TempDir::new().unwrap();
        let toolbox = Toolbox::standard(temp.path());

        assert_eq!(
            toolbox.names().collect::<Vec<_>>(),
            vec![CODE_LINTER_TOOL, FILE_WRITER_TOOL]
        );
        assert!(toolbox.get("shell").is_none());
    }

    #[test]
    fn test_toolbox_dispatch_writes_under_root() {
        let temp = TempDir::new().unwrap();
        let toolbox = Toolbox::standard(temp.path());

        let writer = toolbox.get(FILE_WRITER_TOOL).unwrap();
        let result = writer.invoke(&json!({
            "file_path": "app/main.py",
            "content": "print(1)\n",
            "subfolder": "backend"
        }));

        assert_eq!(result["success"], true);
        assert!(temp.path().join("backend/app/main.py").is_file());
    }

    #[test]
    fn test_schemas_declare_required_arguments() {
        let temp = TempDir::new().unwrap();
        let toolbox = Toolbox::standard(temp.path());

        for name in toolbox.names() {
            let schema = toolbox.get(name).unwrap().parameters_schema();
            assert_eq!(schema["type"], "object");
            assert!(schema["required"].as_array().is_some_and(|r| !r.is_empty()));
        }
    }
}
