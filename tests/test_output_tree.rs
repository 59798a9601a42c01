//! File writer and scanner behavior on a real output tree

use archsmith::engine::ImplementationLevel;
use archsmith::{FileWriter, ProjectScanner, Toolbox, WriteRequest};
use serde_json::json;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_subfolder_prefix_is_not_doubled() {
    let temp = TempDir::new().unwrap();
    let writer = FileWriter::new(temp.path());

    let outcome = writer.write(
        &WriteRequest::new("backend/app/main.py", "print('hi')\n").in_subfolder("backend"),
    );

    assert!(outcome.success, "{outcome:?}");
    assert_eq!(outcome.relative_path.as_deref(), Some("backend/app/main.py"));
    assert!(temp.path().join("backend/app/main.py").is_file());
    assert!(!temp.path().join("backend/backend").exists());
}

#[test]
fn test_writes_outside_output_root_are_rejected() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("output");
    let writer = FileWriter::new(&root);

    let outcome = writer.write(&WriteRequest::new("../escape.txt", "x"));

    assert!(!outcome.success);
    assert!(outcome.error.is_some());
    assert!(!temp.path().join("escape.txt").exists());
}

#[test]
fn test_overwrite_false_keeps_existing_content() {
    let temp = TempDir::new().unwrap();
    let writer = FileWriter::new(temp.path());

    assert!(writer.write(&WriteRequest::new("notes.md", "first")).success);
    let second = writer.write(&WriteRequest::new("notes.md", "second").overwrite(false));

    assert!(!second.success);
    assert_eq!(
        fs::read_to_string(temp.path().join("notes.md")).unwrap(),
        "first"
    );
}

#[test]
fn test_toolbox_file_writer_takes_json_arguments() {
    let temp = TempDir::new().unwrap();
    let toolbox = Toolbox::standard(temp.path());

    let writer = toolbox.get("file_writer").unwrap();
    let result = writer.invoke(&json!({
        "file_path": "src/App.tsx",
        "content": "export default function App() { return null; }\n",
        "subfolder": "frontend",
    }));

    assert_eq!(result["success"], json!(true));
    assert!(temp.path().join("frontend/src/App.tsx").is_file());

    let linter = toolbox.get("code_linter").unwrap();
    let report = linter.invoke(&json!({ "code": "def f(:\n", "language": "python" }));
    assert_eq!(report["valid_syntax"], json!(false));
}

#[test]
fn test_scan_is_idempotent_and_categorizes() {
    let temp = TempDir::new().unwrap();
    let writer = FileWriter::new(temp.path());
    let files = [
        ("backend", "routes/orders.py", "from fastapi import APIRouter\nrouter = APIRouter()\n"),
        ("backend", "services/orders.py", "# TODO: implement\n"),
        ("frontend", "src/components/Cart.tsx", "export const Cart = () => null;\n"),
        ("frontend", "src/services/api.ts", ""),
    ];
    for (subfolder, path, content) in files {
        assert!(
            writer
                .write(&WriteRequest::new(path, content).in_subfolder(subfolder))
                .success
        );
    }
    fs::write(temp.path().join("README.md"), "# Generated\n").unwrap();

    let scanner = ProjectScanner::new(temp.path());
    let first = scanner.scan();
    let second = scanner.scan();
    assert_eq!(first, second);

    assert_eq!(first.backend.files.len(), 2);
    assert_eq!(first.frontend.files.len(), 2);
    assert!(
        first.backend.files["backend/services/orders.py"].is_placeholder,
        "TODO marker should count as placeholder"
    );
    assert_eq!(
        first.frontend.files["frontend/src/services/api.ts"].implementation_level,
        ImplementationLevel::Empty
    );
    assert!(first.analysis.completeness_score <= 100);

    // README.md is outside both sides but still listed
    assert!(scanner.list_files().contains(&"README.md".to_string()));
}

#[test]
fn test_scan_of_missing_root_is_empty() {
    let temp = TempDir::new().unwrap();
    let scanner = ProjectScanner::new(temp.path().join("nope"));

    assert!(scanner.list_files().is_empty());
    let structure = scanner.scan();
    assert!(structure.backend.files.is_empty());
    assert!(structure.frontend.files.is_empty());
    assert_eq!(structure.analysis.missing_patterns.len(), 5);
}
