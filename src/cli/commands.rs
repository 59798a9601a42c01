//! Command implementations for the archsmith CLI

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::{
    ArchitectError, ArchitectWorkflow, CodeLinter, Config, ExitCode, FinalResult,
    FixedDelayPolicy, LlmAgentRunner, ProjectScanner, ProjectStructure, Toolbox, render_summary,
};
use archsmith_tools::language_for_extension;
use archsmith_utils::paths::ensure_dir_all;
use tracing::{debug, info};

/// Brief used by `run --example`.
pub(crate) const EXAMPLE_BRIEF: &str = "Create a comprehensive food delivery platform with \
restaurant listings, menu management, order processing, and real-time order tracking. The \
system should support multiple user roles (customer, restaurant owner, delivery driver, admin) \
with complete order lifecycle management from browsing to delivery.";

/// Collect briefs from positional arguments, files and the example flag, in that order.
pub(crate) fn collect_briefs(
    briefs: &[String],
    brief_files: &[PathBuf],
    example: bool,
) -> Result<Vec<String>> {
    let mut collected: Vec<String> = briefs
        .iter()
        .map(|b| b.trim().to_string())
        .filter(|b| !b.is_empty())
        .collect();

    for path in brief_files {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read brief file: {}", path.display()))?;
        let text = text.trim();
        if !text.is_empty() {
            collected.push(text.to_string());
        }
    }

    if example {
        collected.push(EXAMPLE_BRIEF.to_string());
    }

    Ok(collected)
}

/// Empty the output directory, leaving it in place.
pub(crate) fn clean_output_dir(output_dir: &Path) -> Result<()> {
    if output_dir.exists() {
        debug!(path = %output_dir.display(), "Cleaning output directory");
        fs::remove_dir_all(output_dir).with_context(|| {
            format!("Failed to clean output directory: {}", output_dir.display())
        })?;
    }
    ensure_dir_all(output_dir).with_context(|| {
        format!("Failed to create output directory: {}", output_dir.display())
    })?;
    Ok(())
}

/// Execute the full pipeline once per brief.
pub async fn execute_run_command(
    briefs: &[String],
    brief_files: &[PathBuf],
    example: bool,
    json: bool,
    config: &Config,
) -> Result<ExitCode> {
    let briefs = collect_briefs(briefs, brief_files, example)?;
    if briefs.is_empty() {
        eprintln!("✗ No project brief given");
        eprintln!("  Pass a brief as an argument, use --brief-file PATH, or try --example");
        return Ok(ExitCode::CLI_ARGS);
    }

    // A missing credential surfaces here, before any directory is touched
    let backend = archsmith_llm::from_config(config).map_err(ArchitectError::from)?;

    let output_dir = config.output_dir();
    if config.clean_output() {
        clean_output_dir(&output_dir)?;
    }

    let runner = LlmAgentRunner::new(
        Arc::from(backend),
        Toolbox::standard(output_dir.clone()),
        config.stage_timeout(),
        config.max_tool_rounds(),
    );
    let workflow = ArchitectWorkflow::new(Arc::new(runner), output_dir.clone())
        .with_wait_policy(Arc::new(FixedDelayPolicy::from_config(config)));

    if !json {
        println!("archsmith: {} brief(s), output in {}", briefs.len(), output_dir.display());
        println!(
            "  provider: {} | model: {}",
            config.provider(),
            archsmith_llm::resolved_model(config)
        );
    }

    let mut results: Vec<FinalResult> = Vec::with_capacity(briefs.len());
    for (index, brief) in briefs.iter().enumerate() {
        if !json {
            println!("\n[{}/{}] {}", index + 1, briefs.len(), brief);
        }
        let result = workflow.execute(brief).await;
        info!(
            brief_index = index + 1,
            status = %result.status,
            health = %result.project_health,
            files = result.files_count,
            "Brief finished"
        );
        if !json {
            print_run_result(&result);
        }
        results.push(result);
    }

    if json {
        let rendered =
            serde_json::to_string_pretty(&results).context("Failed to serialize results")?;
        println!("{rendered}");
    }

    let failed = results.iter().filter(|r| !r.is_success()).count();
    if failed > 0 {
        if !json {
            eprintln!("\n✗ {failed} of {} run(s) failed", results.len());
        }
        return Ok(ExitCode::WORKFLOW_FAILED);
    }
    Ok(ExitCode::SUCCESS)
}

fn print_run_result(result: &FinalResult) {
    println!("{}", render_summary(result));
    if result.generated_files.is_empty() {
        println!("No files were generated.");
        return;
    }
    println!("Generated files:");
    for file in &result.generated_files {
        println!("  {file}");
    }
}

/// Analyze the output directory without running any stage.
pub fn execute_scan_command(json: bool, config: &Config) -> Result<ExitCode> {
    let output_dir = config.output_dir();
    let structure = ProjectScanner::new(&output_dir).scan();

    if json {
        let rendered =
            serde_json::to_string_pretty(&structure).context("Failed to serialize structure")?;
        println!("{rendered}");
    } else {
        println!("Project structure of {}", output_dir.display());
        print!("{}", format_structure(&structure));
    }
    Ok(ExitCode::SUCCESS)
}

/// Human-readable rendering of a scan.
pub(crate) fn format_structure(structure: &ProjectStructure) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "  Completeness: {}/100\n",
        structure.analysis.completeness_score
    ));

    for (label, side) in [("Backend", &structure.backend), ("Frontend", &structure.frontend)] {
        let placeholders = side.files.values().filter(|f| f.is_placeholder).count();
        out.push_str(&format!(
            "  {label}: {} file(s), {placeholders} placeholder(s)\n",
            side.files.len()
        ));
        for (category, files) in &side.categories {
            out.push_str(&format!("    {category}: {}\n", files.len()));
        }
    }

    if structure.analysis.missing_patterns.is_empty() {
        out.push_str("  Missing: none\n");
    } else {
        out.push_str("  Missing:\n");
        for pattern in &structure.analysis.missing_patterns {
            out.push_str(&format!("    - {pattern}\n"));
        }
    }
    out
}

/// Lint one file from disk.
pub fn execute_lint_command(file: &Path, language: Option<&str>) -> Result<ExitCode> {
    let code = fs::read_to_string(file)
        .with_context(|| format!("Failed to read file: {}", file.display()))?;

    let inferred;
    let language = match language {
        Some(language) => language,
        None => {
            inferred = file
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| language_for_extension(ext).to_string())
                .unwrap_or_default();
            inferred.as_str()
        }
    };

    let report = CodeLinter::new().lint(&code, language);
    let rendered = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
    println!("{rendered}");

    if report.valid_syntax {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::WORKFLOW_FAILED)
    }
}

/// Print the effective configuration with the source of each value.
pub fn execute_config_command(json: bool, config: &Config) -> Result<ExitCode> {
    let mut entries: Vec<(String, (String, String))> =
        config.effective_config().into_iter().collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    if json {
        let map: serde_json::Map<String, serde_json::Value> = entries
            .into_iter()
            .map(|(key, (value, source))| {
                (key, serde_json::json!({ "value": value, "source": source }))
            })
            .collect();
        let rendered = serde_json::to_string_pretty(&map).context("Failed to serialize config")?;
        println!("{rendered}");
        return Ok(ExitCode::SUCCESS);
    }

    println!("Effective configuration:");
    println!("========================");
    for (key, (value, source)) in entries {
        println!("  {key} = {value}  [{source}]");
    }
    Ok(ExitCode::SUCCESS)
}
