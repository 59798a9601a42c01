//! CLI argument definitions and parsing structures

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// archsmith - turns a project brief into a generated backend and frontend
#[derive(Parser, Debug)]
#[command(name = "archsmith")]
#[command(about = "Multi-agent pipeline that turns a project brief into a software skeleton")]
#[command(long_about = r#"
archsmith runs a brief through five agent stages: specification, backend
generation, frontend generation, integration review and completion review.
Generated files land under the output directory in backend/ and frontend/.

EXAMPLES:
  # Generate a project from a brief
  archsmith run "A recipe sharing site with user accounts and ratings"

  # Several briefs, one after another
  archsmith run --brief-file briefs/shop.txt --brief-file briefs/blog.txt

  # The built-in food delivery example without pauses between stages
  archsmith run --example --no-delay

  # Analyze what is in the output directory
  archsmith scan

  # Lint one generated file
  archsmith lint output/backend/main.py

  # Show the effective configuration and where each value came from
  archsmith config

CONFIGURATION:
  Precedence: CLI flags > environment > config file > defaults
  The config file is found by searching upward from the current directory
  for .archsmith/config.toml. A .env file in the current directory is loaded.

CREDENTIALS:
  gemini      GEMINI_API_KEY      (https://aistudio.google.com/app/apikey)
  openrouter  OPENROUTER_API_KEY
"#)]
#[command(version)]
pub struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory that receives the generated project
    #[arg(long, global = true)]
    pub output_dir: Option<String>,

    /// LLM provider: gemini or openrouter
    #[arg(long, global = true)]
    pub provider: Option<String>,

    /// Model for the selected provider
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Do not pause between stages
    #[arg(long, global = true)]
    pub no_delay: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full pipeline for one or more project briefs
    Run {
        /// Project briefs, each run separately
        briefs: Vec<String>,

        /// Read a brief from a file (repeatable)
        #[arg(long = "brief-file", value_name = "PATH")]
        brief_files: Vec<PathBuf>,

        /// Run the built-in food delivery example brief
        #[arg(long)]
        example: bool,

        /// Print results as JSON instead of the summary block
        #[arg(long)]
        json: bool,

        /// Keep existing files in the output directory
        #[arg(long)]
        no_clean: bool,
    },

    /// Analyze the generated project in the output directory
    Scan {
        /// Print the full structure as JSON
        #[arg(long)]
        json: bool,
    },

    /// Lint one source file
    Lint {
        /// File to lint
        file: PathBuf,

        /// Language; inferred from the file extension when omitted
        #[arg(long)]
        language: Option<String>,
    },

    /// Show the effective configuration with value sources
    Config {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Commands {
    /// Short name used in error reports.
    #[must_use]
    pub fn operation(&self) -> &'static str {
        match self {
            Commands::Run { .. } => "run",
            Commands::Scan { .. } => "scan",
            Commands::Lint { .. } => "lint",
            Commands::Config { .. } => "config",
        }
    }
}
