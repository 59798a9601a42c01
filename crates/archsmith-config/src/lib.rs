//! Configuration for archsmith.
//!
//! Precedence: CLI > environment > `.archsmith/config.toml` > built-in defaults.

mod config;

pub use config::*;
