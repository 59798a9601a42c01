//! Tracing setup and structured stage logging.
//!
//! Every stage emits a start line, then either a completion line with its
//! duration or an error line. Error text passes through
//! [`redact_secrets`](crate::redaction::redact_secrets) before it is logged.

use tracing::{Level, error, info, span};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::redaction::redact_secrets;

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` wins when set. Otherwise verbose mode logs archsmith at debug
/// level with targets and span timings; normal mode logs archsmith at info.
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init_tracing(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| {
            if verbose {
                EnvFilter::try_new("archsmith=debug,info")
            } else {
                EnvFilter::try_new("archsmith=info,warn")
            }
        })
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if verbose {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_thread_names(false)
                    .with_line_number(false)
                    .with_file(false)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_thread_names(false)
                    .with_line_number(false)
                    .with_file(false)
                    .compact(),
            )
            .try_init()?;
    }

    Ok(())
}

/// Span wrapping one stage of one run.
pub fn stage_span(run_id: &str, stage: &str) -> tracing::Span {
    span!(
        Level::INFO,
        "stage_execution",
        run_id = %run_id,
        stage = %stage,
    )
}

pub fn log_stage_start(run_id: &str, stage: &str) {
    info!(
        run_id = %run_id,
        stage = %stage,
        "Starting stage"
    );
}

pub fn log_stage_complete(run_id: &str, stage: &str, duration_ms: u128) {
    info!(
        run_id = %run_id,
        stage = %stage,
        duration_ms = %duration_ms,
        "Stage completed"
    );
}

/// Log a stage failure. The error text is redacted first.
pub fn log_stage_error(run_id: &str, stage: &str, error: &str, duration_ms: u128) {
    let sanitized_error = redact_secrets(error);

    error!(
        run_id = %run_id,
        stage = %stage,
        duration_ms = %duration_ms,
        error = %sanitized_error,
        "Stage failed"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_helpers_without_subscriber() {
        // No subscriber installed: these must be no-ops, not panics.
        let span = stage_span("run-1", "backend");
        let _guard = span.enter();
        log_stage_start("run-1", "backend");
        log_stage_complete("run-1", "backend", 12);
        log_stage_error("run-1", "backend", "key=abc", 3);
    }

    #[test]
    fn test_init_tracing_twice_reports_error() {
        let _ = init_tracing(false);
        assert!(init_tracing(true).is_err());
    }
}
