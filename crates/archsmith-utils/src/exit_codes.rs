//! Exit code constants for archsmith.
//!
//! # Exit Code Table
//!
//! | Code | Constant | Description |
//! |------|----------|-------------|
//! | 0 | `SUCCESS` | Every run completed |
//! | 1 | `INTERNAL` | General/internal failure |
//! | 2 | `CLI_ARGS` | Invalid CLI arguments, configuration, or missing credentials |
//! | 3 | `WORKFLOW_FAILED` | At least one workflow run ended with `status=failed` |
//! | 10 | `STAGE_TIMEOUT` | A model call exceeded the stage timeout |
//! | 70 | `LLM_FAILURE` | The model provider rejected or failed a call |

/// Exit codes matching the documented exit code table.
///
/// Use the named constants, or [`as_i32()`](Self::as_i32) to get the numeric
/// value for `std::process::exit()`.
///
/// ```rust
/// use archsmith_utils::exit_codes::ExitCode;
///
/// assert_eq!(ExitCode::SUCCESS.as_i32(), 0);
/// assert_eq!(ExitCode::WORKFLOW_FAILED, ExitCode::from_i32(3));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(i32);

impl ExitCode {
    /// Success - every requested run completed
    pub const SUCCESS: ExitCode = ExitCode(0);

    /// Internal error - general failure
    pub const INTERNAL: ExitCode = ExitCode(1);

    /// CLI arguments error - invalid arguments, configuration, or credentials
    pub const CLI_ARGS: ExitCode = ExitCode(2);

    /// Workflow failed - a run ended with a failed status record
    pub const WORKFLOW_FAILED: ExitCode = ExitCode(3);

    /// Stage timeout - a model call exceeded the configured timeout
    pub const STAGE_TIMEOUT: ExitCode = ExitCode(10);

    /// LLM failure - the provider rejected or failed the call
    pub const LLM_FAILURE: ExitCode = ExitCode(70);

    /// Get the numeric exit code value.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }

    /// Create an ExitCode from a raw i32 value.
    ///
    /// Prefer using the named constants when possible.
    #[must_use]
    pub const fn from_i32(code: i32) -> Self {
        ExitCode(code)
    }
}

impl From<i32> for ExitCode {
    fn from(code: i32) -> Self {
        ExitCode(code)
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.0
    }
}
