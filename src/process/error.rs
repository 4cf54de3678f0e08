//! Errors raised by supervised executions.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::util::diagnostic::{suggestions, Diagnostic};

/// Failure of a supervised execution.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("failed to launch `{program}`: {message}")]
    Launch { program: String, message: String },

    #[error("`{program}` failed with exit code {code}")]
    NonZeroExit { program: String, code: i32 },

    #[error("`{program}` timed out after {} seconds", .timeout.as_secs())]
    TimedOut { program: String, timeout: Duration },

    #[error("interrupted while waiting for `{program}`: {message}")]
    WaitInterrupted { program: String, message: String },

    #[error("failed to create results directory `{}`", .path.display())]
    ResultsDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to open output file `{}`", .path.display())]
    OutputFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write status file `{}`", .path.display())]
    StatusWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ExecError {
    /// Exit code of the external process, if it ran to completion.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            ExecError::NonZeroExit { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.to_string());
        match self {
            ExecError::Launch { program, .. } => diag
                .with_suggestion(format!("Check that `{}` exists and is executable", program))
                .with_suggestion(suggestions::TOOL_NOT_FOUND),
            ExecError::NonZeroExit { .. } => diag
                .with_context("captured output has been printed above or saved to the results directory"),
            ExecError::TimedOut { timeout, .. } => diag
                .with_context("the process group was killed")
                .with_context(format!("limit was {}s", timeout.as_secs()))
                .with_suggestion(suggestions::RAISE_TIMEOUT),
            ExecError::WaitInterrupted { .. } => {
                diag.with_context("the outcome is unknown and treated as a failure")
            }
            ExecError::ResultsDir { path, .. }
            | ExecError::OutputFile { path, .. }
            | ExecError::StatusWrite { path, .. } => diag.with_location(path.clone()),
        }
    }
}
