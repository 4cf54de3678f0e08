//! How a supervised execution ended.

use std::fmt;
use std::process::ExitStatus;

use crate::process::status::Status;

/// Exit code recorded when waiting on the process failed.
pub const INTERRUPTED_EXIT_CODE: i32 = -1;

/// Result of one supervised execution. Exactly one variant holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    /// The process exited on its own with this code.
    Completed(i32),
    /// The timeout expired first and the process was killed.
    TimedOut,
    /// The process could not be started.
    LaunchFailed(String),
    /// Waiting for the process failed; its real outcome is unknown.
    WaitInterrupted(String),
}

impl ExecutionOutcome {
    /// The terminal status to record, or `None` if nothing ran.
    pub fn terminal_status(&self) -> Option<Status> {
        match self {
            ExecutionOutcome::Completed(0) => Some(Status::Success),
            ExecutionOutcome::Completed(code) => Some(Status::Error(*code)),
            ExecutionOutcome::TimedOut => Some(Status::TimedOut),
            ExecutionOutcome::WaitInterrupted(_) => Some(Status::Error(INTERRUPTED_EXIT_CODE)),
            ExecutionOutcome::LaunchFailed(_) => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionOutcome::Completed(0))
    }
}

impl fmt::Display for ExecutionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionOutcome::Completed(code) => write!(f, "exited with code {}", code),
            ExecutionOutcome::TimedOut => write!(f, "timed out"),
            ExecutionOutcome::LaunchFailed(cause) => write!(f, "failed to launch: {}", cause),
            ExecutionOutcome::WaitInterrupted(cause) => write!(f, "wait interrupted: {}", cause),
        }
    }
}

/// Numeric exit code of a finished process.
///
/// Processes killed by a signal report `128 + signal`, as a shell would.
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    INTERRUPTED_EXIT_CODE
}
