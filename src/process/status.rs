//! Durable status records for test-like executions.
//!
//! A status file holds exactly one line: `IN_PROGRESS`, `SUCCESS`,
//! `ERROR <code>` or `TIMED_OUT`. Every write replaces the whole file
//! through a rename, so readers never see a partial value.

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tempfile::NamedTempFile;

use crate::process::error::ExecError;

/// Lifecycle state of one execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    InProgress,
    Success,
    Error(i32),
    TimedOut,
}

impl Status {
    /// Whether this is one of the final states.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Status::InProgress)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Status::Success)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::InProgress => write!(f, "IN_PROGRESS"),
            Status::Success => write!(f, "SUCCESS"),
            Status::Error(code) => write!(f, "ERROR {}", code),
            Status::TimedOut => write!(f, "TIMED_OUT"),
        }
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "IN_PROGRESS" => Ok(Status::InProgress),
            "SUCCESS" => Ok(Status::Success),
            "TIMED_OUT" => Ok(Status::TimedOut),
            other => other
                .strip_prefix("ERROR ")
                .and_then(|code| code.trim().parse::<i32>().ok())
                .map(Status::Error)
                .ok_or_else(|| format!("invalid status '{}'", other)),
        }
    }
}

/// Writes `<dir>/<name>.status`.
#[derive(Debug, Clone)]
pub struct StatusRecorder {
    dir: PathBuf,
    name: String,
}

impl StatusRecorder {
    pub fn new(dir: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        StatusRecorder {
            dir: dir.into(),
            name: name.into(),
        }
    }

    /// Directory holding the status file.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the status file.
    pub fn path(&self) -> PathBuf {
        self.dir.join(format!("{}.status", self.name))
    }

    /// Replace the status file with `status`.
    pub fn write(&self, status: Status) -> Result<(), ExecError> {
        let path = self.path();
        let wrap = |source: std::io::Error| ExecError::StatusWrite {
            path: path.clone(),
            source,
        };

        // Same directory so the rename stays on one filesystem.
        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(wrap)?;
        writeln!(tmp, "{}", status).map_err(wrap)?;
        tmp.as_file().sync_all().map_err(wrap)?;
        tmp.persist(&path).map_err(|e| wrap(e.error))?;

        tracing::debug!(path = %path.display(), %status, "status recorded");
        Ok(())
    }

    /// Read the current status back.
    pub fn read(&self) -> anyhow::Result<Status> {
        read_status(&self.path())
    }
}

/// Parse a status file.
pub fn read_status(path: &Path) -> anyhow::Result<Status> {
    let contents = crate::util::fs::read_to_string(path)?;
    contents
        .parse::<Status>()
        .map_err(|e| anyhow::anyhow!("{}: {}", path.display(), e))
}
