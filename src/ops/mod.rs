//! High-level operations.
//!
//! This module contains the implementation of Shipyard commands. Each one
//! builds an [`ExecutionRequest`](crate::process::ExecutionRequest) and runs
//! it through a supervised [`Session`](crate::process::Session).

pub mod compile;
pub mod generate;
pub mod test;

use anyhow::{bail, Context, Result};

use crate::process::{ExecutionOutcome, SessionReport};

pub use compile::{compile, make_args, CompileOptions};
pub use generate::{cmake_args, generate, GenerateOptions, DEFAULT_GENERATOR};
pub use test::{
    result_files, run_test, timeout_from_secs, TestOptions, DEFAULT_RESULTS_DIR, DEFAULT_TIMEOUT,
};

/// Fail unless a build tool exited with code 0.
fn check_tool(report: SessionReport, tool: &str) -> Result<SessionReport> {
    if let ExecutionOutcome::Completed(code) = report.outcome() {
        if *code != 0 {
            bail!("{} failed with error code {}", tool, code);
        }
    }
    report
        .into_result()
        .with_context(|| format!("error executing {}", tool))
}
