//! Shipyard - a supervised driver for native CMake builds and tests
//!
//! This crate provides the core library functionality for Shipyard:
//! supervised subprocess execution with concurrent output draining,
//! timeouts and status files, and the generate/compile/test operations
//! built on top of it.

pub mod ops;
pub mod process;
pub mod util;

/// Test utilities for Shipyard unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides shell-script fixtures and fake build tools.
#[cfg(test)]
pub mod test_support;

pub use process::{ExecError, ExecutionOutcome, ExecutionRequest, Session, SessionReport, Status};
pub use util::config::Config;
