//! Implementation of `shipyard compile`.

use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};

use crate::ops::check_tool;
use crate::process::{ExecutionRequest, OutputMode, Session};
use crate::util::diagnostic::{self, suggestions, Diagnostic};
use crate::util::platform::validate_platform;
use crate::util::process::find_make;

/// Options for the compile command.
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Build tree generated by `shipyard generate`
    pub output: PathBuf,

    /// Make target (default: the Makefile's default target)
    pub target: Option<String>,

    /// Explicit make executable
    pub make: Option<PathBuf>,
}

/// Build the make argument list (everything after the program).
pub fn make_args(target: Option<&str>) -> Vec<String> {
    let mut args = vec!["VERBOSE=1".to_string()];
    if let Some(target) = target {
        args.push(target.to_string());
    }
    args
}

/// Warning for a build tree that has no `Makefile` yet.
fn missing_makefile(output: &Path) -> Option<Diagnostic> {
    let makefile = output.join("Makefile");
    if makefile.exists() {
        return None;
    }
    Some(
        Diagnostic::warning("no Makefile in the build tree")
            .with_location(makefile)
            .with_suggestion(suggestions::NOT_GENERATED),
    )
}

/// Run make in the build tree.
///
/// Both streams are buffered. stderr is printed afterwards; stdout only
/// when make fails.
pub fn compile(opts: &CompileOptions) -> Result<()> {
    validate_platform()?;

    if !opts.output.is_dir() {
        bail!(
            "build tree `{}` does not exist\nhelp: {}",
            opts.output.display(),
            suggestions::NOT_GENERATED
        );
    }
    if let Some(warning) = missing_makefile(&opts.output) {
        diagnostic::emit(&warning, std::io::stderr().is_terminal());
    }

    let make = opts
        .make
        .clone()
        .or_else(find_make)
        .unwrap_or_else(|| PathBuf::from("make"));

    let request = ExecutionRequest::new(make)
        .args(make_args(opts.target.as_deref()))
        .cwd(&opts.output)
        .output(OutputMode::buffered());

    let report = Session::new(request).execute()?;
    let report = check_tool(report, "make")?;
    tracing::debug!(elapsed = ?report.elapsed(), "make finished");
    Ok(())
}
