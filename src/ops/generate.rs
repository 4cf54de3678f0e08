//! Implementation of `shipyard generate`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::ops::check_tool;
use crate::process::{ExecutionRequest, OutputMode, Session, StreamSink};
use crate::util::fs::{ensure_dir, validate_params};
use crate::util::platform::validate_platform;
use crate::util::process::find_cmake;

/// Generator passed to `cmake -G` unless configured otherwise.
pub const DEFAULT_GENERATOR: &str = "Unix Makefiles";

/// Options for the generate command.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Directory holding the top-level CMakeLists.txt
    pub source: PathBuf,

    /// Build tree directory (created if missing)
    pub output: PathBuf,

    /// Environment overrides for CMake
    pub env: BTreeMap<String, String>,

    /// Cache variables passed as `-D`
    pub vars: BTreeMap<String, String>,

    /// CMake generator (default: [`DEFAULT_GENERATOR`])
    pub generator: Option<String>,

    /// Explicit cmake executable
    pub cmake: Option<PathBuf>,
}

/// Build the CMake argument list (everything after the program).
///
/// A variable with an empty value is passed as a bare `-D<NAME>`.
pub fn cmake_args(source: &Path, vars: &BTreeMap<String, String>, generator: &str) -> Vec<String> {
    let mut args = vec![source.display().to_string()];
    for (name, value) in vars {
        if value.is_empty() {
            args.push(format!("-D{}", name));
        } else {
            args.push(format!("-D{}={}", name, value));
        }
    }
    args.push("-G".to_string());
    args.push(generator.to_string());
    args
}

/// Run CMake to generate a build tree in `opts.output`.
///
/// CMake output is streamed to the console as it arrives.
pub fn generate(opts: &GenerateOptions) -> Result<()> {
    validate_platform()?;
    validate_params(&opts.output, &opts.source)?;
    ensure_dir(&opts.output)?;

    let source = std::path::absolute(&opts.source)
        .with_context(|| format!("invalid source directory: {}", opts.source.display()))?;
    let generator = opts.generator.as_deref().unwrap_or(DEFAULT_GENERATOR);
    let cmake = opts
        .cmake
        .clone()
        .or_else(find_cmake)
        .unwrap_or_else(|| PathBuf::from("cmake"));

    let request = ExecutionRequest::new(cmake)
        .args(cmake_args(&source, &opts.vars, generator))
        .envs(&opts.env)
        .cwd(&opts.output)
        .output(OutputMode::Merged(StreamSink::Console));

    tracing::info!("Running {}", request.quoted_command());

    let report = Session::new(request).execute()?;
    check_tool(report, "CMake")?;
    Ok(())
}
