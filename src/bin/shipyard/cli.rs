//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

/// Shipyard - a supervised driver for native CMake builds and tests
#[derive(Parser)]
#[command(name = "shipyard")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run CMake to generate a build tree
    Generate(GenerateArgs),

    /// Run make in a generated build tree
    Compile(CompileArgs),

    /// Run a native test binary under a timeout
    Test(TestArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct GenerateArgs {
    /// Directory holding the top-level CMakeLists.txt [default: .]
    #[arg(long)]
    pub source: Option<PathBuf>,

    /// Build tree directory [default: target/native]
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Define a CMake cache variable (repeatable)
    #[arg(short = 'D', long = "define", value_name = "NAME[=VALUE]", value_parser = parse_define)]
    pub vars: Vec<(String, String)>,

    /// Set an environment variable for CMake (repeatable)
    #[arg(long, value_name = "KEY=VALUE", value_parser = parse_key_val)]
    pub env: Vec<(String, String)>,

    /// CMake generator [default: "Unix Makefiles"]
    #[arg(short = 'G', long)]
    pub generator: Option<String>,

    /// Path to the cmake executable
    #[arg(long, env = "SHIPYARD_CMAKE")]
    pub cmake: Option<PathBuf>,
}

#[derive(Args)]
pub struct CompileArgs {
    /// Make target (defaults to the Makefile's default target)
    pub target: Option<String>,

    /// Build tree directory [default: target/native]
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Path to the make executable
    #[arg(long, env = "SHIPYARD_MAKE")]
    pub make: Option<PathBuf>,
}

#[derive(Args)]
pub struct TestArgs {
    /// Test binary to run
    pub binary: PathBuf,

    /// Name for result files (defaults to the binary's file name)
    #[arg(long)]
    pub name: Option<String>,

    /// Set an environment variable for the test (repeatable)
    #[arg(long, value_name = "KEY=VALUE", value_parser = parse_key_val)]
    pub env: Vec<(String, String)>,

    /// Seconds before the test is killed [default: 600]
    #[arg(short, long, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Directory for result files [default: shipyard-results]
    #[arg(long)]
    pub results: Option<PathBuf>,

    /// Arguments passed to the test binary
    #[arg(last = true)]
    pub args: Vec<String>,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: Shell,
}

/// Parse `KEY=VALUE`; `KEY=` yields an empty value.
pub fn parse_key_val(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, _)) if key.is_empty() => Err(format!("missing key in `{}`", s)),
        Some((key, value)) => Ok((key.to_string(), value.to_string())),
        None => Err(format!("expected KEY=VALUE, got `{}`", s)),
    }
}

/// Parse `NAME[=VALUE]`; a bare name yields an empty value.
pub fn parse_define(s: &str) -> Result<(String, String), String> {
    let (name, value) = s.split_once('=').unwrap_or((s, ""));
    if name.is_empty() {
        return Err(format!("missing variable name in `{}`", s));
    }
    Ok((name.to_string(), value.to_string()))
}
