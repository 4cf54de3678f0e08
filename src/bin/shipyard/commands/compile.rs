//! `shipyard compile` command

use anyhow::Result;

use crate::cli::CompileArgs;
use crate::commands::{pick_dir, DEFAULT_OUTPUT_DIR};
use shipyard::ops::{compile, CompileOptions};
use shipyard::util::config::{load_project_config, Config};

pub fn execute(args: CompileArgs) -> Result<()> {
    let config = load_project_config(&std::env::current_dir()?);
    compile(&options(args, config))
}

/// Layer command-line flags over the `[compile]` config section.
///
/// The build tree falls back to `[generate].output` so one setting covers
/// both commands.
fn options(args: CompileArgs, config: Config) -> CompileOptions {
    let output = args.output.or(config.compile.output);
    CompileOptions {
        output: pick_dir(output, config.generate.output, DEFAULT_OUTPUT_DIR),
        target: args.target.or(config.compile.target),
        make: args.make.or(config.compile.make),
    }
}
