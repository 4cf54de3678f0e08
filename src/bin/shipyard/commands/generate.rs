//! `shipyard generate` command

use anyhow::Result;

use crate::cli::GenerateArgs;
use crate::commands::{pick_dir, DEFAULT_OUTPUT_DIR};
use shipyard::ops::{generate, GenerateOptions};
use shipyard::util::config::{load_project_config, GenerateConfig};

pub fn execute(args: GenerateArgs) -> Result<()> {
    let config = load_project_config(&std::env::current_dir()?);
    generate(&options(args, config.generate))
}

/// Layer command-line flags over the `[generate]` config section.
fn options(args: GenerateArgs, config: GenerateConfig) -> GenerateOptions {
    let mut env = config.env;
    env.extend(args.env);
    let mut vars = config.vars;
    vars.extend(args.vars);

    GenerateOptions {
        source: pick_dir(args.source, config.source, "."),
        output: pick_dir(args.output, config.output, DEFAULT_OUTPUT_DIR),
        env,
        vars,
        generator: args.generator.or(config.generator),
        cmake: args.cmake.or(config.cmake),
    }
}
