//! Shipyard CLI - supervised native builds and tests

use std::io::IsTerminal;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use shipyard::process::ExecError;
use shipyard::util::diagnostic;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    let color = !cli.no_color && std::io::stderr().is_terminal();

    if let Err(e) = run(cli) {
        report_error(&e, color);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("shipyard=debug")
    } else {
        EnvFilter::new("shipyard=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    // Execute command
    match cli.command {
        Commands::Generate(args) => commands::generate::execute(args),
        Commands::Compile(args) => commands::compile::execute(args),
        Commands::Test(args) => commands::test::execute(args),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}

/// Print an error, with hints when it came from a supervised execution.
fn report_error(e: &anyhow::Error, color: bool) {
    match e.downcast_ref::<ExecError>() {
        Some(exec) => {
            let mut diag = exec.to_diagnostic();
            diag.message = format!("{:#}", e);
            diagnostic::emit(&diag, color);
        }
        None => eprintln!("error: {:#}", e),
    }
}
