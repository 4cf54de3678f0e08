//! `shipyard test` command

use anyhow::Result;

use crate::cli::TestArgs;
use shipyard::ops::{result_files, run_test, timeout_from_secs, TestOptions, DEFAULT_RESULTS_DIR};
use shipyard::util::config::{load_project_config, TestConfig};

pub fn execute(args: TestArgs) -> Result<()> {
    let config = load_project_config(&std::env::current_dir()?);
    let opts = options(args, config.test);

    match run_test(&opts) {
        Ok(report) => {
            println!(
                "test {} ... ok ({:.2}s)",
                opts.test_name()?,
                report.elapsed().as_secs_f64()
            );
            Ok(())
        }
        Err(e) => {
            if let Ok(name) = opts.test_name() {
                let [stdout, stderr, _] = result_files(&opts.results, &name);
                if stdout.exists() {
                    eprintln!("note: test output saved to {} and {}", stdout.display(), stderr.display());
                }
            }
            Err(e)
        }
    }
}

/// Layer command-line flags over the `[test]` config section.
fn options(args: TestArgs, config: TestConfig) -> TestOptions {
    let mut opts = TestOptions::new(args.binary);
    opts.name = args.name;

    opts.env = config.env;
    opts.env.extend(args.env);

    opts.args = if args.args.is_empty() {
        config.args
    } else {
        args.args
    };

    if let Some(secs) = args.timeout.or(config.timeout) {
        opts.timeout = timeout_from_secs(secs);
    }
    opts.results = args
        .results
        .or(config.results)
        .unwrap_or_else(|| DEFAULT_RESULTS_DIR.into());
    opts
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use shipyard::ops::DEFAULT_TIMEOUT;
    use std::path::PathBuf;
    use std::time::Duration;

    /// Helper to parse TestArgs from command-line strings.
    fn parse_test_args(args: &[&str]) -> TestArgs {
        #[derive(Parser)]
        struct TestCli {
            #[command(flatten)]
            test: TestArgs,
        }
        TestCli::parse_from(args).test
    }

    // =========================================================================
    // Defaults
    // =========================================================================

    #[test]
    fn test_test_args_defaults() {
        let opts = options(parse_test_args(&["test", "build/unit_test"]), TestConfig::default());

        assert_eq!(opts.binary, PathBuf::from("build/unit_test"));
        assert!(opts.name.is_none());
        assert!(opts.args.is_empty());
        assert_eq!(opts.timeout, Some(DEFAULT_TIMEOUT));
        assert_eq!(opts.results, PathBuf::from("shipyard-results"));
    }

    // =========================================================================
    // Flags
    // =========================================================================

    #[test]
    fn test_env_and_trailing_args() {
        let args = parse_test_args(&[
            "test",
            "unit_test",
            "--env",
            "MODE=ci",
            "--env",
            "EMPTY=",
            "--timeout",
            "30",
            "--",
            "--gtest_filter=Fast.*",
            "-v",
        ]);
        let opts = options(args, TestConfig::default());

        assert_eq!(opts.env.get("MODE").map(String::as_str), Some("ci"));
        assert_eq!(opts.env.get("EMPTY").map(String::as_str), Some(""));
        assert_eq!(opts.timeout, Some(Duration::from_secs(30)));
        assert_eq!(opts.args, vec!["--gtest_filter=Fast.*", "-v"]);
    }

    #[test]
    fn test_invalid_env_is_rejected() {
        #[derive(Parser)]
        struct TestCli {
            #[command(flatten)]
            test: TestArgs,
        }
        assert!(TestCli::try_parse_from(["test", "unit_test", "--env", "NOEQUALS"]).is_err());
    }

    #[test]
    fn test_zero_timeout_disables_limit() {
        let opts = options(
            parse_test_args(&["test", "unit_test", "--timeout", "0"]),
            TestConfig::default(),
        );
        assert_eq!(opts.timeout, None);

        let config = TestConfig {
            timeout: Some(0),
            ..Default::default()
        };
        let opts = options(parse_test_args(&["test", "unit_test"]), config);
        assert_eq!(opts.timeout, None);
    }

    // =========================================================================
    // Config layering
    // =========================================================================

    #[test]
    fn test_config_fills_in_missing_flags() {
        let mut config = TestConfig {
            timeout: Some(5),
            results: Some(PathBuf::from("ci-results")),
            args: vec!["--from-config".into()],
            ..Default::default()
        };
        config.env.insert("MODE".into(), "config".into());
        config.env.insert("KEEP".into(), "yes".into());

        let args = parse_test_args(&["test", "unit_test", "--env", "MODE=flag"]);
        let opts = options(args, config.clone());

        assert_eq!(opts.timeout, Some(Duration::from_secs(5)));
        assert_eq!(opts.results, PathBuf::from("ci-results"));
        assert_eq!(opts.args, vec!["--from-config"]);
        assert_eq!(opts.env.get("MODE").map(String::as_str), Some("flag"));
        assert_eq!(opts.env.get("KEEP").map(String::as_str), Some("yes"));

        let args = parse_test_args(&["test", "unit_test", "-t", "9", "--", "--from-flag"]);
        let opts = options(args, config);
        assert_eq!(opts.timeout, Some(Duration::from_secs(9)));
        assert_eq!(opts.args, vec!["--from-flag"]);
    }
}
