//! Implementation of `shipyard test`.
//!
//! Runs one native test binary under a timeout. Its stdout and stderr are
//! written to `<results>/<name>.stdout` and `<results>/<name>.stderr`, and
//! its progress to `<results>/<name>.status`, so a CI system can pick up
//! every test's outcome after the run.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::process::{
    ExecutionOutcome, ExecutionRequest, OutputMode, Session, SessionReport, StatusRecorder,
};
use crate::util::diagnostic::suggestions;
use crate::util::fs::normalize_path;
use crate::util::platform::validate_platform;

/// How long a test may run before it is killed.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

/// Where result files go unless configured otherwise.
pub const DEFAULT_RESULTS_DIR: &str = "shipyard-results";

/// Convert a configured timeout in seconds; 0 disables the timeout.
pub fn timeout_from_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

/// Options for the test command.
#[derive(Debug, Clone)]
pub struct TestOptions {
    /// Test binary to run
    pub binary: PathBuf,

    /// Name used for result files (default: binary file name)
    pub name: Option<String>,

    /// Environment overrides for the test
    pub env: BTreeMap<String, String>,

    /// Arguments passed to the test
    pub args: Vec<String>,

    /// Kill the test after this long; `None` waits forever
    pub timeout: Option<Duration>,

    /// Directory for result files
    pub results: PathBuf,
}

impl TestOptions {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        TestOptions {
            binary: binary.into(),
            name: None,
            env: BTreeMap::new(),
            args: Vec::new(),
            timeout: Some(DEFAULT_TIMEOUT),
            results: PathBuf::from(DEFAULT_RESULTS_DIR),
        }
    }

    /// Name for result files.
    pub fn test_name(&self) -> Result<String> {
        if let Some(ref name) = self.name {
            return Ok(name.clone());
        }
        self.binary
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .with_context(|| format!("cannot derive a test name from `{}`", self.binary.display()))
    }
}

/// Run a test binary and record its outcome.
///
/// Returns the session report when the test exits with code 0.
pub fn run_test(opts: &TestOptions) -> Result<SessionReport> {
    validate_platform()?;

    if !opts.binary.exists() {
        bail!(
            "Test {} was not built! (File does not exist.)\nhelp: {}",
            opts.binary.display(),
            suggestions::NOT_BUILT
        );
    }

    let name = opts.test_name()?;
    // A bare file name must not be looked up on PATH.
    let binary = std::path::absolute(&opts.binary)
        .with_context(|| format!("invalid test binary: {}", opts.binary.display()))?;

    tracing::debug!(
        test = %name,
        results = %normalize_path(&opts.results).display(),
        "running test"
    );

    let mut request = ExecutionRequest::new(binary)
        .args(&opts.args)
        .envs(&opts.env)
        .output(OutputMode::files(&opts.results, &name));
    if let Some(timeout) = opts.timeout {
        request = request.timeout(timeout);
    }

    let report = Session::new(request)
        .record_status(StatusRecorder::new(&opts.results, &name))
        .execute()?;

    match report.outcome() {
        ExecutionOutcome::Completed(0) => Ok(report),
        ExecutionOutcome::TimedOut => bail!(
            "Test {} timed out after {} seconds!",
            opts.binary.display(),
            opts.timeout.unwrap_or_default().as_secs()
        ),
        ExecutionOutcome::Completed(_) | ExecutionOutcome::WaitInterrupted(_) => {
            let status = report.status().map(|s| s.to_string()).unwrap_or_default();
            bail!("Test {} returned {}", opts.binary.display(), status)
        }
        ExecutionOutcome::LaunchFailed(_) => report
            .into_result()
            .with_context(|| format!("error while executing the test {}", name)),
    }
}

/// Paths of the result files for a test named `name`.
pub fn result_files(results: &Path, name: &str) -> [PathBuf; 3] {
    [
        results.join(format!("{}.stdout", name)),
        results.join(format!("{}.stderr", name)),
        results.join(format!("{}.status", name)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{read_status, Status};
    use crate::test_support::write_script;
    use tempfile::TempDir;

    fn options(tmp: &TempDir, binary: PathBuf) -> TestOptions {
        let mut opts = TestOptions::new(binary);
        opts.results = tmp.path().join("results");
        opts
    }

    #[test]
    fn test_name_defaults_to_file_name() {
        let opts = TestOptions::new("target/native/unit_test");
        assert_eq!(opts.test_name().unwrap(), "unit_test");

        let mut opts = TestOptions::new("target/native/unit_test");
        opts.name = Some("smoke".into());
        assert_eq!(opts.test_name().unwrap(), "smoke");
    }

    #[test]
    fn test_passing_test_writes_result_files() {
        let tmp = TempDir::new().unwrap();
        let binary = write_script(
            tmp.path(),
            "unit_test",
            "echo \"args: $*\"\necho \"mode=$MODE\"\necho warn >&2",
        );

        let mut opts = options(&tmp, binary);
        opts.args = vec!["--fast".into(), "x y".into()];
        opts.env.insert("MODE".into(), "ci".into());

        run_test(&opts).unwrap();

        let [stdout, stderr, status] = result_files(&opts.results, "unit_test");
        assert_eq!(
            std::fs::read_to_string(stdout).unwrap(),
            "args: --fast x y\nmode=ci\n"
        );
        assert_eq!(std::fs::read_to_string(stderr).unwrap(), "warn\n");
        assert_eq!(read_status(&status).unwrap(), Status::Success);
    }

    #[test]
    fn test_failing_test_reports_error_status() {
        let tmp = TempDir::new().unwrap();
        let binary = write_script(tmp.path(), "bad_test", "exit 4");

        let opts = options(&tmp, binary.clone());
        let err = run_test(&opts).unwrap_err();

        assert_eq!(
            err.to_string(),
            format!("Test {} returned ERROR 4", binary.display())
        );
        let [_, _, status] = result_files(&opts.results, "bad_test");
        assert_eq!(read_status(&status).unwrap(), Status::Error(4));
    }

    #[test]
    fn test_hanging_test_times_out() {
        let tmp = TempDir::new().unwrap();
        let binary = write_script(tmp.path(), "slow_test", "echo started\nsleep 30");

        let mut opts = options(&tmp, binary.clone());
        opts.timeout = Some(Duration::from_secs(1));

        let err = run_test(&opts).unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("Test {} timed out after 1 seconds!", binary.display())
        );

        let [stdout, _, status] = result_files(&opts.results, "slow_test");
        assert_eq!(read_status(&status).unwrap(), Status::TimedOut);
        assert_eq!(std::fs::read_to_string(stdout).unwrap(), "started\n");
    }

    #[test]
    fn test_missing_binary_is_not_built() {
        let tmp = TempDir::new().unwrap();
        let opts = options(&tmp, tmp.path().join("ghost_test"));

        let err = run_test(&opts).unwrap_err();
        assert!(err.to_string().contains("was not built! (File does not exist.)"));
        assert!(!opts.results.exists());
    }

    #[test]
    fn test_zero_timeout_waits_for_completion() {
        let tmp = TempDir::new().unwrap();
        let binary = write_script(tmp.path(), "quick_test", "sleep 1\necho finished");

        let mut opts = options(&tmp, binary);
        opts.timeout = timeout_from_secs(0);
        assert!(opts.timeout.is_none());

        run_test(&opts).unwrap();

        let [stdout, _, status] = result_files(&opts.results, "quick_test");
        assert_eq!(read_status(&status).unwrap(), Status::Success);
        assert_eq!(std::fs::read_to_string(stdout).unwrap(), "finished\n");
    }

    #[test]
    fn test_timeout_from_secs() {
        assert_eq!(timeout_from_secs(0), None);
        assert_eq!(timeout_from_secs(30), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_relative_binary_resolves_against_cwd() {
        // Tests run from the package root, where `Cargo.toml` exists but is
        // not executable. A PATH lookup would report it as not found instead.
        let tmp = TempDir::new().unwrap();
        let opts = options(&tmp, PathBuf::from("Cargo.toml"));

        let err = run_test(&opts).unwrap_err();
        let message = format!("{:#}", err);
        let absolute = std::path::absolute("Cargo.toml").unwrap();

        assert!(message.contains("is not executable"), "{}", message);
        assert!(message.contains(&absolute.display().to_string()), "{}", message);
        assert!(!message.contains("not found on PATH"), "{}", message);
    }
}
