//! Execution requests: what to run and where its output goes.

use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

/// Where the lines of one output stream end up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamSink {
    /// Print each line as soon as it is read.
    Console,
    /// Keep lines in memory so the session can print them afterwards.
    Memory,
    /// Append each line to a file, truncating it first.
    File(PathBuf),
}

/// How the stdout and stderr streams of a process are handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputMode {
    /// stderr is redirected into the stdout pipe and drained by a single worker.
    Merged(StreamSink),
    /// Each stream gets its own worker and sink.
    Separate { stdout: StreamSink, stderr: StreamSink },
}

impl OutputMode {
    /// Both streams buffered in memory.
    pub fn buffered() -> Self {
        OutputMode::Separate {
            stdout: StreamSink::Memory,
            stderr: StreamSink::Memory,
        }
    }

    /// Both streams written to `<dir>/<name>.stdout` and `<dir>/<name>.stderr`.
    pub fn files(dir: &Path, name: &str) -> Self {
        OutputMode::Separate {
            stdout: StreamSink::File(dir.join(format!("{}.stdout", name))),
            stderr: StreamSink::File(dir.join(format!("{}.stderr", name))),
        }
    }

    /// All sinks in this mode, stdout first.
    pub(crate) fn sinks(&self) -> Vec<&StreamSink> {
        match self {
            OutputMode::Merged(sink) => vec![sink],
            OutputMode::Separate { stdout, stderr } => vec![stdout, stderr],
        }
    }
}

impl Default for OutputMode {
    fn default() -> Self {
        OutputMode::Merged(StreamSink::Console)
    }
}

/// A fully described external process execution.
#[derive(Debug, Clone)]
pub struct ExecutionRequest {
    program: PathBuf,
    args: Vec<String>,
    env: BTreeMap<String, String>,
    cwd: Option<PathBuf>,
    timeout: Option<Duration>,
    output: OutputMode,
}

impl ExecutionRequest {
    /// Create a request for the given program.
    pub fn new(program: impl AsRef<Path>) -> Self {
        ExecutionRequest {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            env: BTreeMap::new(),
            cwd: None,
            timeout: None,
            output: OutputMode::default(),
        }
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_string_lossy().into_owned());
        self
    }

    /// Add multiple arguments, preserving their order.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args.extend(
            args.into_iter()
                .map(|s| s.as_ref().to_string_lossy().into_owned()),
        );
        self
    }

    /// Override an environment variable. An empty value is kept as-is.
    pub fn env(mut self, key: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.env
            .insert(key.as_ref().to_string(), value.as_ref().to_string());
        self
    }

    /// Override several environment variables.
    pub fn envs<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in vars {
            self = self.env(key, value);
        }
        self
    }

    /// Set the working directory.
    pub fn cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_path_buf());
        self
    }

    /// Give up waiting after `timeout`. A zero timeout waits forever.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = (!timeout.is_zero()).then_some(timeout);
        self
    }

    /// Set how output streams are handled.
    pub fn output(mut self, output: OutputMode) -> Self {
        self.output = output;
        self
    }

    pub fn get_program(&self) -> &Path {
        &self.program
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    pub fn get_env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    pub fn get_timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn get_output(&self) -> &OutputMode {
        &self.output
    }

    /// Build the `Command` for an already resolved program path.
    ///
    /// Stdio is left untouched; the session wires the pipes.
    pub(crate) fn build_command(&self, program: &Path) -> Command {
        let mut cmd = Command::new(program);
        cmd.args(&self.args);

        // Overrides are layered over the inherited environment.
        for (key, value) in &self.env {
            cmd.env(key, value);
        }

        if let Some(ref cwd) = self.cwd {
            cmd.current_dir(cwd);
        }

        cmd
    }

    /// Display the command for log and error messages.
    pub fn display_command(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }

    /// Display the command with every word single-quoted.
    pub fn quoted_command(&self) -> String {
        std::iter::once(self.program.display().to_string())
            .chain(self.args.iter().cloned())
            .map(|word| format!("'{}'", word))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
