//! Supervised execution of one external process.
//!
//! A session launches the process, hands each output pipe to its own drain
//! worker, waits through a [`Waiter`] and then always tears down in the same
//! order: kill the process group if it is still running, join the drain
//! workers, record the terminal status and surface buffered output.

use std::io::{self, PipeReader};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use crate::process::drain::{CapturedOutput, ConsoleStream, DrainWorker, LineSink};
use crate::process::error::ExecError;
use crate::process::outcome::{exit_code, ExecutionOutcome, INTERRUPTED_EXIT_CODE};
use crate::process::request::{ExecutionRequest, OutputMode, StreamSink};
use crate::process::status::{Status, StatusRecorder};
use crate::process::wait::{WaitResult, Waiter};
use crate::util::process::{kill_process_group, kill_stray_group, resolve_program};

/// How long a killed process gets to be reaped.
const KILL_GRACE: Duration = Duration::from_secs(5);

/// How long drain workers get to reach end-of-stream after a forced kill.
const DRAIN_GRACE: Duration = Duration::from_secs(5);

/// One supervised run of an external process.
#[derive(Debug)]
pub struct Session {
    request: ExecutionRequest,
    recorder: Option<StatusRecorder>,
    surface: bool,
}

/// Everything known about a finished session.
#[derive(Debug)]
pub struct SessionReport {
    program: String,
    outcome: ExecutionOutcome,
    stdout: CapturedOutput,
    stderr: Option<CapturedOutput>,
    timeout: Option<Duration>,
    elapsed: Duration,
}

/// Sinks opened during init, handed to the workers once the process runs.
struct Sinks {
    stdout: LineSink,
    stderr: Option<LineSink>,
}

/// A started process plus the read end of its merged pipe, if any.
struct Launched {
    child: Child,
    merged: Option<PipeReader>,
}

#[derive(Default)]
struct Workers {
    stdout: Option<DrainWorker>,
    stderr: Option<DrainWorker>,
}

impl Session {
    pub fn new(request: ExecutionRequest) -> Self {
        Session {
            request,
            recorder: None,
            surface: true,
        }
    }

    /// Record `IN_PROGRESS` and then the terminal status through `recorder`.
    pub fn record_status(mut self, recorder: StatusRecorder) -> Self {
        self.recorder = Some(recorder);
        self
    }

    /// Print memory-buffered output after teardown (on by default).
    pub fn surface_output(mut self, surface: bool) -> Self {
        self.surface = surface;
        self
    }

    /// Run the session and fail unless the process exited with code 0.
    pub fn run(self) -> Result<SessionReport, ExecError> {
        self.execute()?.into_result()
    }

    /// Run the session and report how it ended.
    ///
    /// Only setup failures before launch are returned as errors. Anything
    /// that got as far as a launch attempt yields a report, including a
    /// failed launch.
    pub fn execute(self) -> Result<SessionReport, ExecError> {
        let start = Instant::now();
        let program = self.request.get_program().display().to_string();
        let timeout = self.request.get_timeout();

        // Init
        self.prepare_dirs()?;
        if let Some(ref recorder) = self.recorder {
            recorder.write(Status::InProgress)?;
        }
        let sinks = self.open_sinks()?;

        // Launch
        tracing::debug!(command = %self.request.display_command(), "running");
        let Launched { mut child, merged } = match self.launch() {
            Ok(launched) => launched,
            Err(cause) => {
                tracing::debug!(%program, %cause, "launch failed");
                return Ok(SessionReport {
                    program,
                    outcome: ExecutionOutcome::LaunchFailed(cause),
                    stdout: CapturedOutput::Console,
                    stderr: None,
                    timeout,
                    elapsed: start.elapsed(),
                });
            }
        };
        let pid = child.id();
        tracing::debug!(pid, "process started");

        // Running
        let mut workers = Workers::default();
        let started = match start_workers(&mut child, merged, sinks, &mut workers) {
            Ok(()) => Waiter::spawn(child).map_err(|(e, child)| (e, Some(child))),
            Err(e) => Err((e, Some(child))),
        };

        // Await
        let (outcome, waiter, orphan) = match started {
            Ok(mut waiter) => {
                let outcome = match waiter.wait(timeout) {
                    WaitResult::Exited(status) => ExecutionOutcome::Completed(exit_code(status)),
                    WaitResult::TimedOut => ExecutionOutcome::TimedOut,
                    WaitResult::Interrupted(cause) => ExecutionOutcome::WaitInterrupted(cause),
                };
                (outcome, Some(waiter), None)
            }
            Err((e, orphan)) => {
                let cause = format!("failed to start supervisor thread: {}", e);
                (ExecutionOutcome::WaitInterrupted(cause), None, orphan)
            }
        };

        // Teardown
        let status = outcome
            .terminal_status()
            .unwrap_or(Status::Error(INTERRUPTED_EXIT_CODE));
        let premature = !matches!(outcome, ExecutionOutcome::Completed(_));
        if premature {
            tracing::debug!(pid, %outcome, "terminating process group");
            kill_process_group(pid);
        } else {
            // Background children may still hold the pipes open.
            kill_stray_group(pid);
        }
        if let Some(waiter) = waiter {
            waiter.finish(KILL_GRACE);
        }
        if let Some(mut child) = orphan {
            if let Err(e) = child.wait() {
                tracing::warn!(pid, error = %e, "failed to reap process");
            }
        }

        let grace = premature.then_some(DRAIN_GRACE);
        let stdout = workers
            .stdout
            .map(|worker| worker.join(grace))
            .unwrap_or(CapturedOutput::Console);
        let stderr = workers.stderr.map(|worker| worker.join(grace));

        if let Some(ref recorder) = self.recorder {
            if let Err(e) = recorder.write(status) {
                // Never replaces the real outcome.
                tracing::warn!("{:#}", anyhow::Error::new(e));
            }
        }

        let report = SessionReport {
            program,
            outcome,
            stdout,
            stderr,
            timeout,
            elapsed: start.elapsed(),
        };
        tracing::info!(
            %status,
            elapsed = %format!("{:.2}s", report.elapsed.as_secs_f64()),
            "finished"
        );

        // Done
        if self.surface {
            report.surface(self.request.get_output());
        }
        Ok(report)
    }

    fn prepare_dirs(&self) -> Result<(), ExecError> {
        let mut dirs: Vec<&Path> = Vec::new();
        if let Some(ref recorder) = self.recorder {
            dirs.push(recorder.dir());
        }
        for sink in self.request.get_output().sinks() {
            if let StreamSink::File(path) = sink {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    dirs.push(parent);
                }
            }
        }

        for dir in dirs {
            std::fs::create_dir_all(dir).map_err(|source| ExecError::ResultsDir {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        Ok(())
    }

    fn open_sinks(&self) -> Result<Sinks, ExecError> {
        Ok(match self.request.get_output() {
            OutputMode::Merged(sink) => Sinks {
                stdout: LineSink::open(sink, ConsoleStream::Stdout)?,
                stderr: None,
            },
            OutputMode::Separate { stdout, stderr } => Sinks {
                stdout: LineSink::open(stdout, ConsoleStream::Stdout)?,
                stderr: Some(LineSink::open(stderr, ConsoleStream::Stderr)?),
            },
        })
    }

    /// Start the process in its own process group with its pipes wired.
    fn launch(&self) -> Result<Launched, String> {
        let program = resolve_program(self.request.get_program())?;
        let mut cmd = self.request.build_command(&program);
        cmd.stdin(Stdio::null());

        let merged = match self.request.get_output() {
            OutputMode::Merged(_) => {
                let (reader, writer) =
                    io::pipe().map_err(|e| format!("failed to create pipe: {}", e))?;
                let writer_err = writer
                    .try_clone()
                    .map_err(|e| format!("failed to create pipe: {}", e))?;
                cmd.stdout(writer).stderr(writer_err);
                Some(reader)
            }
            OutputMode::Separate { .. } => {
                cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
                None
            }
        };

        // `spawn` consumes the command, closing our copies of the merged
        // write end so the reader sees EOF once the process exits.
        let child = spawn(cmd, &program)?;
        Ok(Launched { child, merged })
    }
}

fn spawn(mut cmd: Command, program: &Path) -> Result<Child, String> {
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }

    cmd.spawn()
        .map_err(|e| format!("failed to spawn `{}`: {}", program.display(), e))
}

fn start_workers(
    child: &mut Child,
    merged: Option<PipeReader>,
    sinks: Sinks,
    workers: &mut Workers,
) -> io::Result<()> {
    if let Some(reader) = merged {
        workers.stdout = Some(DrainWorker::spawn("output", reader, sinks.stdout)?);
        return Ok(());
    }

    if let Some(out) = child.stdout.take() {
        workers.stdout = Some(DrainWorker::spawn("stdout", out, sinks.stdout)?);
    }
    if let (Some(err), Some(sink)) = (child.stderr.take(), sinks.stderr) {
        workers.stderr = Some(DrainWorker::spawn("stderr", err, sink)?);
    }
    Ok(())
}

impl SessionReport {
    /// Program as given in the request.
    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn outcome(&self) -> &ExecutionOutcome {
        &self.outcome
    }

    /// Terminal status, or `None` when the process never started.
    pub fn status(&self) -> Option<Status> {
        self.outcome.terminal_status()
    }

    /// Captured stdout, or the merged output.
    pub fn stdout(&self) -> &CapturedOutput {
        &self.stdout
    }

    /// Captured stderr; `None` when merged into stdout or never started.
    pub fn stderr(&self) -> Option<&CapturedOutput> {
        self.stderr.as_ref()
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Convert any outcome other than a zero exit into an error.
    pub fn into_result(self) -> Result<Self, ExecError> {
        let program = self.program.clone();
        match &self.outcome {
            ExecutionOutcome::Completed(0) => Ok(self),
            ExecutionOutcome::Completed(code) => Err(ExecError::NonZeroExit {
                program,
                code: *code,
            }),
            ExecutionOutcome::TimedOut => Err(ExecError::TimedOut {
                program,
                timeout: self.timeout.unwrap_or_default(),
            }),
            ExecutionOutcome::LaunchFailed(message) => Err(ExecError::Launch {
                program,
                message: message.clone(),
            }),
            ExecutionOutcome::WaitInterrupted(message) => Err(ExecError::WaitInterrupted {
                program,
                message: message.clone(),
            }),
        }
    }

    /// Print memory-buffered output.
    ///
    /// stderr always carries warnings worth seeing, so it is printed even on
    /// success; stdout only when the execution failed. Merged output
    /// contains stderr and is therefore always printed.
    fn surface(&self, mode: &OutputMode) {
        match mode {
            OutputMode::Merged(_) => self.stdout.print_to(ConsoleStream::Stdout),
            OutputMode::Separate { .. } => {
                if !self.outcome.is_success() {
                    self.stdout.print_to(ConsoleStream::Stdout);
                }
                if let Some(ref stderr) = self.stderr {
                    stderr.print_to(ConsoleStream::Stderr);
                }
            }
        }
    }
}
