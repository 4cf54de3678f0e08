//! Pipe drain workers.
//!
//! A child process blocks once its pipe buffer is full, so every pipe gets a
//! dedicated thread that keeps reading it until end-of-stream. The worker
//! forwards each line to its sink and reports what it captured when it exits.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::process::error::ExecError;
use crate::process::request::StreamSink;

/// Which console stream a `Console` sink prints to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleStream {
    Stdout,
    Stderr,
}

/// What a drain worker captured from its stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapturedOutput {
    /// Lines were printed as they arrived.
    Console,
    /// Lines kept in memory, in the order they were read.
    Memory(Vec<String>),
    /// Lines written to this file.
    File(PathBuf),
}

impl CapturedOutput {
    /// Buffered lines, if this output was kept in memory.
    pub fn lines(&self) -> Option<&[String]> {
        match self {
            CapturedOutput::Memory(lines) => Some(lines),
            _ => None,
        }
    }

    /// Print buffered lines to the given console stream.
    pub(crate) fn print_to(&self, stream: ConsoleStream) {
        let Some(lines) = self.lines() else {
            return;
        };
        match stream {
            ConsoleStream::Stdout => {
                let mut out = io::stdout().lock();
                for line in lines {
                    let _ = writeln!(out, "{}", line);
                }
            }
            ConsoleStream::Stderr => {
                let mut err = io::stderr().lock();
                for line in lines {
                    let _ = writeln!(err, "{}", line);
                }
            }
        }
    }
}

/// A sink opened and ready to receive lines.
///
/// File sinks are opened before the process starts so that a bad results
/// path fails the session before anything runs.
#[derive(Debug)]
pub enum LineSink {
    Console(ConsoleStream),
    Memory(Vec<String>),
    File { path: PathBuf, out: BufWriter<File> },
}

impl LineSink {
    /// Open the sink described by `sink`. Files are truncated.
    pub fn open(sink: &StreamSink, console: ConsoleStream) -> Result<Self, ExecError> {
        Ok(match sink {
            StreamSink::Console => LineSink::Console(console),
            StreamSink::Memory => LineSink::Memory(Vec::new()),
            StreamSink::File(path) => {
                let file = File::create(path).map_err(|source| ExecError::OutputFile {
                    path: path.clone(),
                    source,
                })?;
                LineSink::File {
                    path: path.clone(),
                    out: BufWriter::new(file),
                }
            }
        })
    }

    fn push(&mut self, line: String) -> io::Result<()> {
        match self {
            LineSink::Console(ConsoleStream::Stdout) => writeln!(io::stdout().lock(), "{}", line),
            LineSink::Console(ConsoleStream::Stderr) => writeln!(io::stderr().lock(), "{}", line),
            LineSink::Memory(lines) => {
                lines.push(line);
                Ok(())
            }
            LineSink::File { out, .. } => writeln!(out, "{}", line),
        }
    }

    /// What this sink reports if its worker never finishes.
    fn placeholder(&self) -> CapturedOutput {
        match self {
            LineSink::Console(_) => CapturedOutput::Console,
            LineSink::Memory(_) => CapturedOutput::Memory(Vec::new()),
            LineSink::File { path, .. } => CapturedOutput::File(path.clone()),
        }
    }

    /// Flush and close the sink.
    fn finish(self) -> CapturedOutput {
        match self {
            LineSink::Console(_) => CapturedOutput::Console,
            LineSink::Memory(lines) => CapturedOutput::Memory(lines),
            LineSink::File { path, mut out } => {
                if let Err(e) = out.flush() {
                    tracing::debug!(path = %path.display(), error = %e, "failed to flush output file");
                }
                // The handle is closed when `out` drops here.
                CapturedOutput::File(path)
            }
        }
    }
}

/// Handle to a running drain worker.
pub struct DrainWorker {
    label: &'static str,
    cancel: Arc<AtomicBool>,
    done: mpsc::Receiver<CapturedOutput>,
    handle: JoinHandle<()>,
    placeholder: CapturedOutput,
}

impl DrainWorker {
    /// Start draining `stream` into `sink` on a new thread.
    pub fn spawn<R>(label: &'static str, stream: R, sink: LineSink) -> io::Result<Self>
    where
        R: Read + Send + 'static,
    {
        let cancel = Arc::new(AtomicBool::new(false));
        let (tx, done) = mpsc::channel();
        let placeholder = sink.placeholder();

        let flag = Arc::clone(&cancel);
        let handle = thread::Builder::new()
            .name(format!("drain-{}", label))
            .spawn(move || {
                let captured = drain(label, stream, sink, &flag);
                // The receiver may have given up on us already.
                let _ = tx.send(captured);
            })?;

        Ok(DrainWorker {
            label,
            cancel,
            done,
            handle,
            placeholder,
        })
    }

    /// Ask the worker to stop at its next line boundary.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Release);
    }

    /// Wait for the worker to reach end-of-stream.
    ///
    /// With a `grace` period, a worker that is still reading afterwards is
    /// cancelled and abandoned. Failures are logged, never returned.
    pub fn join(self, grace: Option<Duration>) -> CapturedOutput {
        let received = match grace {
            None => self.done.recv().map_err(|_| RecvTimeoutError::Disconnected),
            Some(grace) => self.done.recv_timeout(grace),
        };

        match received {
            Ok(captured) => {
                if self.handle.join().is_err() {
                    tracing::warn!(stream = self.label, "drain worker panicked after finishing");
                }
                captured
            }
            Err(RecvTimeoutError::Timeout) => {
                self.cancel();
                tracing::warn!(
                    stream = self.label,
                    "drain worker still reading after the process ended; abandoning it"
                );
                self.placeholder
            }
            Err(RecvTimeoutError::Disconnected) => {
                if self.handle.join().is_err() {
                    tracing::warn!(stream = self.label, "drain worker panicked");
                }
                self.placeholder
            }
        }
    }
}

fn drain<R: Read>(label: &str, stream: R, mut sink: LineSink, cancel: &AtomicBool) -> CapturedOutput {
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();
    let mut count = 0usize;

    loop {
        if cancel.load(Ordering::Acquire) {
            tracing::debug!(stream = label, "drain cancelled");
            break;
        }

        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {
                if let Err(e) = sink.push(decode_line(&buf)) {
                    tracing::debug!(stream = label, error = %e, "drain sink failed");
                    break;
                }
                count += 1;
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                // Expected once the process is killed and its pipe breaks.
                tracing::debug!(stream = label, error = %e, "drain read failed");
                break;
            }
        }
    }

    tracing::debug!(stream = label, lines = count, "drain finished");
    sink.finish()
}

/// Strip the line terminator and decode lossily.
fn decode_line(raw: &[u8]) -> String {
    let mut end = raw.len();
    if end > 0 && raw[end - 1] == b'\n' {
        end -= 1;
        if end > 0 && raw[end - 1] == b'\r' {
            end -= 1;
        }
    }
    String::from_utf8_lossy(&raw[..end]).into_owned()
}
