//! Timed wait supervisor.
//!
//! `Child::wait` cannot time out, so the blocking wait runs on a dedicated
//! thread that reports the exit status over a channel. The caller receives
//! from that channel for at most the configured duration. A waiter that is
//! still blocked when the caller gives up is simply abandoned; whatever it
//! reports later is discarded.

use std::io;
use std::process::{Child, ExitStatus};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// What the supervisor observed.
#[derive(Debug)]
pub enum WaitResult {
    Exited(ExitStatus),
    TimedOut,
    Interrupted(String),
}

/// Owns the child process and the thread blocked on it.
pub struct Waiter {
    pid: u32,
    rx: Receiver<io::Result<ExitStatus>>,
    handle: JoinHandle<()>,
    reaped: bool,
}

impl Waiter {
    /// Move `child` onto a new thread that waits for it.
    ///
    /// The child is handed over only once the thread is running, so a
    /// failed thread start gives it back to the caller to reap.
    pub fn spawn(child: Child) -> Result<Self, (io::Error, Child)> {
        let pid = child.id();
        let (handoff, inbox) = mpsc::channel::<Child>();
        let (tx, rx) = mpsc::channel();

        let spawned = thread::Builder::new()
            .name(format!("wait-{}", pid))
            .spawn(move || {
                let Ok(mut child) = inbox.recv() else {
                    return;
                };
                let status = child.wait();
                let _ = tx.send(status);
            });
        let handle = match spawned {
            Ok(handle) => handle,
            Err(e) => return Err((e, child)),
        };

        if let Err(mpsc::SendError(child)) = handoff.send(child) {
            let e = io::Error::other("waiter thread exited before receiving the process");
            return Err((e, child));
        }

        Ok(Waiter {
            pid,
            rx,
            handle,
            reaped: false,
        })
    }

    /// Block until the process exits or `timeout` elapses.
    ///
    /// When the timeout and the exit race, an exit status that is already
    /// available without blocking wins.
    pub fn wait(&mut self, timeout: Option<Duration>) -> WaitResult {
        let received = match timeout {
            None => self.rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
            Some(timeout) => self.rx.recv_timeout(timeout),
        };

        let received = match received {
            Err(RecvTimeoutError::Timeout) => match self.rx.try_recv() {
                Ok(status) => Ok(status),
                Err(TryRecvError::Empty) => return WaitResult::TimedOut,
                Err(TryRecvError::Disconnected) => Err(RecvTimeoutError::Disconnected),
            },
            other => other,
        };

        match received {
            Ok(Ok(status)) => {
                self.reaped = true;
                WaitResult::Exited(status)
            }
            Ok(Err(e)) => WaitResult::Interrupted(format!("wait failed: {}", e)),
            Err(_) => {
                WaitResult::Interrupted("waiter thread exited without a status".to_string())
            }
        }
    }

    /// Release the waiter thread.
    ///
    /// If the process has not been reaped yet it must already have been
    /// killed; the waiter is given `grace` to observe that before it is
    /// abandoned. Returns whether the process is known to be reaped.
    pub fn finish(self, grace: Duration) -> bool {
        if !self.reaped {
            match self.rx.recv_timeout(grace) {
                Ok(_) => {}
                Err(RecvTimeoutError::Timeout) => {
                    tracing::warn!(pid = self.pid, "process did not exit after being killed");
                    return false;
                }
                Err(RecvTimeoutError::Disconnected) => {}
            }
        }

        if self.handle.join().is_err() {
            tracing::warn!(pid = self.pid, "waiter thread panicked");
        }
        true
    }
}
