// SPDX-License-Identifier: MIT

//! Handle to a spawned backend child process.

use crate::ring::LogRing;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::time::{Duration, Instant};
use tokio::process::Child;
use tokio_util::sync::CancellationToken;

/// A tracked child process: pid, log pipeline, exit latch.
///
/// The handle outlives the child; once the exit code is latched it
/// never changes.
pub struct ProcessHandle {
    pid: u32,
    log_path: PathBuf,
    ring: LogRing,
    started: Instant,
    started_at_ms: u64,
    exit_code: Mutex<Option<i32>>,
    child: tokio::sync::Mutex<Child>,
    probe: CancellationToken,
}

impl ProcessHandle {
    pub(crate) fn new(
        pid: u32,
        log_path: PathBuf,
        child: Child,
        started_at_ms: u64,
    ) -> Self {
        Self {
            pid,
            log_path,
            ring: LogRing::default(),
            started: Instant::now(),
            started_at_ms,
            exit_code: Mutex::new(None),
            child: tokio::sync::Mutex::new(child),
            probe: CancellationToken::new(),
        }
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    pub fn started_at_ms(&self) -> u64 {
        self.started_at_ms
    }

    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }

    /// Exit code latched by the liveness probe or a kill. `None` while
    /// the child has not been observed dead.
    pub fn exit_code(&self) -> Option<i32> {
        *self.exit_code.lock()
    }

    /// Most recent `n` captured output lines, oldest first.
    pub fn recent_logs(&self, n: usize) -> Vec<String> {
        self.ring.last(n)
    }

    /// Whether the child is still running, checked against the OS when
    /// the handle is not busy being waited on.
    pub fn is_alive(&self) -> bool {
        if self.exit_code().is_some() {
            return false;
        }
        match self.child.try_lock() {
            Ok(mut child) => match child.try_wait() {
                Ok(Some(status)) => {
                    self.latch_exit(status);
                    false
                }
                Ok(None) => true,
                Err(_) => false,
            },
            // A kill is mid-wait on the child; it has not been reaped yet.
            Err(_) => true,
        }
    }

    pub(crate) fn push_log_line(&self, line: String) {
        self.ring.push(line);
    }

    /// Set once; later observations of the same death are ignored.
    pub(crate) fn latch_exit(&self, status: ExitStatus) {
        let mut code = self.exit_code.lock();
        if code.is_none() {
            *code = Some(status.code().unwrap_or(-1));
        }
    }

    pub(crate) fn probe_token(&self) -> CancellationToken {
        self.probe.clone()
    }

    /// Poll the child once, latching the exit code if it has terminated.
    pub(crate) async fn poll_exit(&self) -> Option<i32> {
        let mut child = self.child.lock().await;
        match child.try_wait() {
            Ok(Some(status)) => {
                self.latch_exit(status);
                self.exit_code()
            }
            Ok(None) => None,
            Err(_) => self.exit_code(),
        }
    }

    /// Wait for the child to exit within `deadline`.
    pub(crate) async fn wait_with_deadline(&self, deadline: Duration) -> Option<ExitStatus> {
        let wait = async {
            let mut child = self.child.lock().await;
            child.wait().await
        };
        match tokio::time::timeout(deadline, wait).await {
            Ok(Ok(status)) => {
                self.latch_exit(status);
                Some(status)
            }
            Ok(Err(_)) | Err(_) => None,
        }
    }

    /// Deliver SIGKILL without waiting.
    pub(crate) async fn force_kill(&self) {
        let mut child = self.child.lock().await;
        let _ = child.start_kill();
    }
}

impl std::fmt::Debug for ProcessHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessHandle")
            .field("pid", &self.pid)
            .field("log_path", &self.log_path)
            .field("exit_code", &self.exit_code())
            .finish()
    }
}
