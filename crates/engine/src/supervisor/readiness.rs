// SPDX-License-Identifier: MIT

//! Readiness detection for a starting backend.
//!
//! The current signal is a log-substring heuristic; [`is_ready`] is the
//! single predicate to replace if a health port or bridge IPC message
//! ever supersedes it.

use super::InstanceSupervisor;
use numdrassl_core::{Clock, ServerId};
use numdrassl_proc::ProcessAdapter;
use std::time::Duration;

/// Literal markers a ready backend prints.
const READY_MARKERS: [&str; 4] = ["Server started", "Done", "Ready", "Listening on"];

/// How many captured tail lines are inspected per poll.
const READY_SCAN_LINES: usize = 50;

const READY_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Outcome of the readiness scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Readiness {
    /// A marker was observed.
    Ready,
    /// Deadline passed with the process alive; treated as ready.
    AssumedReady,
    /// The process died before becoming ready.
    Dead(String),
}

/// True when any recent line contains a readiness marker.
pub(crate) fn is_ready(lines: &[String]) -> bool {
    lines
        .iter()
        .any(|line| READY_MARKERS.iter().any(|marker| line.contains(marker)))
}

impl<P: ProcessAdapter, C: Clock> InstanceSupervisor<P, C> {
    /// Poll every 500 ms until a marker appears, the process dies, or
    /// `processStartTimeoutSeconds` elapses.
    pub(crate) async fn await_readiness(&self, id: &ServerId) -> Readiness {
        let deadline_ms = self.config().process_start_timeout_seconds * 1000;
        let started_ms = self.clock.epoch_ms();
        loop {
            if !self.procs.is_alive(id) {
                return Readiness::Dead("Process exited during startup".to_string());
            }
            if is_ready(&self.procs.recent_logs(id, READY_SCAN_LINES)) {
                return Readiness::Ready;
            }
            if self.clock.since_ms(started_ms) >= deadline_ms {
                return if self.procs.is_alive(id) {
                    Readiness::AssumedReady
                } else {
                    Readiness::Dead("Process exited during startup".to_string())
                };
            }
            tokio::time::sleep(READY_POLL_INTERVAL).await;
        }
    }
}

#[cfg(test)]
#[path = "readiness_tests.rs"]
mod tests;
