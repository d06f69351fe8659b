// SPDX-License-Identifier: MIT

//! Adapter seam between the instance supervisor and the process backend.

use crate::ProcError;
use async_trait::async_trait;
use numdrassl_core::ServerId;
use std::path::PathBuf;
use std::time::Duration;

/// Everything needed to start one backend child.
#[derive(Debug, Clone)]
pub struct SpawnSpec {
    pub server_id: ServerId,
    pub working_dir: PathBuf,
    /// Opaque memory budget, e.g. "2G"; becomes `-Xms`/`-Xmx`.
    pub memory: String,
    /// Preferred jar name; resolution falls back to a directory scan.
    pub exec_file: Option<String>,
    /// Extra JVM arguments, placed before `-jar`.
    pub jvm_args: Vec<String>,
    /// Arguments passed to the server after the jar.
    pub server_args: Vec<String>,
    /// Caller environment, overlaid last (caller wins on conflict).
    pub env: Vec<(String, String)>,
    pub dynamic: bool,
}

/// Result of a successful spawn.
#[derive(Debug, Clone)]
pub struct SpawnedProcess {
    pub pid: u32,
    pub log_path: PathBuf,
}

/// Point-in-time process metrics.
#[derive(Debug, Clone)]
pub struct ProcessMetrics {
    pub pid: u32,
    pub started_at_ms: u64,
    pub uptime_ms: u64,
    pub cpu_percent: Option<f32>,
    pub memory_bytes: Option<u64>,
}

/// Process backend operations the instance supervisor depends on.
///
/// Production uses [`crate::ProcessSupervisor`]; tests script a
/// [`crate::fake::FakeProcessAdapter`].
#[async_trait]
pub trait ProcessAdapter: Send + Sync + 'static {
    /// Start a child. Failure leaves no partial state behind.
    async fn spawn(&self, spec: SpawnSpec) -> Result<SpawnedProcess, ProcError>;

    /// Terminate a child, gracefully within `deadline` or forcibly.
    /// Returns false when the id is not tracked. The handle is removed
    /// on every path.
    async fn kill(&self, id: &ServerId, graceful: bool, deadline: Duration) -> bool;

    fn is_alive(&self, id: &ServerId) -> bool;

    /// Most recent `n` captured output lines, oldest first.
    fn recent_logs(&self, id: &ServerId, n: usize) -> Vec<String>;

    fn metrics(&self, id: &ServerId) -> Option<ProcessMetrics>;

    /// Gracefully kill every tracked child, then force the residue.
    async fn shutdown_all(&self);
}
