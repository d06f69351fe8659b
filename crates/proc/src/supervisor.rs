// SPDX-License-Identifier: MIT

//! Process supervisor: spawn, log pipeline, liveness probe, termination.

use crate::adapter::{ProcessAdapter, ProcessMetrics, SpawnSpec, SpawnedProcess};
use crate::artifact::resolve_server_artifact;
use crate::handle::ProcessHandle;
use crate::ProcError;
use async_trait::async_trait;
use numdrassl_core::{Clock, ServerId, SystemClock};
use parking_lot::Mutex;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Environment variable carrying the server id into the child.
pub const ENV_SERVER_ID: &str = "NUMDRASSL_SERVER_ID";
/// Environment variable carrying the memory budget into the child.
pub const ENV_MEMORY: &str = "MEMORY";

/// Fixed GC flags placed after the heap bounds on every launch.
const GC_FLAGS: [&str; 3] =
    ["-XX:+UseG1GC", "-XX:+ParallelRefProcEnabled", "-XX:MaxGCPauseMillis=200"];

const LIVENESS_PROBE_INTERVAL: Duration = Duration::from_secs(5);
/// Cap on waiting for a SIGKILL to take effect.
const FORCE_KILL_DEADLINE: Duration = Duration::from_secs(5);
/// Per-child grace during supervisor shutdown.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Spawns and tracks backend children, one handle per server id.
pub struct ProcessSupervisor {
    java_path: String,
    logs_root: PathBuf,
    table: Mutex<HashMap<ServerId, Arc<ProcessHandle>>>,
}

impl ProcessSupervisor {
    pub fn new(java_path: impl Into<String>, logs_root: impl Into<PathBuf>) -> Self {
        Self {
            java_path: java_path.into(),
            logs_root: logs_root.into(),
            table: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, id: &ServerId) -> Option<Arc<ProcessHandle>> {
        self.table.lock().get(id).cloned()
    }

    pub fn tracked_ids(&self) -> Vec<ServerId> {
        self.table.lock().keys().cloned().collect()
    }

    async fn spawn_inner(&self, spec: SpawnSpec) -> Result<SpawnedProcess, ProcError> {
        if self.table.lock().contains_key(&spec.server_id) {
            return Err(ProcError::AlreadyTracked(spec.server_id));
        }
        if !spec.working_dir.is_dir() {
            return Err(ProcError::WorkingDirMissing(spec.working_dir));
        }
        let jar = resolve_server_artifact(&spec.working_dir, spec.exec_file.as_deref())
            .ok_or_else(|| ProcError::NoArtifact(spec.working_dir.clone()))?;

        let log_dir = self.logs_root.join(if spec.dynamic { "dynamic" } else { "static" });
        tokio::fs::create_dir_all(&log_dir)
            .await
            .map_err(|source| ProcError::LogFile { path: log_dir.clone(), source })?;
        let log_path = log_dir.join(format!("{}.log", spec.server_id));
        let log_file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .await
            .map_err(|source| ProcError::LogFile { path: log_path.clone(), source })?;

        let mut cmd = Command::new(&self.java_path);
        cmd.arg(format!("-Xms{}", spec.memory))
            .arg(format!("-Xmx{}", spec.memory))
            .args(GC_FLAGS)
            .args(&spec.jvm_args)
            .arg("-jar")
            .arg(&jar)
            .args(&spec.server_args)
            .current_dir(&spec.working_dir)
            .env(ENV_SERVER_ID, spec.server_id.as_str())
            .env(ENV_MEMORY, &spec.memory)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        // Caller environment last, so it wins on conflict
        for (key, value) in &spec.env {
            cmd.env(key, value);
        }

        let mut child = cmd
            .spawn()
            .map_err(|source| ProcError::Start { id: spec.server_id.clone(), source })?;
        let pid = child.id().unwrap_or_default();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let handle = Arc::new(ProcessHandle::new(
            pid,
            log_path.clone(),
            child,
            SystemClock.epoch_ms(),
        ));

        // stderr is merged with stdout: both streams feed the same file
        // and ring, interleaved at line granularity
        let sink = Arc::new(tokio::sync::Mutex::new(log_file));
        if let Some(stream) = stdout {
            tokio::spawn(pump_stream(stream, Arc::clone(&handle), Arc::clone(&sink)));
        }
        if let Some(stream) = stderr {
            tokio::spawn(pump_stream(stream, Arc::clone(&handle), Arc::clone(&sink)));
        }

        tokio::spawn(liveness_probe(
            Arc::clone(&handle),
            spec.server_id.clone(),
            handle.probe_token(),
        ));

        match self.table.lock().entry(spec.server_id.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(Arc::clone(&handle));
            }
            Entry::Occupied(_) => {
                // Lost a race for the id; reap the new child rather than
                // leave two processes behind one key
                handle.probe_token().cancel();
                tokio::spawn(async move {
                    handle.force_kill().await;
                    handle.wait_with_deadline(FORCE_KILL_DEADLINE).await;
                });
                return Err(ProcError::AlreadyTracked(spec.server_id));
            }
        }

        info!("started process id={} pid={} jar={}", spec.server_id, pid, jar);
        Ok(SpawnedProcess { pid, log_path })
    }

    async fn kill_inner(&self, id: &ServerId, graceful: bool, deadline: Duration) -> bool {
        let Some(handle) = self.table.lock().remove(id) else {
            warn!("kill requested for untracked server {id}");
            return false;
        };
        handle.probe_token().cancel();

        if graceful {
            signal_term(handle.pid());
            if let Some(status) = handle.wait_with_deadline(deadline).await {
                info!("server {id} exited gracefully ({status})");
                return true;
            }
            warn!(
                "server {id} did not exit within {}s, escalating to SIGKILL",
                deadline.as_secs()
            );
        }

        handle.force_kill().await;
        if handle.wait_with_deadline(FORCE_KILL_DEADLINE).await.is_none() {
            warn!("server {id} (pid {}) survived SIGKILL", handle.pid());
        }
        true
    }
}

#[async_trait]
impl ProcessAdapter for ProcessSupervisor {
    async fn spawn(&self, spec: SpawnSpec) -> Result<SpawnedProcess, ProcError> {
        self.spawn_inner(spec).await
    }

    async fn kill(&self, id: &ServerId, graceful: bool, deadline: Duration) -> bool {
        self.kill_inner(id, graceful, deadline).await
    }

    fn is_alive(&self, id: &ServerId) -> bool {
        self.get(id).map(|handle| handle.is_alive()).unwrap_or(false)
    }

    fn recent_logs(&self, id: &ServerId, n: usize) -> Vec<String> {
        self.get(id).map(|handle| handle.recent_logs(n)).unwrap_or_default()
    }

    fn metrics(&self, id: &ServerId) -> Option<ProcessMetrics> {
        let handle = self.get(id)?;
        let pid = sysinfo::Pid::from_u32(handle.pid());
        let mut system = sysinfo::System::new();
        let (cpu_percent, memory_bytes) = if system.refresh_process(pid) {
            match system.process(pid) {
                Some(process) => (Some(process.cpu_usage()), Some(process.memory())),
                None => (None, None),
            }
        } else {
            (None, None)
        };
        Some(ProcessMetrics {
            pid: handle.pid(),
            started_at_ms: handle.started_at_ms(),
            uptime_ms: handle.uptime().as_millis() as u64,
            cpu_percent,
            memory_bytes,
        })
    }

    async fn shutdown_all(&self) {
        let ids = self.tracked_ids();
        info!("shutting down {} tracked processes", ids.len());
        for id in ids {
            self.kill_inner(&id, true, SHUTDOWN_GRACE).await;
        }
    }
}

/// Deliver SIGTERM; a missing process is not an error.
fn signal_term(pid: u32) {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;
    if let Err(errno) = kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
        if errno != nix::errno::Errno::ESRCH {
            warn!("failed to SIGTERM pid {pid}: {errno}");
        }
    }
}

/// Stream one child pipe line-by-line into the log file and ring.
async fn pump_stream<R>(
    stream: R,
    handle: Arc<ProcessHandle>,
    sink: Arc<tokio::sync::Mutex<tokio::fs::File>>,
) where
    R: AsyncRead + Unpin + Send + 'static,
{
    let mut lines = BufReader::new(stream).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        {
            let mut file = sink.lock().await;
            if file.write_all(line.as_bytes()).await.is_ok() {
                let _ = file.write_all(b"\n").await;
            }
        }
        handle.push_log_line(line);
    }
    // EOF: pipe closed, either the child exited or we are shutting down
}

/// Poll the child every 5 s, latching its exit code once it dies.
/// Runs until the token is cancelled by an explicit kill.
async fn liveness_probe(handle: Arc<ProcessHandle>, id: ServerId, token: CancellationToken) {
    let mut tick = tokio::time::interval(LIVENESS_PROBE_INTERVAL);
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let mut reported = false;
    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = tick.tick() => {
                if let Some(code) = handle.poll_exit().await {
                    if !reported {
                        debug!("liveness probe: server {id} exited with code {code}");
                        reported = true;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
