// SPDX-License-Identifier: MIT

//! Scriptable process adapter for tests.

use crate::adapter::{ProcessAdapter, ProcessMetrics, SpawnSpec, SpawnedProcess};
use crate::ProcError;
use async_trait::async_trait;
use numdrassl_core::ServerId;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// One recorded `kill` call.
#[derive(Debug, Clone)]
pub struct KillRecord {
    pub id: ServerId,
    pub graceful: bool,
    pub deadline: Duration,
}

#[derive(Debug)]
struct FakeProc {
    pid: u32,
    alive: bool,
    lines: Vec<String>,
}

#[derive(Debug, Default)]
struct FakeState {
    procs: HashMap<ServerId, FakeProc>,
    spawned: Vec<SpawnSpec>,
    kills: Vec<KillRecord>,
    refuse_spawns: bool,
    die_on_spawn: bool,
    ready_lines: Vec<String>,
    next_pid: u32,
}

/// In-memory stand-in for [`crate::ProcessSupervisor`].
///
/// Spawned "processes" immediately show `ready_lines` in their logs
/// (default: one readiness marker) and stay alive until killed or
/// scripted dead.
#[derive(Clone)]
pub struct FakeProcessAdapter {
    state: Arc<Mutex<FakeState>>,
}

impl FakeProcessAdapter {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeState {
                ready_lines: vec!["Server started".to_string()],
                next_pid: 1000,
                ..FakeState::default()
            })),
        }
    }

    /// Lines every subsequently spawned process reports immediately.
    pub fn set_ready_lines(&self, lines: Vec<String>) {
        self.state.lock().ready_lines = lines;
    }

    /// Make subsequent spawns fail with a start error.
    pub fn refuse_spawns(&self, refuse: bool) {
        self.state.lock().refuse_spawns = refuse;
    }

    /// Make subsequently spawned processes dead on arrival.
    pub fn die_on_spawn(&self, die: bool) {
        self.state.lock().die_on_spawn = die;
    }

    /// Append output lines to a live fake process.
    pub fn push_lines(&self, id: &ServerId, lines: &[&str]) {
        if let Some(proc) = self.state.lock().procs.get_mut(id) {
            proc.lines.extend(lines.iter().map(|l| l.to_string()));
        }
    }

    /// Script a process death without a kill call.
    pub fn mark_dead(&self, id: &ServerId) {
        if let Some(proc) = self.state.lock().procs.get_mut(id) {
            proc.alive = false;
        }
    }

    pub fn is_tracked(&self, id: &ServerId) -> bool {
        self.state.lock().procs.contains_key(id)
    }

    pub fn spawned(&self) -> Vec<SpawnSpec> {
        self.state.lock().spawned.clone()
    }

    pub fn kills(&self) -> Vec<KillRecord> {
        self.state.lock().kills.clone()
    }
}

impl Default for FakeProcessAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProcessAdapter for FakeProcessAdapter {
    async fn spawn(&self, spec: SpawnSpec) -> Result<SpawnedProcess, ProcError> {
        let mut state = self.state.lock();
        if state.refuse_spawns {
            return Err(ProcError::Start {
                id: spec.server_id.clone(),
                source: std::io::Error::other("injected spawn failure"),
            });
        }
        if state.procs.contains_key(&spec.server_id) {
            return Err(ProcError::AlreadyTracked(spec.server_id));
        }
        state.next_pid += 1;
        let pid = state.next_pid;
        let proc = FakeProc {
            pid,
            alive: !state.die_on_spawn,
            lines: state.ready_lines.clone(),
        };
        let log_path = spec.working_dir.join(format!("{}.log", spec.server_id));
        state.procs.insert(spec.server_id.clone(), proc);
        state.spawned.push(spec);
        Ok(SpawnedProcess { pid, log_path })
    }

    async fn kill(&self, id: &ServerId, graceful: bool, deadline: Duration) -> bool {
        let mut state = self.state.lock();
        state.kills.push(KillRecord { id: id.clone(), graceful, deadline });
        state.procs.remove(id).is_some()
    }

    fn is_alive(&self, id: &ServerId) -> bool {
        self.state.lock().procs.get(id).map(|p| p.alive).unwrap_or(false)
    }

    fn recent_logs(&self, id: &ServerId, n: usize) -> Vec<String> {
        let state = self.state.lock();
        let Some(proc) = state.procs.get(id) else {
            return Vec::new();
        };
        let skip = proc.lines.len().saturating_sub(n);
        proc.lines.iter().skip(skip).cloned().collect()
    }

    fn metrics(&self, id: &ServerId) -> Option<ProcessMetrics> {
        let state = self.state.lock();
        let proc = state.procs.get(id)?;
        Some(ProcessMetrics {
            pid: proc.pid,
            started_at_ms: 0,
            uptime_ms: 0,
            cpu_percent: None,
            memory_bytes: None,
        })
    }

    async fn shutdown_all(&self) {
        let ids: Vec<ServerId> = self.state.lock().procs.keys().cloned().collect();
        for id in ids {
            self.kill(&id, true, Duration::from_secs(10)).await;
        }
    }
}
