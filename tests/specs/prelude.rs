//! Shared harness for the fleet specs.

pub use numdrassl_config::{OrchestratorConfig, StaticServerConfig};
pub use numdrassl_core::{Event, ServerStatus, ServerType, ShutdownReason, SpawnOptions};
pub use numdrassl_engine::{FleetError, Orchestrator, ServersLayout};
pub use std::time::Duration;

use numdrassl_core::SystemClock;
use numdrassl_proc::ProcessSupervisor;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

/// A backend that becomes ready and then idles.
pub const READY_SERVER: &str = "echo \"Server started\"\nexec sleep 300";

/// A backend that dies before ever becoming ready.
pub const DOOMED_SERVER: &str = "exit 1";

/// A servers root with a stub `java` script standing in for the JVM.
///
/// The script ignores the JVM-shaped argument vector and runs its body;
/// spawn, log capture, readiness, and kill paths are all real.
pub struct Fleet {
    root: tempfile::TempDir,
    pub orchestrator: Orchestrator<ProcessSupervisor, SystemClock>,
}

impl Fleet {
    pub async fn start(
        script_body: &str,
        mutate: impl FnOnce(&mut OrchestratorConfig),
    ) -> Fleet {
        let root = tempfile::tempdir().unwrap();
        let java = root.path().join("java");
        std::fs::write(&java, format!("#!/bin/sh\n{script_body}\n")).unwrap();
        std::fs::set_permissions(&java, std::fs::Permissions::from_mode(0o755)).unwrap();

        let mut config = OrchestratorConfig::default();
        config.java_path = java.display().to_string();
        config.process_start_timeout_seconds = 5;
        mutate(&mut config);

        let orchestrator = Orchestrator::from_config(root.path(), config);
        orchestrator.init().await.unwrap();
        Fleet { root, orchestrator }
    }

    pub fn path(&self) -> &Path {
        self.root.path()
    }

    /// Create a valid template and republish the store.
    pub fn add_template(&self, name: &str) {
        let dir = self.root.path().join("templates").join(name);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("HytaleServer.jar"), b"jar").unwrap();
        self.orchestrator.supervisor().templates().reload().unwrap();
    }

    /// Create a static working directory under `static/<id>/`.
    pub fn add_static_dir(&self, id: &str) {
        let dir = self.root.path().join("static").join(id);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("server.jar"), b"jar").unwrap();
    }

    pub fn dynamic_entries(&self) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(self.root.path().join("dynamic")) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .flatten()
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    pub fn taken_ports(&self) -> usize {
        self.orchestrator.supervisor().ports().taken_count()
    }

    /// SIGKILL an instance's process from outside the orchestrator.
    pub fn kill_externally(&self, id: &str) {
        let pid = self.orchestrator.process_metrics(id).unwrap().pid;
        let status = std::process::Command::new("kill")
            .args(["-9", &pid.to_string()])
            .status()
            .unwrap();
        assert!(status.success(), "external kill of pid {pid} failed");
    }
}

/// Poll until `check` passes or `deadline_ms` elapses.
pub async fn wait_for(deadline_ms: u64, mut check: impl FnMut() -> bool) -> bool {
    let mut waited = 0;
    while waited < deadline_ms {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
        waited += 50;
    }
    check()
}
