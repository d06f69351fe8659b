// SPDX-License-Identifier: MIT

//! Shared fixtures for supervisor and façade tests.

use crate::event_bus::EventBus;
use crate::layout::ServersLayout;
use crate::supervisor::InstanceSupervisor;
use numdrassl_config::OrchestratorConfig;
use numdrassl_core::FakeClock;
use numdrassl_proc::fake::FakeProcessAdapter;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

pub(crate) type TestSupervisor = InstanceSupervisor<FakeProcessAdapter, FakeClock>;

pub(crate) struct Fixture {
    pub root: TempDir,
    pub supervisor: Arc<TestSupervisor>,
    pub procs: FakeProcessAdapter,
    pub clock: FakeClock,
    pub bus: EventBus,
}

impl Fixture {
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    pub async fn with_config(mutate: impl FnOnce(&mut OrchestratorConfig)) -> Self {
        let root = tempfile::tempdir().unwrap();
        let layout = ServersLayout::new(root.path());
        let mut config = OrchestratorConfig::default();
        mutate(&mut config);
        let procs = FakeProcessAdapter::new();
        let clock = FakeClock::new();
        let bus = EventBus::new();
        let supervisor = Arc::new(InstanceSupervisor::new(
            layout,
            config,
            procs.clone(),
            clock.clone(),
            bus.clone(),
        ));
        supervisor.init().await.unwrap();
        Self { root, supervisor, procs, clock, bus }
    }

    /// Create a valid template directory and republish the store.
    pub fn add_template(&self, name: &str) {
        write_template(self.root.path(), name, None);
        self.supervisor.templates().reload().unwrap();
    }

    pub fn add_template_with_manifest(&self, name: &str, manifest: &str) {
        write_template(self.root.path(), name, Some(manifest));
        self.supervisor.templates().reload().unwrap();
    }

    /// Create a static working directory under `static/<id>/`.
    pub fn add_static_dir(&self, id: &str) {
        let dir = self.root.path().join("static").join(id);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("server.jar"), b"jar").unwrap();
    }

    pub fn dynamic_entries(&self) -> Vec<String> {
        let dir = self.root.path().join("dynamic");
        let Ok(entries) = std::fs::read_dir(dir) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .flatten()
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

/// Write a template directory (jar + optional manifest) under `templates/`.
pub(crate) fn write_template(root: &Path, name: &str, manifest: Option<&str>) {
    let dir = root.join("templates").join(name);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("HytaleServer.jar"), b"jar").unwrap();
    if let Some(yaml) = manifest {
        std::fs::write(dir.join("template.yml"), yaml).unwrap();
    }
}

/// Poll until `check` passes or ~2 s elapse; spawned cleanup tasks need
/// scheduler turns to finish.
pub(crate) async fn wait_for(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
