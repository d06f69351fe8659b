// SPDX-License-Identifier: MIT

//! Instance supervisor: owns the per-instance state machine and the
//! spawn/shutdown/restart transactions.

mod health;
mod readiness;
mod shutdown;
mod spawn;

pub(crate) use readiness::Readiness;

use crate::event_bus::EventBus;
use crate::layout::ServersLayout;
use crate::ports::PortAllocator;
use crate::registry::Registry;
use crate::templates::TemplateStore;
use crate::FleetError;
use numdrassl_config::OrchestratorConfig;
use numdrassl_core::{Clock, ServerIdGen};
use numdrassl_proc::ProcessAdapter;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Environment variable carrying the allocated port into the child.
pub const ENV_PORT: &str = "NUMDRASSL_PORT";
/// Environment variable carrying the originating template name.
pub const ENV_TEMPLATE: &str = "NUMDRASSL_TEMPLATE";

/// Orchestrates instances over a process backend `P`.
pub struct InstanceSupervisor<P: ProcessAdapter, C: Clock> {
    config: OrchestratorConfig,
    layout: ServersLayout,
    templates: TemplateStore,
    ports: PortAllocator,
    registry: Registry,
    procs: P,
    clock: C,
    events: EventBus,
    id_gen: ServerIdGen,
    shutdown_token: CancellationToken,
}

impl<P: ProcessAdapter, C: Clock> InstanceSupervisor<P, C> {
    pub fn new(
        layout: ServersLayout,
        config: OrchestratorConfig,
        procs: P,
        clock: C,
        events: EventBus,
    ) -> Self {
        let templates = TemplateStore::new(layout.templates_dir());
        let ports = PortAllocator::new(&config.port_allocation);
        Self {
            config,
            layout,
            templates,
            ports,
            registry: Registry::new(),
            procs,
            clock,
            events,
            id_gen: ServerIdGen::new(),
            shutdown_token: CancellationToken::new(),
        }
    }

    /// Prepare the servers tree: create layout directories, purge
    /// dynamic residue from a prior run, discover templates.
    pub async fn init(&self) -> Result<(), FleetError> {
        self.layout
            .ensure_dirs()
            .map_err(|source| FleetError::io(self.layout.root(), source))?;
        self.purge_dynamic_root();
        let count = self.templates.reload()?;
        info!("discovered {count} templates");
        Ok(())
    }

    /// Residue from a prior process cannot be adopted and must not
    /// accumulate.
    fn purge_dynamic_root(&self) {
        let dynamic = self.layout.dynamic_dir();
        let Ok(entries) = std::fs::read_dir(&dynamic) else {
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            let result = if path.is_dir() {
                std::fs::remove_dir_all(&path)
            } else {
                std::fs::remove_file(&path)
            };
            match result {
                Ok(()) => info!("purged stale dynamic entry {}", path.display()),
                Err(err) => warn!("failed to purge {}: {err}", path.display()),
            }
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn layout(&self) -> &ServersLayout {
        &self.layout
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn templates(&self) -> &TemplateStore {
        &self.templates
    }

    pub fn ports(&self) -> &PortAllocator {
        &self.ports
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn procs(&self) -> &P {
        &self.procs
    }

    pub(crate) fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown_token
    }

    pub(crate) fn now_ms(&self) -> u64 {
        self.clock.epoch_ms()
    }
}

#[cfg(test)]
#[path = "test_support.rs"]
pub(crate) mod test_support;
