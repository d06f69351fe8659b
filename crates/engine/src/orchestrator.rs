// SPDX-License-Identifier: MIT

//! Operator-facing façade over the instance supervisor.

use crate::event_bus::EventBus;
use crate::layout::ServersLayout;
use crate::registry::RegistryStats;
use crate::supervisor::InstanceSupervisor;
use crate::FleetError;
use numdrassl_config::OrchestratorConfig;
use numdrassl_core::{
    Clock, Event, Instance, ServerId, ShutdownReason, SpawnOptions, SystemClock, TemplateName,
};
use numdrassl_proc::{ProcessAdapter, ProcessMetrics, ProcessSupervisor};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, warn};

/// Serialises operator intents and guards them behind initialisation.
///
/// Every successful state-changing transaction emits an event; queries
/// are snapshots of the registry.
pub struct Orchestrator<P: ProcessAdapter, C: Clock> {
    supervisor: Arc<InstanceSupervisor<P, C>>,
    initialised: AtomicBool,
}

impl Orchestrator<ProcessSupervisor, SystemClock> {
    /// Production wiring: real processes, real clock.
    pub fn from_config(root: impl Into<PathBuf>, config: OrchestratorConfig) -> Self {
        let layout = ServersLayout::new(root);
        let procs = ProcessSupervisor::new(config.java_path.clone(), layout.logs_dir());
        Self::with_parts(layout, config, procs, SystemClock)
    }
}

impl<P: ProcessAdapter, C: Clock> Orchestrator<P, C> {
    pub fn with_parts(
        layout: ServersLayout,
        config: OrchestratorConfig,
        procs: P,
        clock: C,
    ) -> Self {
        let supervisor =
            Arc::new(InstanceSupervisor::new(layout, config, procs, clock, EventBus::new()));
        Self { supervisor, initialised: AtomicBool::new(false) }
    }

    /// Prepare the tree, discover templates, start surveillance, and
    /// boot every `alwaysOn` static server.
    pub async fn init(&self) -> Result<(), FleetError> {
        self.supervisor.init().await?;
        self.supervisor.start_health_probe();
        self.initialised.store(true, Ordering::SeqCst);
        self.start_always_on().await;
        Ok(())
    }

    async fn start_always_on(&self) {
        let ids: Vec<String> = self
            .supervisor
            .config()
            .static_servers
            .iter()
            .filter(|(_, cfg)| cfg.always_on)
            .map(|(id, _)| id.clone())
            .collect();
        for id in ids {
            if let Err(err) = self.supervisor.start_static(&id).await {
                error!("failed to start always-on server {id}: {err}");
            }
        }
    }

    fn ensure_initialised(&self) -> Result<(), FleetError> {
        if self.initialised.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(FleetError::NotInitialised)
        }
    }

    /// Spawn a fresh instance from a template.
    pub async fn spawn_dynamic(
        &self,
        template: &str,
        opts: SpawnOptions,
    ) -> Result<Instance, FleetError> {
        self.ensure_initialised()?;
        self.supervisor.spawn_dynamic(template, opts).await
    }

    /// Start a static server declared in config.
    pub async fn start_static(&self, id: &str) -> Result<Instance, FleetError> {
        self.ensure_initialised()?;
        self.supervisor.start_static(id).await
    }

    /// Stop an instance. Unknown ids are a benign no-op.
    pub async fn shutdown(&self, id: &str, force: bool) -> Result<(), FleetError> {
        self.ensure_initialised()?;
        let server_id = ServerId::new(id);
        if !self.supervisor.registry().contains(&server_id) {
            warn!("shutdown requested for unknown server {id}");
            return Ok(());
        }
        self.supervisor
            .shutdown_instance(&server_id, force, ShutdownReason::AdminRequest)
            .await
    }

    /// Stop and start again, preserving identity.
    pub async fn restart(&self, id: &str) -> Result<Instance, FleetError> {
        self.ensure_initialised()?;
        self.supervisor.restart(&ServerId::new(id)).await
    }

    /// Heartbeat intake from the bridge plugin.
    pub fn on_heartbeat(&self, id: &str) {
        if self.initialised.load(Ordering::SeqCst) {
            self.supervisor.on_heartbeat(&ServerId::new(id));
        }
    }

    /// Stop everything within 60 s, forcing the laggards.
    pub async fn shutdown_fleet(&self) {
        if self.initialised.load(Ordering::SeqCst) {
            self.supervisor.shutdown_fleet().await;
        }
    }

    // -- queries --

    pub fn get(&self, id: &str) -> Option<Instance> {
        self.supervisor.registry().snapshot(&ServerId::new(id))
    }

    pub fn by_port(&self, port: u16) -> Option<Instance> {
        self.supervisor.registry().by_port(port).map(|slot| slot.lock().clone())
    }

    pub fn list(&self) -> Vec<Instance> {
        self.supervisor.registry().list()
    }

    pub fn stats(&self) -> RegistryStats {
        self.supervisor.registry().stats()
    }

    /// Least-loaded joinable instance, optionally from one template.
    pub fn available_server(&self, template: Option<&str>) -> Option<Instance> {
        let template = template.map(TemplateName::new);
        self.supervisor.registry().available_server(template.as_ref())
    }

    /// The configured fallback target, when it is currently joinable.
    pub fn fallback_server(&self) -> Option<Instance> {
        let id = self.supervisor.config().default_fallback_server.as_deref()?;
        self.get(id).filter(|i| i.status.accepting_players() && !i.is_full())
    }

    pub fn process_metrics(&self, id: &str) -> Option<ProcessMetrics> {
        self.supervisor.procs().metrics(&ServerId::new(id))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.supervisor.events().subscribe()
    }

    /// Direct access for embedders and tests.
    pub fn supervisor(&self) -> &Arc<InstanceSupervisor<P, C>> {
        &self.supervisor
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
