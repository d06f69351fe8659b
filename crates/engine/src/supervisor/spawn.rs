// SPDX-License-Identifier: MIT

//! Spawn transactions: dynamic (clone + allocate + start) and static.
//!
//! Every acquired resource is tracked by a rollback guard and released
//! on the error path; only a committed transaction keeps its port,
//! directory, and registry entry.

use super::{InstanceSupervisor, Readiness, ENV_PORT, ENV_TEMPLATE};
use crate::ports::PortAllocator;
use crate::templates::Template;
use crate::FleetError;
use indexmap::IndexMap;
use numdrassl_core::{
    Clock, Event, Instance, ServerId, ServerStatus, ServerType, ShutdownReason, SpawnOptions,
    TemplateName,
};
use numdrassl_proc::{ProcessAdapter, SpawnSpec};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Server arguments used when a template declares none.
const DEFAULT_SERVER_ARGS: [&str; 6] =
    ["--assets", "Assets.zip", "--auth-mode", "insecure", "--transport", "QUIC"];

/// Cap on reaping a child whose spawn transaction failed late.
const ABORT_KILL_DEADLINE: Duration = Duration::from_secs(5);

/// Scope-bound compensation for a spawn transaction.
struct Rollback<'a> {
    ports: &'a PortAllocator,
    port: u16,
    clone_dir: Option<PathBuf>,
    committed: bool,
}

impl<'a> Rollback<'a> {
    fn new(ports: &'a PortAllocator, port: u16) -> Self {
        Self { ports, port, clone_dir: None, committed: false }
    }

    fn track_dir(&mut self, dir: PathBuf) {
        self.clone_dir = Some(dir);
    }

    fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for Rollback<'_> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        self.ports.release(self.port);
        if let Some(dir) = &self.clone_dir {
            if let Err(err) = std::fs::remove_dir_all(dir) {
                if err.kind() != std::io::ErrorKind::NotFound {
                    warn!("rollback: failed to delete {}: {err}", dir.display());
                }
            }
        }
    }
}

impl<P: ProcessAdapter, C: Clock> InstanceSupervisor<P, C> {
    /// Spawn a fresh instance from a template.
    pub async fn spawn_dynamic(
        &self,
        template_name: &str,
        opts: SpawnOptions,
    ) -> Result<Instance, FleetError> {
        let spawning = &self.config().dynamic_spawning;
        if !spawning.enabled {
            return Err(FleetError::SpawningDisabled);
        }
        let current = self.registry().count_by_type(ServerType::Dynamic);
        if current as u32 >= spawning.max_concurrent {
            return Err(FleetError::MaxConcurrentReached(spawning.max_concurrent));
        }

        let template = self
            .templates()
            .by_name(template_name)
            .ok_or_else(|| FleetError::TemplateNotFound(TemplateName::new(template_name)))?;
        if !template.is_valid() {
            return Err(FleetError::TemplateInvalid(
                template.name().clone(),
                template.errors().join("; "),
            ));
        }
        let template_cfg = self.config().template_config(template.name().as_str());

        let server_id = match opts.server_id {
            Some(id) => id,
            None => self.id_gen.next(&template.prefix()),
        };
        if self.registry().contains(&server_id) {
            return Err(FleetError::DuplicateServerId(server_id));
        }

        let (lo, hi) = template_cfg.port_range(&self.config().port_allocation);
        if self.ports().available_in_range(lo, hi) < spawning.min_available_ports {
            return Err(FleetError::PortExhausted { lo, hi });
        }
        let port = self
            .ports()
            .acquire_in_range(lo, hi)
            .ok_or(FleetError::PortExhausted { lo, hi })?;
        let mut rollback = Rollback::new(self.ports(), port);

        let max_players = opts
            .max_players
            .or(template_cfg.max_players)
            .unwrap_or(template.manifest().max_players);
        let memory = opts
            .memory
            .clone()
            .or_else(|| template_cfg.memory.clone())
            .unwrap_or_else(|| template.manifest().memory_allocation.clone());

        let dest = self.layout().dynamic_dir().join(server_id.as_str());
        if dest.exists() {
            return Err(FleetError::DestinationExists(dest));
        }
        let mut overrides = IndexMap::new();
        overrides.insert("server-port".to_string(), serde_yaml::Value::from(port));
        overrides
            .insert("server-id".to_string(), serde_yaml::Value::from(server_id.as_str()));
        overrides.insert("max-players".to_string(), serde_yaml::Value::from(max_players));

        // Track the clone before copying: a partial copy is ours to delete
        rollback.track_dir(dest.clone());
        clone_template(&template, dest.clone(), overrides).await?;

        let mut env: Vec<(String, String)> = template_cfg
            .environment
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        env.push((ENV_PORT.to_string(), port.to_string()));
        env.push((ENV_TEMPLATE.to_string(), template.name().to_string()));

        let mut instance = Instance::new(
            server_id.clone(),
            ServerType::Dynamic,
            dest.clone(),
            port,
            max_players,
            Some(template.name().clone()),
            self.now_ms(),
        );
        instance.metadata = opts.metadata;

        let spec = SpawnSpec {
            server_id: server_id.clone(),
            working_dir: dest,
            memory,
            exec_file: Some(template.manifest().server_jar.clone()),
            jvm_args: template_cfg.jvm_args.clone(),
            server_args: server_args(&template.manifest().startup_args, port),
            env,
            dynamic: true,
        };
        self.procs().spawn(spec).await?;
        instance.transition(ServerStatus::Starting, self.now_ms());

        self.complete_spawn(instance, rollback).await
    }

    /// Start a static server declared in config.
    pub async fn start_static(&self, id_str: &str) -> Result<Instance, FleetError> {
        let static_cfg = self
            .config()
            .static_servers
            .get(id_str)
            .cloned()
            .ok_or_else(|| FleetError::StaticNotDeclared(id_str.to_string()))?;
        let server_id = ServerId::new(id_str);

        if let Some(existing) = self.registry().snapshot(&server_id) {
            if existing.status.is_terminal() {
                // A crashed static stays registered as FAILED until the
                // operator starts it again; reclaim its slot now
                self.registry().unregister(&server_id);
                self.ports().release(existing.port);
            } else {
                return Err(FleetError::DuplicateServerId(server_id));
            }
        }

        let working_dir = self.layout().static_dir().join(id_str);
        if !working_dir.is_dir() {
            return Err(FleetError::WorkingDirMissing(working_dir));
        }
        if !self.ports().acquire_specific(static_cfg.port) {
            return Err(FleetError::PortTaken(static_cfg.port));
        }
        let rollback = Rollback::new(self.ports(), static_cfg.port);

        let mut env: Vec<(String, String)> = static_cfg
            .environment
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        env.push((ENV_PORT.to_string(), static_cfg.port.to_string()));

        let mut instance = Instance::new(
            server_id.clone(),
            ServerType::Static,
            working_dir.clone(),
            static_cfg.port,
            static_cfg.max_players,
            None,
            self.now_ms(),
        );

        let spec = SpawnSpec {
            server_id,
            working_dir,
            memory: static_cfg.memory.clone(),
            exec_file: None,
            jvm_args: static_cfg.jvm_args.clone(),
            server_args: server_args(&[], static_cfg.port),
            env,
            dynamic: false,
        };
        self.procs().spawn(spec).await?;
        instance.transition(ServerStatus::Starting, self.now_ms());

        self.complete_spawn(instance, rollback).await
    }

    /// Shared tail of both spawn paths: readiness scan, registration,
    /// commit, event emission.
    async fn complete_spawn(
        &self,
        mut instance: Instance,
        rollback: Rollback<'_>,
    ) -> Result<Instance, FleetError> {
        let server_id = instance.server_id.clone();
        match self.await_readiness(&server_id).await {
            Readiness::Ready => {
                instance.transition(ServerStatus::Running, self.now_ms());
            }
            Readiness::AssumedReady => {
                warn!("server {server_id}: startup timeout, assuming ready");
                instance.transition(ServerStatus::Running, self.now_ms());
            }
            Readiness::Dead(reason) => {
                instance.transition(ServerStatus::Failed, self.now_ms());
                instance.stop_reason = Some(reason.clone());
                // Untrack whatever is left of the child
                self.procs().kill(&server_id, false, ABORT_KILL_DEADLINE).await;
                return Err(FleetError::StartupFailed(reason));
            }
        }

        match self.registry().register(instance.clone()) {
            Ok(_) => {}
            Err(err) => {
                // Lost a commit race; reap the child before rolling back
                self.procs().kill(&server_id, false, ABORT_KILL_DEADLINE).await;
                return Err(err);
            }
        }
        rollback.commit();

        info!(
            "server {server_id} is running on port {} ({})",
            instance.port, instance.server_type
        );
        self.events().publish(Event::ServerSpawn {
            server_id,
            server_type: instance.server_type,
            port: instance.port,
            template: instance.template.clone(),
        });
        Ok(instance)
    }

    /// Shutdown followed by a fresh start, preserving identity.
    pub async fn restart(&self, id: &ServerId) -> Result<Instance, FleetError> {
        let snapshot = self
            .registry()
            .snapshot(id)
            .ok_or_else(|| FleetError::UnknownServer(id.clone()))?;

        match snapshot.server_type {
            ServerType::Static => {
                self.shutdown_instance(id, false, ShutdownReason::AdminRequest).await?;
                self.start_static(id.as_str()).await
            }
            ServerType::Dynamic => {
                let template = snapshot
                    .template
                    .clone()
                    .ok_or_else(|| FleetError::NoTemplateReference(id.clone()))?;
                self.shutdown_instance(id, false, ShutdownReason::AdminRequest).await?;
                let opts = SpawnOptions {
                    server_id: Some(id.clone()),
                    max_players: Some(snapshot.max_players),
                    ..SpawnOptions::default()
                };
                self.spawn_dynamic(template.as_str(), opts).await
            }
        }
    }
}

/// Template startup args (or the defaults), always bound to the port.
fn server_args(startup_args: &[String], port: u16) -> Vec<String> {
    let mut args: Vec<String> = if startup_args.is_empty() {
        DEFAULT_SERVER_ARGS.iter().map(|s| s.to_string()).collect()
    } else {
        startup_args.to_vec()
    };
    args.push("--bind".to_string());
    args.push(port.to_string());
    args
}

/// Clone on the blocking pool; template trees can be large.
async fn clone_template(
    template: &Arc<Template>,
    dest: PathBuf,
    overrides: IndexMap<String, serde_yaml::Value>,
) -> Result<(), FleetError> {
    let template = Arc::clone(template);
    tokio::task::spawn_blocking(move || template.clone_to(&dest, &overrides))
        .await
        .map_err(|err| FleetError::StartupFailed(format!("clone task failed: {err}")))?
}
