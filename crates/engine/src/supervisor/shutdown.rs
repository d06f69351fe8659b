// SPDX-License-Identifier: MIT

//! Shutdown transactions: single instance and whole fleet.

use super::InstanceSupervisor;
use crate::FleetError;
use numdrassl_core::{Clock, Event, ServerId, ServerStatus, ServerType, ShutdownReason};
use numdrassl_proc::ProcessAdapter;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Fallback graceful deadline when no template metadata applies.
const DEFAULT_GRACEFUL_DEADLINE: Duration = Duration::from_secs(30);

/// Cap on forced kills outside the graceful path.
const FORCE_KILL_DEADLINE: Duration = Duration::from_secs(5);

/// Overall cap on an orchestrator-wide shutdown.
const FLEET_SHUTDOWN_DEADLINE: Duration = Duration::from_secs(60);

impl<P: ProcessAdapter, C: Clock> InstanceSupervisor<P, C> {
    /// Stop one instance and release everything it holds.
    ///
    /// Unknown ids and repeated calls are benign no-ops.
    pub async fn shutdown_instance(
        &self,
        id: &ServerId,
        force: bool,
        reason: ShutdownReason,
    ) -> Result<(), FleetError> {
        let Some(slot) = self.registry().get(id) else {
            warn!("shutdown requested for unknown server {id}");
            return Ok(());
        };

        {
            let mut instance = slot.lock();
            if instance.status == ServerStatus::Stopping || instance.status.is_terminal() {
                warn!("server {id} is already {}; ignoring shutdown", instance.status);
                return Ok(());
            }
            instance.transition(ServerStatus::Stopping, self.now_ms());
            instance.stop_reason =
                Some(if force { "Forced shutdown" } else { "Graceful shutdown" }.to_string());
        }

        let (port, server_type, working_dir, template) = {
            let instance = slot.lock();
            (
                instance.port,
                instance.server_type,
                instance.working_dir.clone(),
                instance.template.clone(),
            )
        };

        // Graceful deadline comes from template metadata when present;
        // the per-template config is not consulted here
        let deadline = template
            .and_then(|name| self.templates().by_name(name.as_str()))
            .map(|t| Duration::from_secs(t.manifest().graceful_shutdown_timeout))
            .unwrap_or(DEFAULT_GRACEFUL_DEADLINE);

        self.procs().kill(id, !force, deadline).await;
        self.ports().release(port);

        if server_type == ServerType::Dynamic && self.config().dynamic_spawning.auto_cleanup {
            self.cleanup_working_dir(&working_dir);
        }

        slot.lock().transition(ServerStatus::Stopped, self.now_ms());
        self.registry().unregister(id);
        info!("server {id} stopped ({reason})");
        self.events().publish(Event::ServerShutdown {
            server_id: id.clone(),
            reason,
            forced: force,
        });
        Ok(())
    }

    /// Stop every instance, capped at 60 s, then force the laggards.
    pub async fn shutdown_fleet(self: &Arc<Self>) {
        self.shutdown_token().cancel();

        let ids = self.registry().ids();
        info!("fleet shutdown: stopping {} instances", ids.len());
        let mut tasks = tokio::task::JoinSet::new();
        for id in ids {
            let supervisor = Arc::clone(self);
            tasks.spawn(async move {
                if let Err(err) = supervisor
                    .shutdown_instance(&id, false, ShutdownReason::ProxyShutdown)
                    .await
                {
                    warn!("fleet shutdown: {id}: {err}");
                }
            });
        }

        let drained = tokio::time::timeout(FLEET_SHUTDOWN_DEADLINE, async {
            while tasks.join_next().await.is_some() {}
        })
        .await;

        if drained.is_err() {
            warn!(
                "fleet shutdown exceeded {}s, force-killing the remainder",
                FLEET_SHUTDOWN_DEADLINE.as_secs()
            );
            tasks.abort_all();
            for id in self.registry().ids() {
                self.reclaim_forced(&id).await;
            }
        }

        // Kill any residue the per-instance paths missed
        self.procs().shutdown_all().await;
    }

    /// Forced reclamation of one instance during the fleet-shutdown
    /// endgame: no grace, everything released, errors swallowed.
    async fn reclaim_forced(&self, id: &ServerId) {
        let Some(slot) = self.registry().get(id) else {
            return;
        };
        let (port, server_type, working_dir) = {
            let instance = slot.lock();
            (instance.port, instance.server_type, instance.working_dir.clone())
        };

        self.procs().kill(id, false, FORCE_KILL_DEADLINE).await;
        self.ports().release(port);
        if server_type == ServerType::Dynamic && self.config().dynamic_spawning.auto_cleanup {
            self.cleanup_working_dir(&working_dir);
        }
        {
            let mut instance = slot.lock();
            if instance.stop_reason.is_none() {
                instance.stop_reason = Some("Forced shutdown".to_string());
            }
            instance.transition(ServerStatus::Stopped, self.now_ms());
        }
        self.registry().unregister(id);
        self.events().publish(Event::ServerShutdown {
            server_id: id.clone(),
            reason: ShutdownReason::ProxyShutdown,
            forced: true,
        });
    }

    /// Delete a dynamic working directory; mid-life IO failures are
    /// logged, never fatal.
    pub(crate) fn cleanup_working_dir(&self, dir: &Path) {
        match std::fs::remove_dir_all(dir) {
            Ok(()) => info!("removed working directory {}", dir.display()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => warn!("failed to remove {}: {err}", dir.display()),
        }
    }
}
