// SPDX-License-Identifier: MIT

//! Periodic fleet health probe and heartbeat intake.

use super::InstanceSupervisor;
use numdrassl_core::{Clock, Event, ServerId, ServerStatus, ServerType, ShutdownReason};
use numdrassl_proc::ProcessAdapter;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Heartbeats older than this many probe intervals flip RUNNING→UNHEALTHY.
const HEARTBEAT_OVERDUE_INTERVALS: u64 = 3;

const FORCE_KILL_DEADLINE: Duration = Duration::from_secs(5);

impl<P: ProcessAdapter, C: Clock> InstanceSupervisor<P, C> {
    /// Start the background probe; it stops with the supervisor.
    pub fn start_health_probe(self: &Arc<Self>) {
        let supervisor = Arc::clone(self);
        tokio::spawn(async move {
            let period =
                Duration::from_secs(supervisor.config().health_check_interval_seconds.max(1));
            let mut tick = tokio::time::interval(period);
            tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // interval fires immediately; skip the zeroth tick
            tick.tick().await;
            loop {
                tokio::select! {
                    _ = supervisor.shutdown_token().cancelled() => break,
                    _ = tick.tick() => supervisor.check_fleet_health().await,
                }
            }
        });
    }

    /// One probe pass over every RUNNING instance.
    pub async fn check_fleet_health(self: &Arc<Self>) {
        let overdue_ms = HEARTBEAT_OVERDUE_INTERVALS
            * self.config().health_check_interval_seconds
            * 1000;

        for snapshot in self.registry().by_status(ServerStatus::Running) {
            let id = snapshot.server_id.clone();
            if !self.procs().is_alive(&id) {
                self.on_process_died(&id).await;
                continue;
            }
            // An instance that never heartbeats stays RUNNING; only a
            // seen-then-silent bridge is flagged
            if let Some(last) = snapshot.last_heartbeat_ms {
                if self.clock.since_ms(last) > overdue_ms {
                    self.mark_unhealthy(&id);
                }
            }
        }
    }

    /// Heartbeat from the bridge plugin inside the child.
    pub fn on_heartbeat(&self, id: &ServerId) {
        let Some(slot) = self.registry().get(id) else {
            warn!("heartbeat from unknown server {id}");
            return;
        };
        let now = self.now_ms();
        let recovered = {
            let mut instance = slot.lock();
            instance.heartbeat(now);
            if instance.status == ServerStatus::Unhealthy {
                instance.transition(ServerStatus::Running, now);
                true
            } else {
                false
            }
        };
        if recovered {
            info!("server {id} recovered (heartbeat received)");
            self.events().publish(Event::ServerHealth {
                server_id: id.clone(),
                previous: ServerStatus::Unhealthy,
                new: ServerStatus::Running,
                message: None,
            });
        }
    }

    async fn on_process_died(self: &Arc<Self>, id: &ServerId) {
        let Some(slot) = self.registry().get(id) else {
            return;
        };
        let (server_type, previous) = {
            let mut instance = slot.lock();
            let Some(previous) = instance.transition(ServerStatus::Failed, self.now_ms())
            else {
                return;
            };
            instance.stop_reason = Some("Process died".to_string());
            (instance.server_type, previous)
        };

        warn!("server {id}: process died");
        self.events().publish(Event::ServerHealth {
            server_id: id.clone(),
            previous,
            new: ServerStatus::Failed,
            message: Some("Process died".to_string()),
        });

        // Static working directories are preserved; the instance stays
        // registered as FAILED until the operator restarts it
        if server_type == ServerType::Dynamic {
            let supervisor = Arc::clone(self);
            let id = id.clone();
            tokio::spawn(async move {
                supervisor.cleanup_crashed_dynamic(id).await;
            });
        }
    }

    /// Forced cleanup of a crashed dynamic instance, optionally delayed
    /// by the template's `autoCleanupDelaySeconds`.
    pub(crate) async fn cleanup_crashed_dynamic(self: Arc<Self>, id: ServerId) {
        let delay = self
            .registry()
            .snapshot(&id)
            .and_then(|i| i.template)
            .map(|t| self.config().template_config(t.as_str()).auto_cleanup_delay_seconds)
            .unwrap_or(0);
        if delay > 0 {
            tokio::time::sleep(Duration::from_secs(delay)).await;
        }

        // Untrack whatever the process table still holds
        self.procs().kill(&id, false, FORCE_KILL_DEADLINE).await;

        let Some(slot) = self.registry().unregister(&id) else {
            return;
        };
        let (port, working_dir) = {
            let instance = slot.lock();
            (instance.port, instance.working_dir.clone())
        };
        self.ports().release(port);
        if self.config().dynamic_spawning.auto_cleanup {
            self.cleanup_working_dir(&working_dir);
        }
        self.events().publish(Event::ServerShutdown {
            server_id: id,
            reason: ShutdownReason::ProcessCrashed,
            forced: true,
        });
    }

    /// RUNNING→UNHEALTHY on an overdue heartbeat.
    fn mark_unhealthy(&self, id: &ServerId) {
        let Some(slot) = self.registry().get(id) else {
            return;
        };
        {
            let mut instance = slot.lock();
            if instance.status != ServerStatus::Running {
                return;
            }
            instance.transition(ServerStatus::Unhealthy, self.now_ms());
        }
        warn!("server {id}: heartbeat overdue, marking unhealthy");
        self.events().publish(Event::ServerHealth {
            server_id: id.clone(),
            previous: ServerStatus::Running,
            new: ServerStatus::Unhealthy,
            message: Some("heartbeat overdue".to_string()),
        });
    }
}
