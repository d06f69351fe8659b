// SPDX-License-Identifier: MIT

//! Instance record and guarded status transitions.

use crate::id::{PlayerId, ServerId, TemplateName};
use crate::status::{ServerStatus, ServerType};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

/// Caller-supplied options for spawning a dynamic instance.
#[derive(Debug, Clone, Default)]
pub struct SpawnOptions {
    /// Explicit server id; generated from the template prefix when absent.
    pub server_id: Option<ServerId>,
    pub max_players: Option<u32>,
    /// Memory budget as an opaque string, e.g. "2G".
    pub memory: Option<String>,
    /// Opaque caller metadata, attached to the instance unmodified.
    pub metadata: HashMap<String, serde_json::Value>,
}

/// A live (or once-live) backend server instance.
///
/// Mutable fields are written by the supervisor and read by the façade
/// and the health probe; the containing lock provides visibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instance {
    pub server_id: ServerId,
    pub server_type: ServerType,
    pub working_dir: PathBuf,
    pub port: u16,
    pub max_players: u32,
    /// Originating template; `None` for static instances.
    pub template: Option<TemplateName>,
    pub status: ServerStatus,
    pub created_at_ms: u64,
    pub started_at_ms: Option<u64>,
    pub stopped_at_ms: Option<u64>,
    pub last_heartbeat_ms: Option<u64>,
    pub stop_reason: Option<String>,
    pub players: HashSet<PlayerId>,
    /// Opaque metadata bag; the orchestrator never introspects values.
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Instance {
    pub fn new(
        server_id: ServerId,
        server_type: ServerType,
        working_dir: PathBuf,
        port: u16,
        max_players: u32,
        template: Option<TemplateName>,
        created_at_ms: u64,
    ) -> Self {
        Self {
            server_id,
            server_type,
            working_dir,
            port,
            max_players,
            template,
            status: ServerStatus::Created,
            created_at_ms,
            started_at_ms: None,
            stopped_at_ms: None,
            last_heartbeat_ms: None,
            stop_reason: None,
            players: HashSet::new(),
            metadata: HashMap::new(),
        }
    }

    /// Apply a status transition, returning the previous status.
    ///
    /// Terminal statuses are absorbing: the transition is refused and
    /// `None` returned. Entering `Starting` stamps `started_at_ms`;
    /// entering a terminal status stamps `stopped_at_ms`.
    pub fn transition(&mut self, next: ServerStatus, now_ms: u64) -> Option<ServerStatus> {
        if self.status.is_terminal() {
            return None;
        }
        let previous = self.status;
        self.status = next;
        match next {
            ServerStatus::Starting => self.started_at_ms = Some(now_ms),
            ServerStatus::Stopped | ServerStatus::Failed => self.stopped_at_ms = Some(now_ms),
            _ => {}
        }
        Some(previous)
    }

    /// Record a heartbeat from the bridge plugin inside the child.
    pub fn heartbeat(&mut self, now_ms: u64) {
        self.last_heartbeat_ms = Some(now_ms);
    }

    pub fn is_full(&self) -> bool {
        self.players.len() as u32 >= self.max_players
    }

    /// Returns false if the player was already connected.
    pub fn add_player(&mut self, player: PlayerId) -> bool {
        self.players.insert(player)
    }

    /// Returns false if the player was not connected.
    pub fn remove_player(&mut self, player: &PlayerId) -> bool {
        self.players.remove(player)
    }
}

/// Test builder: starts from a plausible freshly-created dynamic
/// instance and lets each case override only what it asserts on.
#[cfg(any(test, feature = "test-support"))]
pub struct InstanceBuilder {
    instance: Instance,
}

#[cfg(any(test, feature = "test-support"))]
impl Instance {
    pub fn builder() -> InstanceBuilder {
        InstanceBuilder {
            instance: Instance::new(
                ServerId::new("test-1"),
                ServerType::Dynamic,
                PathBuf::from("/tmp/test-1"),
                6100,
                16,
                None,
                1_000_000,
            ),
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
impl InstanceBuilder {
    pub fn server_id(mut self, id: impl Into<ServerId>) -> Self {
        self.instance.server_id = id.into();
        self
    }

    pub fn server_type(mut self, server_type: ServerType) -> Self {
        self.instance.server_type = server_type;
        self
    }

    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.instance.working_dir = dir.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.instance.port = port;
        self
    }

    pub fn max_players(mut self, max_players: u32) -> Self {
        self.instance.max_players = max_players;
        self
    }

    /// Set the status directly, bypassing the transition guard.
    pub fn status(mut self, status: ServerStatus) -> Self {
        self.instance.status = status;
        self
    }

    pub fn template(mut self, name: impl Into<TemplateName>) -> Self {
        self.instance.template = Some(name.into());
        self
    }

    pub fn build(self) -> Instance {
        self.instance
    }
}

#[cfg(test)]
#[path = "instance_tests.rs"]
mod tests;
