// SPDX-License-Identifier: MIT

//! Server type, lifecycle status, and shutdown reason sum types.

use serde::{Deserialize, Serialize};

/// Whether an instance is declared in config or cloned from a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerType {
    /// Working directory pre-exists and is preserved across the lifecycle.
    Static,
    /// Working directory is cloned from a template and reclaimed on shutdown.
    Dynamic,
}

/// Lifecycle status of an instance.
///
/// Transitions are totally ordered per instance; `Stopped` and `Failed`
/// are absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerStatus {
    Created,
    Starting,
    Running,
    Stopping,
    Stopped,
    Failed,
    Unhealthy,
}

impl ServerStatus {
    /// Terminal statuses admit no further transition.
    pub fn is_terminal(self) -> bool {
        matches!(self, ServerStatus::Stopped | ServerStatus::Failed)
    }

    /// Statuses in which a live child process must be attached.
    pub fn process_expected(self) -> bool {
        matches!(
            self,
            ServerStatus::Starting
                | ServerStatus::Running
                | ServerStatus::Stopping
                | ServerStatus::Unhealthy
        )
    }

    /// Only a running instance accepts new players.
    pub fn accepting_players(self) -> bool {
        matches!(self, ServerStatus::Running)
    }
}

crate::wire_display! {
    ServerType {
        Static => "STATIC",
        Dynamic => "DYNAMIC",
    }
}

crate::wire_display! {
    ServerStatus {
        Created => "CREATED",
        Starting => "STARTING",
        Running => "RUNNING",
        Stopping => "STOPPING",
        Stopped => "STOPPED",
        Failed => "FAILED",
        Unhealthy => "UNHEALTHY",
    }
}

/// Why an instance was (or is being) shut down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShutdownReason {
    AdminRequest,
    GameEnded,
    ProcessCrashed,
    HealthCheckFailed,
    ProxyShutdown,
    AutoCleanup,
    Unknown,
}

crate::wire_display! {
    ShutdownReason {
        AdminRequest => "ADMIN_REQUEST",
        GameEnded => "GAME_ENDED",
        ProcessCrashed => "PROCESS_CRASHED",
        HealthCheckFailed => "HEALTH_CHECK_FAILED",
        ProxyShutdown => "PROXY_SHUTDOWN",
        AutoCleanup => "AUTO_CLEANUP",
        Unknown => "UNKNOWN",
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
