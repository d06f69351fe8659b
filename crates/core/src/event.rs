// SPDX-License-Identifier: MIT

//! Lifecycle events emitted by the façade after committed transactions.

use crate::id::{ServerId, TemplateName};
use crate::status::{ServerStatus, ServerType, ShutdownReason};
use serde::{Deserialize, Serialize};

/// Events published to plugin subscribers.
///
/// Serializes with `{"type": "server:name", ...fields}` format. Delivery
/// is the subscriber's concern; payloads are the stable contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// An instance reached RUNNING (or was assumed ready) after a spawn.
    #[serde(rename = "server:spawn")]
    ServerSpawn {
        server_id: ServerId,
        server_type: ServerType,
        port: u16,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        template: Option<TemplateName>,
    },

    /// An instance left the registry.
    #[serde(rename = "server:shutdown")]
    ServerShutdown {
        server_id: ServerId,
        reason: ShutdownReason,
        forced: bool,
    },

    /// An instance changed health status (RUNNING ↔ UNHEALTHY, → FAILED).
    #[serde(rename = "server:health")]
    ServerHealth {
        server_id: ServerId,
        previous: ServerStatus,
        new: ServerStatus,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::ServerSpawn { .. } => "server:spawn",
            Event::ServerShutdown { .. } => "server:shutdown",
            Event::ServerHealth { .. } => "server:health",
        }
    }

    pub fn server_id(&self) -> &ServerId {
        match self {
            Event::ServerSpawn { server_id, .. }
            | Event::ServerShutdown { server_id, .. }
            | Event::ServerHealth { server_id, .. } => server_id,
        }
    }

    /// One-line summary for the event log.
    pub fn log_summary(&self) -> String {
        let t = self.name();
        match self {
            Event::ServerSpawn { server_id, server_type, port, template } => match template {
                Some(template) => {
                    format!("{t} id={server_id} type={server_type} port={port} template={template}")
                }
                None => format!("{t} id={server_id} type={server_type} port={port}"),
            },
            Event::ServerShutdown { server_id, reason, forced } => {
                format!("{t} id={server_id} reason={reason} forced={forced}")
            }
            Event::ServerHealth { server_id, previous, new, .. } => {
                format!("{t} id={server_id} {previous}->{new}")
            }
        }
    }

    /// True for a health event reporting recovery from UNHEALTHY.
    pub fn recovered(&self) -> bool {
        matches!(
            self,
            Event::ServerHealth {
                previous: ServerStatus::Unhealthy,
                new: ServerStatus::Running,
                ..
            }
        )
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
