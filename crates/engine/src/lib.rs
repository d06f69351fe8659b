// SPDX-License-Identifier: MIT

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! numdrassl-engine: the instance supervisor and its collaborators.
//!
//! Couples template materialisation, port allocation, process spawning,
//! the per-instance state machine (readiness scan + health probe), and
//! the registry behind an operator-facing façade.

mod event_bus;
mod layout;
mod orchestrator;
mod ports;
mod registry;
mod supervisor;
mod templates;

pub use event_bus::EventBus;
pub use layout::ServersLayout;
pub use orchestrator::Orchestrator;
pub use ports::PortAllocator;
pub use registry::{Registry, RegistryStats};
pub use supervisor::{InstanceSupervisor, ENV_PORT, ENV_TEMPLATE};
pub use templates::{Template, TemplateStore, SERVER_CONFIG};

use numdrassl_config::ConfigError;
use numdrassl_core::{ServerId, TemplateName};
use numdrassl_proc::ProcError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors crossing the façade boundary.
///
/// Precondition variants report without state change; IO during a spawn
/// transaction triggers full rollback; runtime variants mean the
/// instance went FAILED and its resources were released.
#[derive(Debug, Error)]
pub enum FleetError {
    #[error("orchestrator is not initialised")]
    NotInitialised,

    #[error("template not found: {0}")]
    TemplateNotFound(TemplateName),

    #[error("template {0} failed validation: {1}")]
    TemplateInvalid(TemplateName, String),

    #[error("unknown server: {0}")]
    UnknownServer(ServerId),

    #[error("server id already in use: {0}")]
    DuplicateServerId(ServerId),

    #[error("port already registered: {0}")]
    DuplicatePort(u16),

    #[error("dynamic spawning is disabled")]
    SpawningDisabled,

    #[error("maximum concurrent dynamic servers reached ({0})")]
    MaxConcurrentReached(u32),

    #[error("no free port in range {lo}-{hi}")]
    PortExhausted { lo: u16, hi: u16 },

    #[error("port {0} is already taken")]
    PortTaken(u16),

    #[error("static server {0} is not declared in config")]
    StaticNotDeclared(String),

    #[error("working directory {0} does not exist")]
    WorkingDirMissing(PathBuf),

    #[error("destination already exists: {0}")]
    DestinationExists(PathBuf),

    #[error("server {0} has no template reference")]
    NoTemplateReference(ServerId),

    #[error("startup failed: {0}")]
    StartupFailed(String),

    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Process(#[from] ProcError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl FleetError {
    fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}
