// SPDX-License-Identifier: MIT

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! numdrassl-proc: child-process supervision for backend servers.
//!
//! Spawns `java -jar` children with a constructed argument vector,
//! captures their combined output into a per-server log file and a
//! bounded in-memory ring, probes liveness, and terminates them
//! gracefully or forcibly.

mod adapter;
mod artifact;
mod handle;
mod ring;
mod supervisor;

#[cfg(any(test, feature = "test-support"))]
pub mod fake;

pub use adapter::{ProcessAdapter, ProcessMetrics, SpawnSpec, SpawnedProcess};
pub use artifact::resolve_server_artifact;
pub use handle::ProcessHandle;
pub use ring::LogRing;
pub use supervisor::{ProcessSupervisor, ENV_MEMORY, ENV_SERVER_ID};

use numdrassl_core::ServerId;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProcError {
    #[error("server {0} already has a tracked process")]
    AlreadyTracked(ServerId),

    #[error("working directory {0} does not exist")]
    WorkingDirMissing(PathBuf),

    #[error("no server artifact found in {0}")]
    NoArtifact(PathBuf),

    #[error("failed to open log file {path}: {source}")]
    LogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to start process for {id}: {source}")]
    Start {
        id: ServerId,
        #[source]
        source: std::io::Error,
    },
}
