// SPDX-License-Identifier: MIT

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! numdrassl-config: typed configuration loaded from the `servers/` tree.
//!
//! Two documents are consumed: the orchestrator config at
//! `servers/config.yml` and the optional per-template manifest at
//! `templates/<name>/template.yml`. Unknown fields are tolerated in both.

mod manifest;
mod orchestrator;

pub use manifest::{RespawnLocation, TemplateManifest, TEMPLATE_MANIFEST};
pub use orchestrator::{
    DynamicSpawning, OrchestratorConfig, PortAllocation, StaticServerConfig, TemplateConfig,
    ORCHESTRATOR_CONFIG,
};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}
