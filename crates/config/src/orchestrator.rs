// SPDX-License-Identifier: MIT

//! Orchestrator configuration (`servers/config.yml`).

use crate::ConfigError;
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::Path;

/// File name of the orchestrator config inside the servers root.
pub const ORCHESTRATOR_CONFIG: &str = "config.yml";

/// Top-level orchestrator configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrchestratorConfig {
    /// Java executable used to launch every backend.
    pub java_path: String,
    /// Server id the proxy should route to when no target is known.
    pub default_fallback_server: Option<String>,
    pub health_check_interval_seconds: u64,
    pub process_start_timeout_seconds: u64,
    pub dynamic_spawning: DynamicSpawning,
    pub port_allocation: PortAllocation,
    pub static_servers: IndexMap<String, StaticServerConfig>,
    pub templates: IndexMap<String, TemplateConfig>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            java_path: "java".to_string(),
            default_fallback_server: None,
            health_check_interval_seconds: 30,
            process_start_timeout_seconds: 60,
            dynamic_spawning: DynamicSpawning::default(),
            port_allocation: PortAllocation::default(),
            static_servers: IndexMap::new(),
            templates: IndexMap::new(),
        }
    }
}

impl OrchestratorConfig {
    /// Load from a YAML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        serde_yaml::from_str(&raw)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    /// Load from a YAML file, falling back to defaults when absent.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Per-template config, synthesising an empty one when undeclared.
    pub fn template_config(&self, name: &str) -> TemplateConfig {
        self.templates.get(name).cloned().unwrap_or_default()
    }
}

/// Controls for on-demand template instances.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DynamicSpawning {
    pub enabled: bool,
    /// Delete a dynamic instance's working directory on shutdown.
    pub auto_cleanup: bool,
    pub max_concurrent: u32,
    /// Refuse to spawn when fewer dynamic ports than this remain free.
    pub min_available_ports: u32,
}

impl Default for DynamicSpawning {
    fn default() -> Self {
        Self { enabled: true, auto_cleanup: true, max_concurrent: 10, min_available_ports: 1 }
    }
}

/// Disjoint listening-port ranges for static and dynamic instances.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PortAllocation {
    pub static_range_start: u16,
    pub static_range_end: u16,
    pub dynamic_range_start: u16,
    pub dynamic_range_end: u16,
}

impl Default for PortAllocation {
    fn default() -> Self {
        Self {
            static_range_start: 6000,
            static_range_end: 6099,
            dynamic_range_start: 6100,
            dynamic_range_end: 6200,
        }
    }
}

/// A persistent server declared in configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StaticServerConfig {
    /// Fixed listening port; must lie in the static range.
    pub port: u16,
    pub max_players: u32,
    /// Started during orchestrator boot.
    pub always_on: bool,
    pub memory: String,
    pub jvm_args: Vec<String>,
    pub environment: IndexMap<String, String>,
}

impl Default for StaticServerConfig {
    fn default() -> Self {
        Self {
            port: 0,
            max_players: 16,
            always_on: false,
            memory: "2G".to_string(),
            jvm_args: Vec::new(),
            environment: IndexMap::new(),
        }
    }
}

/// Per-template overrides layered over the template manifest.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TemplateConfig {
    pub display_name: Option<String>,
    pub max_players: Option<u32>,
    pub port_range_start: Option<u16>,
    pub port_range_end: Option<u16>,
    pub memory: Option<String>,
    pub world_reset: Option<bool>,
    /// Delay before the health probe reclaims a crashed dynamic instance.
    pub auto_cleanup_delay_seconds: u64,
    pub graceful_shutdown_timeout_seconds: Option<u64>,
    pub jvm_args: Vec<String>,
    pub environment: IndexMap<String, String>,
}

impl TemplateConfig {
    /// Port range for this template, defaulting to the global dynamic range.
    pub fn port_range(&self, defaults: &PortAllocation) -> (u16, u16) {
        (
            self.port_range_start.unwrap_or(defaults.dynamic_range_start),
            self.port_range_end.unwrap_or(defaults.dynamic_range_end),
        )
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
