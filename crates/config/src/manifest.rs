// SPDX-License-Identifier: MIT

//! Template manifest (`templates/<name>/template.yml`).

use crate::ConfigError;
use serde::Deserialize;
use std::path::Path;

/// File name of the manifest inside a template directory.
pub const TEMPLATE_MANIFEST: &str = "template.yml";

/// Metadata describing a template archetype. Every field is optional on
/// disk; defaults below apply when the manifest (or a field) is absent.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TemplateManifest {
    pub name: Option<String>,
    /// Free-form archetype tag (e.g. "minigame"); not interpreted here.
    #[serde(rename = "type")]
    pub template_type: Option<String>,
    pub server_id_prefix: Option<String>,
    pub max_players: u32,
    /// Opaque memory budget string, e.g. "2G".
    pub memory_allocation: String,
    pub world_reset_on_shutdown: bool,
    /// Seconds a child gets to exit on its own before escalation.
    pub graceful_shutdown_timeout: u64,
    pub respawn_location: Option<RespawnLocation>,
    pub server_jar: String,
    pub startup_args: Vec<String>,
}

impl Default for TemplateManifest {
    fn default() -> Self {
        Self {
            name: None,
            template_type: None,
            server_id_prefix: None,
            max_players: 16,
            memory_allocation: "2G".to_string(),
            world_reset_on_shutdown: true,
            graceful_shutdown_timeout: 30,
            respawn_location: None,
            server_jar: "HytaleServer.jar".to_string(),
            startup_args: Vec::new(),
        }
    }
}

impl TemplateManifest {
    /// Load from a YAML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        serde_yaml::from_str(&raw)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    /// Defaults for a template directory without a manifest: the directory
    /// name becomes the template name, its lower-casing the id prefix.
    pub fn synthesised(dir_name: &str) -> Self {
        Self {
            name: Some(dir_name.to_string()),
            server_id_prefix: Some(dir_name.to_lowercase()),
            ..Self::default()
        }
    }

    /// Display name, falling back to the template directory name.
    pub fn display_name<'a>(&'a self, dir_name: &'a str) -> &'a str {
        self.name.as_deref().unwrap_or(dir_name)
    }

    /// Server-id prefix, falling back to the lower-cased directory name.
    pub fn prefix(&self, dir_name: &str) -> String {
        self.server_id_prefix.clone().unwrap_or_else(|| dir_name.to_lowercase())
    }
}

/// World respawn point carried through to the backend config.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct RespawnLocation {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[cfg(test)]
#[path = "manifest_tests.rs"]
mod tests;
