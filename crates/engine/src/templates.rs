// SPDX-License-Identifier: MIT

//! Template discovery, validation, and materialisation.

use crate::FleetError;
use indexmap::IndexMap;
use numdrassl_config::{TemplateManifest, TEMPLATE_MANIFEST};
use numdrassl_core::TemplateName;
use numdrassl_proc::resolve_server_artifact;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Per-instance config artifact written into a clone.
pub const SERVER_CONFIG: &str = "server-config.yml";

/// A validated template: directory + manifest, immutable once published.
#[derive(Debug, Clone)]
pub struct Template {
    name: TemplateName,
    dir_name: String,
    root: PathBuf,
    manifest: TemplateManifest,
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl Template {
    /// Load and validate a candidate template directory.
    pub fn discover(root: &Path) -> Self {
        let dir_name = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut errors = Vec::new();
        let manifest_path = root.join(TEMPLATE_MANIFEST);
        let manifest = if manifest_path.is_file() {
            match TemplateManifest::load(&manifest_path) {
                Ok(manifest) => manifest,
                Err(err) => {
                    errors.push(format!("unreadable manifest: {err}"));
                    TemplateManifest::synthesised(&dir_name)
                }
            }
        } else {
            TemplateManifest::synthesised(&dir_name)
        };

        let mut warnings = Vec::new();
        if !root.is_dir() {
            errors.push(format!("template directory {} does not exist", root.display()));
        } else {
            if resolve_server_artifact(root, Some(&manifest.server_jar)).is_none() {
                errors.push("no server artifact (jar) found".to_string());
            }
            if !root.join("Assets.zip").is_file() && !root.join("assets").is_dir() {
                warnings.push("no assets found".to_string());
            }
            if !has_file_containing(root, "bridge") {
                warnings.push("no bridge plugin found".to_string());
            }
        }

        Self {
            name: TemplateName::new(&dir_name),
            dir_name,
            root: root.to_path_buf(),
            manifest,
            errors,
            warnings,
        }
    }

    pub fn name(&self) -> &TemplateName {
        &self.name
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn manifest(&self) -> &TemplateManifest {
        &self.manifest
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn display_name(&self) -> &str {
        self.manifest.display_name(&self.dir_name)
    }

    /// Server-id prefix for generated dynamic ids.
    pub fn prefix(&self) -> String {
        self.manifest.prefix(&self.dir_name)
    }

    /// Materialise this template into a fresh working directory.
    ///
    /// Not transactional: on failure the caller owns deleting `dest`.
    pub fn clone_to(
        &self,
        dest: &Path,
        overrides: &IndexMap<String, serde_yaml::Value>,
    ) -> Result<(), FleetError> {
        if dest.exists() {
            return Err(FleetError::DestinationExists(dest.to_path_buf()));
        }
        copy_tree(&self.root, dest)?;
        if !overrides.is_empty() {
            write_server_config(dest, overrides)?;
        }
        mark_scripts_executable(dest);
        Ok(())
    }
}

/// Discovers templates under `templates/` and publishes them immutably.
pub struct TemplateStore {
    root: PathBuf,
    templates: Mutex<HashMap<TemplateName, Arc<Template>>>,
}

impl TemplateStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), templates: Mutex::new(HashMap::new()) }
    }

    /// Rescan the templates root, replacing the published set.
    pub fn reload(&self) -> Result<usize, FleetError> {
        let mut discovered = HashMap::new();
        if self.root.is_dir() {
            let entries = std::fs::read_dir(&self.root)
                .map_err(|source| FleetError::io(&self.root, source))?;
            for entry in entries.flatten() {
                let path = entry.path();
                if !path.is_dir() {
                    continue;
                }
                let template = Template::discover(&path);
                if template.is_valid() {
                    info!("template {} ok ({})", template.name(), template.display_name());
                } else {
                    warn!(
                        "template {} invalid: {}",
                        template.name(),
                        template.errors().join("; ")
                    );
                }
                for warning in template.warnings() {
                    warn!("template {}: {}", template.name(), warning);
                }
                discovered.insert(template.name().clone(), Arc::new(template));
            }
        }
        let count = discovered.len();
        *self.templates.lock() = discovered;
        Ok(count)
    }

    /// Case-insensitive lookup.
    pub fn by_name(&self, name: &str) -> Option<Arc<Template>> {
        self.templates.lock().get(&TemplateName::new(name)).cloned()
    }

    pub fn names(&self) -> Vec<TemplateName> {
        self.templates.lock().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.templates.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.lock().is_empty()
    }
}

fn has_file_containing(dir: &Path, needle: &str) -> bool {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries.flatten().any(|entry| {
                entry
                    .file_name()
                    .to_string_lossy()
                    .to_lowercase()
                    .contains(needle)
            })
        })
        .unwrap_or(false)
}

/// Recursive copy preserving relative paths.
fn copy_tree(src: &Path, dest: &Path) -> Result<(), FleetError> {
    std::fs::create_dir_all(dest).map_err(|source| FleetError::io(dest, source))?;
    let entries = std::fs::read_dir(src).map_err(|source| FleetError::io(src, source))?;
    for entry in entries {
        let entry = entry.map_err(|source| FleetError::io(src, source))?;
        let from = entry.path();
        let to = dest.join(entry.file_name());
        if from.is_dir() {
            copy_tree(&from, &to)?;
        } else {
            std::fs::copy(&from, &to).map_err(|source| FleetError::io(&from, source))?;
        }
    }
    Ok(())
}

/// Seed (or update) the per-instance config artifact from overrides.
fn write_server_config(
    dest: &Path,
    overrides: &IndexMap<String, serde_yaml::Value>,
) -> Result<(), FleetError> {
    let path = dest.join(SERVER_CONFIG);
    let mut doc: IndexMap<String, serde_yaml::Value> = match std::fs::read_to_string(&path) {
        Ok(raw) => serde_yaml::from_str(&raw).unwrap_or_default(),
        Err(_) => IndexMap::new(),
    };
    for (key, value) in overrides {
        doc.insert(key.clone(), value.clone());
    }
    let raw = serde_yaml::to_string(&doc)
        .map_err(|err| FleetError::StartupFailed(format!("config overlay: {err}")))?;
    std::fs::write(&path, raw).map_err(|source| FleetError::io(&path, source))
}

/// Best-effort chmod of startup scripts at the clone root.
fn mark_scripts_executable(dest: &Path) {
    let Ok(entries) = std::fs::read_dir(dest) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().map(|e| e == "sh").unwrap_or(false) {
            let _ = std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755));
        }
    }
}

#[cfg(test)]
#[path = "templates_tests.rs"]
mod tests;
