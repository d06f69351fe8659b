// SPDX-License-Identifier: MIT

//! On-disk layout of the servers root.

use std::path::{Path, PathBuf};

/// Fixed directory structure under `servers/`:
///
/// ```text
/// servers/
///   config.yml
///   templates/<name>/
///   static/<id>/
///   dynamic/<id>/
///   logs/{static,dynamic}/<id>.log
/// ```
#[derive(Debug, Clone)]
pub struct ServersLayout {
    root: PathBuf,
}

impl ServersLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join("config.yml")
    }

    pub fn templates_dir(&self) -> PathBuf {
        self.root.join("templates")
    }

    pub fn static_dir(&self) -> PathBuf {
        self.root.join("static")
    }

    pub fn dynamic_dir(&self) -> PathBuf {
        self.root.join("dynamic")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    /// Create every directory of the layout.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        for dir in [
            self.templates_dir(),
            self.static_dir(),
            self.dynamic_dir(),
            self.logs_dir(),
        ] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}
