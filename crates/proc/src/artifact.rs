// SPDX-License-Identifier: MIT

//! Server executable resolution inside a working directory.

use std::path::Path;

/// Resolve the jar to launch from `dir`.
///
/// Order: the preferred name when that file exists; any `*.jar` whose
/// name contains "server" or "hytale"; the first `*.jar`. Candidates
/// are scanned in name order so the choice is stable across runs.
/// Returns the file name relative to `dir`.
pub fn resolve_server_artifact(dir: &Path, preferred: Option<&str>) -> Option<String> {
    if let Some(name) = preferred {
        if dir.join(name).is_file() {
            return Some(name.to_string());
        }
    }

    let mut jars: Vec<String> = std::fs::read_dir(dir)
        .ok()?
        .flatten()
        .filter(|entry| entry.path().is_file())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| name.to_lowercase().ends_with(".jar"))
        .collect();
    jars.sort();

    jars.iter()
        .find(|name| {
            let folded = name.to_lowercase();
            folded.contains("server") || folded.contains("hytale")
        })
        .or_else(|| jars.first())
        .cloned()
}

#[cfg(test)]
#[path = "artifact_tests.rs"]
mod tests;
