// SPDX-License-Identifier: MIT

use super::*;
use tempfile::TempDir;

fn dir_with(files: &[&str]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for name in files {
        std::fs::write(dir.path().join(name), b"jar").unwrap();
    }
    dir
}

#[test]
fn preferred_name_wins_when_present() {
    let dir = dir_with(&["custom.jar", "HytaleServer.jar"]);
    let jar = resolve_server_artifact(dir.path(), Some("custom.jar"));
    assert_eq!(jar.as_deref(), Some("custom.jar"));
}

#[test]
fn missing_preferred_falls_back_to_scan() {
    let dir = dir_with(&["HytaleServer.jar"]);
    let jar = resolve_server_artifact(dir.path(), Some("missing.jar"));
    assert_eq!(jar.as_deref(), Some("HytaleServer.jar"));
}

#[test]
fn prefers_server_or_hytale_jars() {
    let dir = dir_with(&["aaa-plugin.jar", "game-server.jar"]);
    let jar = resolve_server_artifact(dir.path(), None);
    assert_eq!(jar.as_deref(), Some("game-server.jar"));
}

#[test]
fn match_is_case_insensitive() {
    let dir = dir_with(&["aaa.jar", "MyHytale.JAR"]);
    let jar = resolve_server_artifact(dir.path(), None);
    assert_eq!(jar.as_deref(), Some("MyHytale.JAR"));
}

#[test]
fn any_jar_as_last_resort() {
    let dir = dir_with(&["plugin.jar", "README.md"]);
    let jar = resolve_server_artifact(dir.path(), None);
    assert_eq!(jar.as_deref(), Some("plugin.jar"));
}

#[test]
fn no_jar_resolves_to_none() {
    let dir = dir_with(&["README.md"]);
    assert_eq!(resolve_server_artifact(dir.path(), None), None);
}

#[test]
fn directories_are_not_candidates() {
    let dir = dir_with(&[]);
    std::fs::create_dir(dir.path().join("not-a.jar")).unwrap();
    assert_eq!(resolve_server_artifact(dir.path(), None), None);
}
