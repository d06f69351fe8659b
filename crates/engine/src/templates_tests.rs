// SPDX-License-Identifier: MIT

use super::*;
use std::os::unix::fs::PermissionsExt;
use tempfile::TempDir;

fn templates_root() -> TempDir {
    tempfile::tempdir().unwrap()
}

fn make_template(root: &Path, name: &str, manifest: Option<&str>) -> PathBuf {
    let dir = root.join(name);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("HytaleServer.jar"), b"jar").unwrap();
    if let Some(yaml) = manifest {
        std::fs::write(dir.join(TEMPLATE_MANIFEST), yaml).unwrap();
    }
    dir
}

#[test]
fn discover_without_manifest_synthesises_defaults() {
    let root = templates_root();
    let dir = make_template(root.path(), "BedWars", None);
    let template = Template::discover(&dir);
    assert!(template.is_valid(), "{:?}", template.errors());
    assert_eq!(template.name(), &TemplateName::new("bedwars"));
    assert_eq!(template.display_name(), "BedWars");
    assert_eq!(template.prefix(), "bedwars");
    assert_eq!(template.manifest().max_players, 16);
}

#[test]
fn discover_reads_manifest_fields() {
    let root = templates_root();
    let dir = make_template(
        root.path(),
        "bedwars",
        Some("name: Bed Wars\nserverIdPrefix: bw\nmaxPlayers: 8\n"),
    );
    let template = Template::discover(&dir);
    assert_eq!(template.display_name(), "Bed Wars");
    assert_eq!(template.prefix(), "bw");
    assert_eq!(template.manifest().max_players, 8);
}

#[test]
fn missing_jar_invalidates_template() {
    let root = templates_root();
    let dir = root.path().join("empty");
    std::fs::create_dir_all(&dir).unwrap();
    let template = Template::discover(&dir);
    assert!(!template.is_valid());
    assert!(template.errors()[0].contains("no server artifact"));
}

#[test]
fn missing_assets_is_only_a_warning() {
    let root = templates_root();
    let dir = make_template(root.path(), "bare", None);
    let template = Template::discover(&dir);
    assert!(template.is_valid());
    assert!(template.warnings().iter().any(|w| w.contains("assets")));
    assert!(template.warnings().iter().any(|w| w.contains("bridge")));

    std::fs::write(dir.join("Assets.zip"), b"zip").unwrap();
    std::fs::write(dir.join("bridge-plugin.jar"), b"jar").unwrap();
    let template = Template::discover(&dir);
    assert!(template.warnings().is_empty());
}

#[test]
fn store_reload_publishes_all_candidates() {
    let root = templates_root();
    make_template(root.path(), "BedWars", None);
    make_template(root.path(), "skyblock", None);
    // A stray file is not a candidate
    std::fs::write(root.path().join("README.md"), b"x").unwrap();

    let store = TemplateStore::new(root.path());
    assert_eq!(store.reload().unwrap(), 2);
    assert_eq!(store.len(), 2);
    assert!(store.by_name("BEDWARS").is_some(), "lookup is case-insensitive");
    assert!(store.by_name("missing").is_none());
}

#[test]
fn store_survives_missing_root() {
    let root = templates_root();
    let store = TemplateStore::new(root.path().join("nope"));
    assert_eq!(store.reload().unwrap(), 0);
    assert!(store.is_empty());
}

#[test]
fn clone_to_copies_tree_and_overlays_config() {
    let root = templates_root();
    let dir = make_template(root.path(), "bedwars", None);
    std::fs::create_dir_all(dir.join("world/region")).unwrap();
    std::fs::write(dir.join("world/region/r.0.dat"), b"chunk").unwrap();
    std::fs::write(dir.join("start.sh"), b"#!/bin/sh\n").unwrap();

    let template = Template::discover(&dir);
    let dest = root.path().join("clone");
    let mut overrides = IndexMap::new();
    overrides.insert("server-port".to_string(), serde_yaml::Value::from(6100));
    overrides.insert("server-id".to_string(), serde_yaml::Value::from("bedwars-1"));
    template.clone_to(&dest, &overrides).unwrap();

    assert!(dest.join("HytaleServer.jar").is_file());
    assert!(dest.join("world/region/r.0.dat").is_file());

    let config = std::fs::read_to_string(dest.join(SERVER_CONFIG)).unwrap();
    assert!(config.contains("server-port: 6100"));
    assert!(config.contains("server-id: bedwars-1"));

    let mode = std::fs::metadata(dest.join("start.sh")).unwrap().permissions().mode();
    assert_eq!(mode & 0o111, 0o111, "start script should be executable");
}

#[test]
fn clone_to_updates_existing_config_artifact() {
    let root = templates_root();
    let dir = make_template(root.path(), "bedwars", None);
    std::fs::write(dir.join(SERVER_CONFIG), "motd: welcome\nserver-port: 1\n").unwrap();

    let template = Template::discover(&dir);
    let dest = root.path().join("clone");
    let mut overrides = IndexMap::new();
    overrides.insert("server-port".to_string(), serde_yaml::Value::from(6100));
    template.clone_to(&dest, &overrides).unwrap();

    let config = std::fs::read_to_string(dest.join(SERVER_CONFIG)).unwrap();
    assert!(config.contains("motd: welcome"), "existing keys survive");
    assert!(config.contains("server-port: 6100"), "overrides win");
}

#[test]
fn clone_to_refuses_existing_destination() {
    let root = templates_root();
    let dir = make_template(root.path(), "bedwars", None);
    let template = Template::discover(&dir);
    let dest = root.path().join("clone");
    std::fs::create_dir_all(&dest).unwrap();
    let err = template.clone_to(&dest, &IndexMap::new()).unwrap_err();
    assert!(matches!(err, FleetError::DestinationExists(_)));
}

#[test]
fn empty_overrides_write_no_config_artifact() {
    let root = templates_root();
    let dir = make_template(root.path(), "bedwars", None);
    let template = Template::discover(&dir);
    let dest = root.path().join("clone");
    template.clone_to(&dest, &IndexMap::new()).unwrap();
    assert!(!dest.join(SERVER_CONFIG).exists());
}
