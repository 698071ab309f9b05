//! Runs the built binary against the sample pack.

use std::process::Command;

fn sample_pack() -> std::path::PathBuf {
    let manifest = std::path::Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest.join("../../data/packs/sample")
}

fn tracklogic(args: &[&str]) -> (bool, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_tracklogic"))
        .args(args)
        .env("RUST_LOG", "error")
        .env_remove("TRACKLOGIC_PACK")
        .output()
        .expect("run tracklogic");
    (
        output.status.success(),
        String::from_utf8_lossy(&output.stdout).into_owned(),
    )
}

#[test]
fn json_report_reflects_clicks() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = dir.path().join("none.toml");
    let pack = sample_pack();
    let (ok, stdout) = tracklogic(&[
        "--pack",
        pack.to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
        "--click",
        "lamp",
        "--format",
        "json",
    ]);
    assert!(ok);
    let rows: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let chests = rows
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["location"] == "Overworld/Dark Cave" && r["section"] == "Chests")
        .unwrap();
    assert_eq!(chests["status"], "normal");
    assert_eq!(chests["remaining"], 3);
}

#[test]
fn state_round_trips_through_files() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = dir.path().join("none.toml");
    let state = dir.path().join("state.json");
    let pack = sample_pack();
    let pack = pack.to_str().unwrap();

    let (ok, _) = tracklogic(&[
        "--pack",
        pack,
        "--config",
        config.to_str().unwrap(),
        "--click",
        "lamp",
        "--save-state",
        state.to_str().unwrap(),
    ]);
    assert!(ok);

    let (ok, stdout) = tracklogic(&[
        "--pack",
        pack,
        "--config",
        config.to_str().unwrap(),
        "--state",
        state.to_str().unwrap(),
    ]);
    assert!(ok);
    assert!(stdout.contains("Overworld/Dark Cave/Chests"));
    assert!(stdout.contains("normal"));
}

#[test]
fn nothing_to_load_fails() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = dir.path().join("none.toml");
    let (ok, _) = tracklogic(&["--config", config.to_str().unwrap()]);
    assert!(!ok);
}

#[test]
fn item_listing_shows_badges_through_their_base() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = dir.path().join("none.toml");
    let pack = sample_pack();
    let (ok, stdout) = tracklogic(&[
        "--pack",
        pack.to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
        "--click",
        "sword:next",
        "--click",
        "sword:next",
        "--list-items",
        "--format",
        "json",
    ]);
    assert!(ok);
    let rows: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let badge = rows
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["name"] == "Sword Badge")
        .unwrap();
    assert_eq!(badge["shown"], "Master Sword");
    assert_eq!(badge["base"], "2");
}
