//! CLI integration tests

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Binary with config and data dirs pointed into `home`
fn voxroom_bin(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("voxroom").expect("binary built");
    cmd.env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join("config"))
        .env("XDG_DATA_HOME", home.path().join("data"))
        .env_remove("VOXROOM_AUTHOR")
        .env_remove("VOXROOM_ROOM_DIR");
    cmd
}

#[test]
fn help_output() {
    let home = TempDir::new().unwrap();
    voxroom_bin(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("voice messages"))
        .stdout(predicate::str::contains("record"))
        .stdout(predicate::str::contains("play"))
        .stdout(predicate::str::contains("download"))
        .stdout(predicate::str::contains("--room"));
}

#[test]
fn version_output() {
    let home = TempDir::new().unwrap();
    voxroom_bin(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("voxroom"))
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn config_path_command() {
    let home = TempDir::new().unwrap();
    voxroom_bin(&home)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("voxroom"))
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn config_set_then_get() {
    let home = TempDir::new().unwrap();
    voxroom_bin(&home)
        .args(["config", "set", "author", "ana"])
        .assert()
        .success();
    voxroom_bin(&home)
        .args(["config", "get", "author"])
        .assert()
        .success()
        .stdout("ana\n");
}

#[test]
fn record_help_lists_options() {
    let home = TempDir::new().unwrap();
    voxroom_bin(&home)
        .args(["record", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--max-duration"))
        .stdout(predicate::str::contains("--formats"))
        .stdout(predicate::str::contains("--out"));
}

#[test]
fn send_then_list() {
    let home = TempDir::new().unwrap();
    let room = home.path().join("room");

    voxroom_bin(&home)
        .args(["--author", "ana", "send", "hello room"])
        .arg("--room")
        .arg(&room)
        .assert()
        .success();
    voxroom_bin(&home)
        .args(["send", "second"])
        .arg("--room")
        .arg(&room)
        .env("VOXROOM_AUTHOR", "bo")
        .assert()
        .success();

    let listed = voxroom_bin(&home)
        .arg("list")
        .arg("--room")
        .arg(&room)
        .assert()
        .success();
    let stdout = String::from_utf8_lossy(&listed.get_output().stdout).into_owned();
    let first = stdout.find("hello room").expect("first message listed");
    let second = stdout.find("second").expect("second message listed");
    assert!(first < second, "delivery order kept: {}", stdout);
    assert!(stdout.contains("ana"));
    assert!(stdout.contains("bo"));
}

#[test]
fn list_empty_room() {
    let home = TempDir::new().unwrap();
    voxroom_bin(&home)
        .arg("list")
        .arg("--room")
        .arg(home.path().join("nowhere"))
        .assert()
        .success()
        .stdout("");
}

#[test]
fn formats_lists_candidates() {
    let home = TempDir::new().unwrap();
    voxroom_bin(&home)
        .arg("formats")
        .assert()
        .success()
        .stdout(predicate::str::contains("audio/webm;codecs=opus"))
        .stdout(predicate::str::contains("audio/flac"))
        .stdout(predicate::str::contains("yes (selected)"));
}
