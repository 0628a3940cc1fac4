//! Error scenario integration tests

use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

fn voxroom_bin(home: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_voxroom"));
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env("XDG_DATA_HOME", home.join("data"));
    cmd
}

#[test]
fn config_get_unknown_key() {
    let home = TempDir::new().unwrap();
    let output = voxroom_bin(home.path())
        .args(["config", "get", "unknown_key"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Unknown") || stderr.contains("Valid"),
        "Expected error about unknown key, got: {}",
        stderr
    );
}

#[test]
fn config_set_invalid_format() {
    let home = TempDir::new().unwrap();
    let output = voxroom_bin(home.path())
        .args(["config", "set", "recording_formats", "video/mp4"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Unknown audio encoding"),
        "Expected encoding error, got: {}",
        stderr
    );
}

#[test]
fn empty_message_rejected() {
    let home = TempDir::new().unwrap();
    let room = home.path().join("room");
    let output = voxroom_bin(home.path())
        .args(["send", "   "])
        .arg("--room")
        .arg(&room)
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("empty"), "got: {}", stderr);
    assert!(!room.join("messages.jsonl").exists());
}

#[test]
fn play_unknown_message() {
    let home = TempDir::new().unwrap();
    let output = voxroom_bin(home.path())
        .args(["play", "does-not-exist"])
        .arg("--room")
        .arg(home.path().join("room"))
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("No message with id"), "got: {}", stderr);
}

#[test]
fn play_text_only_message() {
    let home = TempDir::new().unwrap();
    let room = home.path().join("room");
    let sent = voxroom_bin(home.path())
        .args(["send", "just words"])
        .arg("--room")
        .arg(&room)
        .output()
        .expect("Failed to execute command");
    let id = String::from_utf8_lossy(&sent.stdout).trim().to_string();

    let output = voxroom_bin(home.path())
        .args(["play", &id])
        .arg("--room")
        .arg(&room)
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("has no voice clip"), "got: {}", stderr);
}

#[test]
fn download_unknown_message() {
    let home = TempDir::new().unwrap();
    let output = voxroom_bin(home.path())
        .args(["download", "nope", "--to"])
        .arg(home.path().join("dl"))
        .arg("--room")
        .arg(home.path().join("room"))
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn invalid_max_duration_is_usage_error() {
    let home = TempDir::new().unwrap();
    let output = voxroom_bin(home.path())
        .args(["record", "--max-duration", "soon"])
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Invalid max-duration"), "got: {}", stderr);
}

#[test]
fn invalid_record_format_is_usage_error() {
    let home = TempDir::new().unwrap();
    let output = voxroom_bin(home.path())
        .args(["record", "--formats", "audio/aiff"])
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(2));
}
