//! CLI integration tests

use std::process::Command;

use tempfile::TempDir;

fn mp3_recorder_bin() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_mp3-recorder"));
    cmd.env_remove("MP3_RECORDER_OUTPUT");
    cmd
}

#[test]
fn help_output() {
    let output = mp3_recorder_bin()
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("MP3"));
    assert!(stdout.contains("--duration"));
    assert!(stdout.contains("--output"));
    assert!(stdout.contains("--bitrate"));
    assert!(stdout.contains("--quality"));
    assert!(stdout.contains("--verbose"));
}

#[test]
fn version_output() {
    let output = mp3_recorder_bin()
        .arg("--version")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("mp3-recorder"));
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn config_path_command() {
    let output = mp3_recorder_bin()
        .args(["config", "path"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("mp3-recorder"));
    assert!(stdout.contains("config.toml"));
}

#[test]
fn config_help() {
    let output = mp3_recorder_bin()
        .args(["config", "--help"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for action in ["init", "set", "get", "list", "path"] {
        assert!(stdout.contains(action), "missing '{}' in: {}", action, stdout);
    }
}

#[test]
fn invalid_duration_is_usage_error() {
    let output = mp3_recorder_bin()
        .args(["--duration", "invalid"])
        .env("HOME", "/nonexistent")
        .env("XDG_CONFIG_HOME", "/nonexistent")
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Invalid duration"),
        "Expected error about invalid duration, got: {}",
        stderr
    );
}

#[test]
fn non_numeric_bitrate_is_usage_error() {
    let output = mp3_recorder_bin()
        .args(["--bitrate", "loud"])
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(2));
}

#[cfg(target_os = "linux")]
#[test]
fn config_set_then_get() {
    let temp = TempDir::new().unwrap();
    let run = |args: &[&str]| {
        mp3_recorder_bin()
            .args(args)
            .env("XDG_CONFIG_HOME", temp.path())
            .output()
            .expect("Failed to execute command")
    };

    assert!(run(&["config", "set", "bitrate", "192"]).status.success());
    assert!(run(&["config", "set", "duration", "90s"]).status.success());

    let bitrate = run(&["config", "get", "bitrate"]);
    assert_eq!(String::from_utf8_lossy(&bitrate.stdout).trim(), "192");

    let duration = run(&["config", "get", "duration"]);
    assert_eq!(String::from_utf8_lossy(&duration.stdout).trim(), "1m30s");

    assert!(temp.path().join("mp3-recorder").join("config.toml").exists());
}

#[cfg(target_os = "linux")]
#[test]
fn config_init_twice_fails() {
    let temp = TempDir::new().unwrap();
    let init = || {
        mp3_recorder_bin()
            .args(["config", "init"])
            .env("XDG_CONFIG_HOME", temp.path())
            .output()
            .expect("Failed to execute command")
    };

    assert!(init().status.success());
    let second = init();
    assert!(!second.status.success());
    assert!(String::from_utf8_lossy(&second.stderr).contains("already exists"));
}

#[cfg(target_os = "linux")]
#[test]
fn buffer_size_splitting_frames_in_config_file_is_usage_error() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("mp3-recorder");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("config.toml"), "buffer_size = 4098\n").unwrap();

    let output = mp3_recorder_bin()
        .args(["--duration", "1s", "--output"])
        .arg(temp.path().join("take.mp3"))
        .env("XDG_CONFIG_HOME", temp.path())
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("buffer_size"),
        "Expected buffer size error, got: {}",
        stderr
    );
    assert!(!temp.path().join("take.mp3").exists());
}

// Valid recording arguments would open the microphone; recording itself is
// covered by the scripted-device pipeline tests
