use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn idle_sweeper() -> Command {
    let mut cmd = Command::cargo_bin("idle-sweeper").unwrap();
    cmd.env_remove("IDLE_SWEEPER_CONFIG").env_remove("RUST_LOG");
    cmd
}

#[test]
fn shows_help() {
    idle_sweeper()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--target"))
        .stdout(predicate::str::contains("--max-time-seconds"))
        .stdout(predicate::str::contains("--scan-interval"))
        .stdout(predicate::str::contains("--background"))
        .stdout(predicate::str::contains("Seconds to wait between scans"));
}

#[test]
fn shows_short_help() {
    idle_sweeper()
        .arg("-h")
        .assert()
        .code(0)
        .stdout(predicate::str::contains("Usage:"));
}

#[test]
fn shows_version() {
    idle_sweeper()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn missing_target_exits_with_1() {
    let home = TempDir::new().unwrap();
    idle_sweeper()
        .env("XDG_CONFIG_HOME", home.path())
        .env("HOME", home.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--target"));
}

#[test]
fn malformed_threshold_exits_with_1() {
    let dir = TempDir::new().unwrap();
    idle_sweeper()
        .arg("--target")
        .arg(dir.path())
        .args(["--max-time-seconds", "abc"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--max-time-seconds"));
}

#[test]
fn malformed_interval_exits_with_1() {
    let dir = TempDir::new().unwrap();
    idle_sweeper()
        .arg("-t")
        .arg(dir.path())
        .args(["-s", "soon"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--scan-interval"));
}

#[test]
fn zero_interval_exits_with_1() {
    let dir = TempDir::new().unwrap();
    idle_sweeper()
        .arg("-t")
        .arg(dir.path())
        .args(["-s", "0"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("scan interval"));
}

#[test]
fn unknown_flag_exits_with_1() {
    idle_sweeper().arg("--frobnicate").assert().code(1);
}

#[test]
fn nonexistent_target_exits_cleanly() {
    let dir = TempDir::new().unwrap();
    idle_sweeper()
        .arg("-t")
        .arg(dir.path().join("missing"))
        .assert()
        .success()
        .stderr(predicate::str::contains("not a directory"));
}

#[test]
fn status_not_running() {
    let runtime = TempDir::new().unwrap();
    idle_sweeper()
        .env("XDG_RUNTIME_DIR", runtime.path())
        .arg("--status")
        .assert()
        .success()
        .stdout(predicate::str::contains("not running"));
}

#[test]
fn stop_not_running() {
    let runtime = TempDir::new().unwrap();
    idle_sweeper()
        .env("XDG_RUNTIME_DIR", runtime.path())
        .arg("--stop")
        .assert()
        .success()
        .stdout(predicate::str::contains("No background watcher running"));
}

#[test]
fn stop_and_background_conflict() {
    idle_sweeper()
        .args(["--stop", "--background"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("cannot be used with"));
}
