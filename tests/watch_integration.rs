use assert_cmd::cargo::CommandCargoExt;
use assert_cmd::Command;
use filetime::{set_file_mtime, FileTime};
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::{Child, ExitStatus};
use std::thread;
use std::time::{Duration, Instant, SystemTime};
use tempfile::TempDir;

fn idle_sweeper() -> Command {
    let mut cmd = Command::cargo_bin("idle-sweeper").unwrap();
    cmd.env_remove("IDLE_SWEEPER_CONFIG").env_remove("RUST_LOG");
    cmd
}

fn set_age(path: &Path, secs: u64) {
    let when = SystemTime::now() - Duration::from_secs(secs);
    set_file_mtime(path, FileTime::from_system_time(when)).unwrap();
}

fn write_aged(path: &Path, secs: u64) {
    fs::write(path, "contents").unwrap();
    set_age(path, secs);
}

fn wait_with_timeout(child: &mut Child, timeout: Duration) -> Option<ExitStatus> {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if let Some(status) = child.try_wait().unwrap() {
            return Some(status);
        }
        thread::sleep(Duration::from_millis(50));
    }
    let _ = child.kill();
    None
}

#[test]
fn once_deletes_stale_files_in_idle_folder() {
    let tmp = TempDir::new().unwrap();
    let sub = tmp.path().join("sub");
    fs::create_dir(&sub).unwrap();
    let stale = tmp.path().join("stale.txt");
    let stale_nested = sub.join("stale.txt");
    let fresh = sub.join("fresh.txt");
    write_aged(&stale, 120);
    write_aged(&stale_nested, 120);
    write_aged(&fresh, 1);
    set_age(&sub, 120);
    set_age(tmp.path(), 120);

    idle_sweeper()
        .arg("-t")
        .arg(tmp.path())
        .args(["-m", "10", "--once"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Deleted"));

    assert!(!stale.exists());
    assert!(!stale_nested.exists());
    assert!(fresh.exists());
    assert!(sub.is_dir());
}

#[test]
fn once_skips_active_folder() {
    let tmp = TempDir::new().unwrap();
    let stale = tmp.path().join("stale.txt");
    write_aged(&stale, 120);
    set_age(tmp.path(), 2);

    idle_sweeper()
        .arg("-t")
        .arg(tmp.path())
        .args(["-m", "10", "--once"])
        .assert()
        .success();

    assert!(stale.exists());
}

#[test]
fn once_without_folder_gate_sweeps_active_folder() {
    let tmp = TempDir::new().unwrap();
    let stale = tmp.path().join("stale.txt");
    write_aged(&stale, 120);
    set_age(tmp.path(), 2);

    idle_sweeper()
        .arg("-t")
        .arg(tmp.path())
        .args(["-m", "10", "--once", "--no-folder-gate"])
        .assert()
        .success();

    assert!(!stale.exists());
}

#[test]
fn dry_run_keeps_everything() {
    let tmp = TempDir::new().unwrap();
    let stale = tmp.path().join("stale.txt");
    write_aged(&stale, 120);
    set_age(tmp.path(), 120);

    idle_sweeper()
        .arg("-t")
        .arg(tmp.path())
        .args(["-m", "10", "--once", "--dry-run"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Would delete"));

    assert!(stale.exists());
}

#[test]
fn parallel_jobs_sweep() {
    let tmp = TempDir::new().unwrap();
    for i in 0..12 {
        write_aged(&tmp.path().join(format!("file{}.txt", i)), 120);
    }
    set_age(tmp.path(), 120);

    idle_sweeper()
        .arg("-t")
        .arg(tmp.path())
        .args(["-m", "10", "--once", "-j", "4"])
        .assert()
        .success();

    assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 0);
}

#[test]
fn exits_zero_when_root_is_removed() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("watched");
    fs::create_dir(&root).unwrap();

    let mut child = std::process::Command::cargo_bin("idle-sweeper")
        .unwrap()
        .env_remove("IDLE_SWEEPER_CONFIG")
        .arg("-t")
        .arg(&root)
        .args(["-s", "1", "-m", "10"])
        .spawn()
        .unwrap();

    thread::sleep(Duration::from_millis(300));
    fs::remove_dir(&root).unwrap();

    let status = wait_with_timeout(&mut child, Duration::from_secs(15))
        .expect("watcher did not exit after its root was removed");
    assert!(status.success());
}

#[test]
fn exits_zero_on_sigterm() {
    let tmp = TempDir::new().unwrap();

    let mut child = std::process::Command::cargo_bin("idle-sweeper")
        .unwrap()
        .env_remove("IDLE_SWEEPER_CONFIG")
        .arg("-t")
        .arg(tmp.path())
        .args(["-s", "3600"])
        .spawn()
        .unwrap();

    thread::sleep(Duration::from_millis(500));
    kill(Pid::from_raw(child.id() as i32), Signal::SIGTERM).unwrap();

    let status = wait_with_timeout(&mut child, Duration::from_secs(10))
        .expect("watcher did not exit on SIGTERM");
    assert!(status.success());
    assert!(tmp.path().is_dir());
}

#[test]
fn largest_scan_interval_waits_until_sigterm() {
    let tmp = TempDir::new().unwrap();

    let mut child = std::process::Command::cargo_bin("idle-sweeper")
        .unwrap()
        .env_remove("IDLE_SWEEPER_CONFIG")
        .arg("-t")
        .arg(tmp.path())
        .args(["-s", "18446744073709551615", "-m", "10"])
        .spawn()
        .unwrap();

    thread::sleep(Duration::from_millis(500));
    assert!(child.try_wait().unwrap().is_none());
    kill(Pid::from_raw(child.id() as i32), Signal::SIGTERM).unwrap();

    let status = wait_with_timeout(&mut child, Duration::from_secs(10))
        .expect("watcher did not exit on SIGTERM");
    assert!(status.success());
}
