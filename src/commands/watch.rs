//! Watch command implementation

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cli::Cli;
use crate::config::{validate_jobs, validate_scan_interval, Config};
use crate::error::{ConfigError, Result, SweeperError};
use crate::watcher::{
    daemon_status, daemonize, install_signal_handlers, stop_daemon, DaemonPaths, ShutdownFlag,
    StopReason, WatchOptions, WatchService,
};

/// Run the watcher, or handle `--stop`/`--status`
pub fn run(cli: &Cli, config: &Config) -> Result<Option<StopReason>> {
    let paths = DaemonPaths::new();

    if cli.stop {
        handle_stop(&paths)?;
        return Ok(None);
    }

    if cli.status {
        handle_status(&paths);
        return Ok(None);
    }

    let mut options = build_options(cli, config)?;

    if !options.root.is_dir() {
        tracing::warn!(
            "{} is not a directory, nothing to watch",
            options.root.display()
        );
    }

    if cli.background {
        // The daemon works from `/`
        options.root = absolute(&options.root)?;
        daemonize(&paths)?;
        tracing::info!("Running in background (PID {})", std::process::id());
    }

    let shutdown = ShutdownFlag::new();
    install_signal_handlers(&shutdown)?;

    let service = WatchService::new(options, shutdown);
    let reason = service.run();
    tracing::debug!(?reason, "Watcher stopped");

    if cli.background {
        paths.remove_pid_file();
    }

    Ok(Some(reason))
}

/// Merge CLI flags over the config file into the options for the loop
pub fn build_options(cli: &Cli, config: &Config) -> Result<WatchOptions> {
    let root = cli
        .target
        .clone()
        .or_else(|| config.watch.target.clone())
        .ok_or(ConfigError::MissingTarget)?;

    let max_idle_secs = cli.max_time_seconds.unwrap_or(config.watch.max_idle_secs);

    let scan_interval_secs = cli.scan_interval.unwrap_or(config.watch.scan_interval_secs);
    validate_scan_interval(scan_interval_secs)?;

    let jobs = cli.jobs.unwrap_or(config.watch.jobs);
    validate_jobs(jobs)?;

    Ok(WatchOptions {
        root,
        idle_threshold: Duration::from_secs(max_idle_secs),
        poll_interval: Duration::from_secs(scan_interval_secs),
        folder_gate: config.watch.folder_gate && !cli.no_folder_gate,
        dry_run: cli.dry_run || config.watch.dry_run,
        once: cli.once,
        jobs,
    })
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if let Ok(canonical) = path.canonicalize() {
        return Ok(canonical);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(path))
}

fn handle_stop(paths: &DaemonPaths) -> Result<()> {
    match stop_daemon(paths) {
        Ok(true) => {
            println!("Background watcher stopped");
            Ok(())
        }
        Ok(false) => {
            println!("No background watcher running");
            Ok(())
        }
        Err(e) => Err(SweeperError::Other(format!(
            "Failed to stop background watcher: {}",
            e
        ))),
    }
}

fn handle_status(paths: &DaemonPaths) {
    match daemon_status(paths) {
        Some(pid) => {
            println!("Background watcher running (PID: {})", pid);
            println!("PID file: {}", paths.pid_file.display());
            println!("Log file: {}", paths.log_file.display());
        }
        None => {
            println!("Background watcher not running");
        }
    }
}
