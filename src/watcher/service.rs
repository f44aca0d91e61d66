use std::fs::{self, Metadata};
use std::io;

use nix::errno::Errno;

use super::clock::{exceeds_threshold, idle_secs, SystemClock, WallClock};
use super::signals::ShutdownFlag;
use super::sweep::sweep;
use super::types::{CycleOutcome, StopReason, WatchOptions};

/// The idle-gated sweep loop.
///
/// Sleeps for the poll interval, checks whether the watched root has been
/// idle past the threshold and, if so, sweeps it. Runs until the root stops
/// being a directory or shutdown is requested.
pub struct WatchService<C: WallClock = SystemClock> {
    options: WatchOptions,
    wall: C,
    shutdown: ShutdownFlag,
}

impl WatchService<SystemClock> {
    pub fn new(options: WatchOptions, shutdown: ShutdownFlag) -> Self {
        Self::with_clock(options, shutdown, SystemClock)
    }
}

impl<C: WallClock> WatchService<C> {
    /// Create a service that measures "now" with `wall`.
    pub fn with_clock(options: WatchOptions, shutdown: ShutdownFlag, wall: C) -> Self {
        Self {
            options,
            wall,
            shutdown,
        }
    }

    /// Get the shutdown flag for signal handlers
    pub fn shutdown_flag(&self) -> ShutdownFlag {
        self.shutdown.clone()
    }

    /// Run the watch loop
    pub fn run(&self) -> StopReason {
        tracing::info!(
            "Watching {} with {}s idle threshold, scanning every {}s{}{}",
            self.options.root.display(),
            self.options.idle_threshold.as_secs(),
            self.options.poll_interval.as_secs(),
            if self.options.folder_gate {
                ""
            } else {
                ", folder gate disabled"
            },
            if self.options.dry_run { ", dry run" } else { "" }
        );

        if self.options.once {
            return match self.run_cycle() {
                CycleOutcome::RootGone => self.root_gone(),
                _ => StopReason::Once,
            };
        }

        loop {
            if self.shutdown.is_requested() {
                tracing::info!("Watcher stopping");
                return StopReason::Shutdown;
            }

            if let RootStatus::Gone = self.root_status() {
                return self.root_gone();
            }

            if !self.shutdown.sleep(self.options.poll_interval) {
                tracing::info!("Watcher stopping");
                return StopReason::Shutdown;
            }

            if self.run_cycle() == CycleOutcome::RootGone {
                return self.root_gone();
            }
        }
    }

    /// One poll cycle: folder gate, then sweep if the gate passes.
    pub fn run_cycle(&self) -> CycleOutcome {
        let root = &self.options.root;

        let metadata = match self.root_status() {
            RootStatus::Directory(m) => m,
            RootStatus::Gone => return CycleOutcome::RootGone,
            RootStatus::Unreadable(e) => {
                tracing::warn!("Failed to read {}: {}", root.display(), e);
                return CycleOutcome::Skipped;
            }
        };

        if self.options.folder_gate {
            let modified = match metadata.modified() {
                Ok(t) => t,
                Err(e) => {
                    tracing::warn!(
                        "Failed to read modification time of {}: {}",
                        root.display(),
                        e
                    );
                    return CycleOutcome::Skipped;
                }
            };

            let idle = idle_secs(modified, &self.wall);
            if !exceeds_threshold(idle, self.options.idle_threshold) {
                tracing::debug!(
                    idle_secs = idle,
                    "{} modified recently, not sweeping",
                    root.display()
                );
                return CycleOutcome::FolderActive { idle_secs: idle };
            }
            tracing::debug!(idle_secs = idle, "{} is idle, sweeping", root.display());
        }

        let report = sweep(&self.options, &self.wall, &self.shutdown);

        tracing::info!(
            "Swept {}: {} files examined, {} {} ({}), {} kept, {} failed{}",
            root.display(),
            report.examined,
            report.deleted,
            if self.options.dry_run {
                "would be deleted"
            } else {
                "deleted"
            },
            report.freed_human(),
            report.kept,
            report.failed,
            if report.interrupted {
                ", interrupted"
            } else {
                ""
            }
        );

        CycleOutcome::Swept(report)
    }

    /// Request the loop to stop
    pub fn stop(&self) {
        self.shutdown.request();
    }

    fn root_status(&self) -> RootStatus {
        RootStatus::from_stat(fs::metadata(&self.options.root))
    }

    fn root_gone(&self) -> StopReason {
        tracing::info!(
            "{} is no longer a directory, stopping",
            self.options.root.display()
        );
        StopReason::RootGone
    }
}

/// What a stat of the watched root says about it.
#[derive(Debug)]
enum RootStatus {
    Directory(Metadata),
    /// Missing, or no longer a directory. Stops the loop.
    Gone,
    /// Any other stat failure; the cycle is skipped and the loop goes on.
    Unreadable(io::Error),
}

impl RootStatus {
    fn from_stat(stat: io::Result<Metadata>) -> Self {
        match stat {
            Ok(m) if m.is_dir() => RootStatus::Directory(m),
            Ok(_) => RootStatus::Gone,
            Err(e) if e.kind() == io::ErrorKind::NotFound => RootStatus::Gone,
            // a path component was replaced by a regular file
            Err(e) if e.raw_os_error() == Some(Errno::ENOTDIR as i32) => RootStatus::Gone,
            Err(e) => RootStatus::Unreadable(e),
        }
    }
}
