use std::path::PathBuf;
use std::time::Duration;

/// Default idle threshold: 6 hours
pub const DEFAULT_MAX_IDLE_SECS: u64 = 21_600;

/// Default poll interval: 1 hour
pub const DEFAULT_SCAN_INTERVAL_SECS: u64 = 3_600;

/// Runtime configuration for the watch loop
#[derive(Debug, Clone)]
pub struct WatchOptions {
    /// Root of the watched tree
    pub root: PathBuf,

    /// How long the folder, and then each file, must stay unmodified
    pub idle_threshold: Duration,

    /// Sleep between poll cycles
    pub poll_interval: Duration,

    /// Require the root folder itself to be idle before sweeping
    pub folder_gate: bool,

    /// Report deletions without performing them
    pub dry_run: bool,

    /// Run a single cycle without sleeping first, then stop
    pub once: bool,

    /// Threads used to evaluate sweep candidates
    pub jobs: usize,
}

impl WatchOptions {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            root: PathBuf::new(),
            idle_threshold: Duration::from_secs(DEFAULT_MAX_IDLE_SECS),
            poll_interval: Duration::from_secs(DEFAULT_SCAN_INTERVAL_SECS),
            folder_gate: true,
            dry_run: false,
            once: false,
            jobs: 1,
        }
    }
}

/// What happened to a single sweep candidate
#[derive(Debug, Clone)]
pub enum FileOutcome {
    /// File was past the threshold and got removed
    Deleted { path: PathBuf, bytes: u64 },
    /// Dry run: file was past the threshold and would have been removed
    WouldDelete { path: PathBuf, bytes: u64 },
    /// File was modified recently enough to stay
    Kept { path: PathBuf, idle_secs: i64 },
    /// File disappeared between enumeration and evaluation
    Vanished { path: PathBuf },
    /// Reading or removing the file failed
    Failed { path: PathBuf, error: String },
}

/// Totals for one sweep
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Regular files evaluated
    pub examined: usize,
    /// Files removed (or that would be, in a dry run)
    pub deleted: usize,
    pub kept: usize,
    pub vanished: usize,
    /// Entries that could not be read, enumerated or removed
    pub failed: usize,
    /// Bytes released by deleted files
    pub freed_bytes: u64,
    /// Sweep stopped early because shutdown was requested
    pub interrupted: bool,
}

impl SweepReport {
    /// Fold a single outcome into the totals.
    pub fn record(&mut self, outcome: &FileOutcome) {
        match outcome {
            FileOutcome::Deleted { bytes, .. } | FileOutcome::WouldDelete { bytes, .. } => {
                self.examined += 1;
                self.deleted += 1;
                self.freed_bytes += bytes;
            }
            FileOutcome::Kept { .. } => {
                self.examined += 1;
                self.kept += 1;
            }
            FileOutcome::Vanished { .. } => {
                self.examined += 1;
                self.vanished += 1;
            }
            FileOutcome::Failed { .. } => {
                self.examined += 1;
                self.failed += 1;
            }
        }
    }

    /// Human-readable freed size
    pub fn freed_human(&self) -> String {
        humansize::format_size(self.freed_bytes, humansize::BINARY)
    }
}

/// Result of one poll cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Root is no longer a directory
    RootGone,
    /// Root was modified within the threshold, no sweep
    FolderActive { idle_secs: i64 },
    /// Root could not be inspected this cycle
    Skipped,
    /// A sweep ran
    Swept(SweepReport),
}

/// Why the watch loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Watched root was removed or replaced by a non-directory
    RootGone,
    /// Shutdown was requested
    Shutdown,
    /// Single-cycle mode finished
    Once,
}
