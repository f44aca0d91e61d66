//! Sweep: enumerate the regular files of the watched tree and delete the ones
//! that have been idle past the threshold.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rayon::prelude::*;
use walkdir::WalkDir;

use super::clock::{exceeds_threshold, idle_secs, WallClock};
use super::signals::ShutdownFlag;
use super::types::{FileOutcome, SweepReport, WatchOptions};

/// Collect every regular file under `root`.
///
/// Symlinks are not followed and never returned; directories are walked but
/// never returned. Enumeration finishes before anything is deleted so removal
/// cannot disturb the walk. Unreadable entries are logged and counted in
/// `report.failed`.
pub fn collect_candidates(
    root: &Path,
    shutdown: &ShutdownFlag,
    report: &mut SweepReport,
) -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    for result in WalkDir::new(root).follow_links(false).min_depth(1) {
        if shutdown.is_requested() {
            report.interrupted = true;
            break;
        }

        match result {
            Ok(entry) => {
                if entry.file_type().is_file() {
                    candidates.push(entry.into_path());
                }
            }
            Err(err) => {
                // A directory removed mid-walk is not worth a warning
                if is_not_found(err.io_error()) {
                    tracing::debug!("Entry vanished during enumeration: {}", err);
                } else {
                    tracing::warn!("Failed to enumerate entry: {}", err);
                    report.failed += 1;
                }
            }
        }
    }

    candidates
}

/// Decide on a single candidate and act on it.
///
/// The file's metadata is read again here, and "now" is sampled again, since
/// a long enumeration may have passed since the file was listed.
pub fn evaluate_file<C: WallClock>(
    path: &Path,
    threshold: Duration,
    dry_run: bool,
    wall: &C,
) -> FileOutcome {
    let metadata = match fs::symlink_metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return FileOutcome::Vanished {
                path: path.to_path_buf(),
            }
        }
        Err(e) => {
            return FileOutcome::Failed {
                path: path.to_path_buf(),
                error: e.to_string(),
            }
        }
    };

    // Replaced by something else since enumeration
    if !metadata.is_file() {
        return FileOutcome::Vanished {
            path: path.to_path_buf(),
        };
    }

    let modified = match metadata.modified() {
        Ok(t) => t,
        Err(e) => {
            return FileOutcome::Failed {
                path: path.to_path_buf(),
                error: e.to_string(),
            }
        }
    };

    let idle = idle_secs(modified, wall);
    if !exceeds_threshold(idle, threshold) {
        return FileOutcome::Kept {
            path: path.to_path_buf(),
            idle_secs: idle,
        };
    }

    let bytes = metadata.len();
    if dry_run {
        return FileOutcome::WouldDelete {
            path: path.to_path_buf(),
            bytes,
        };
    }

    match fs::remove_file(path) {
        Ok(()) => FileOutcome::Deleted {
            path: path.to_path_buf(),
            bytes,
        },
        Err(e) if e.kind() == io::ErrorKind::NotFound => FileOutcome::Vanished {
            path: path.to_path_buf(),
        },
        Err(e) => FileOutcome::Failed {
            path: path.to_path_buf(),
            error: e.to_string(),
        },
    }
}

/// Run one full sweep of `options.root`.
///
/// Per-entry failures are logged and counted; they never abort the sweep.
/// A shutdown request stops the sweep before the next file and marks the
/// report as interrupted.
pub fn sweep<C: WallClock>(
    options: &WatchOptions,
    wall: &C,
    shutdown: &ShutdownFlag,
) -> SweepReport {
    let mut report = SweepReport::default();
    let candidates = collect_candidates(&options.root, shutdown, &mut report);

    if report.interrupted {
        return report;
    }

    tracing::debug!(
        "Evaluating {} files under {}",
        candidates.len(),
        options.root.display()
    );

    if options.jobs > 1 {
        match rayon::ThreadPoolBuilder::new()
            .num_threads(options.jobs)
            .build()
        {
            Ok(pool) => {
                let outcomes: Vec<Option<FileOutcome>> = pool.install(|| {
                    candidates
                        .par_iter()
                        .map(|path| {
                            if shutdown.is_requested() {
                                return None;
                            }
                            let outcome =
                                evaluate_file(path, options.idle_threshold, options.dry_run, wall);
                            log_outcome(&outcome);
                            Some(outcome)
                        })
                        .collect()
                });

                for outcome in outcomes {
                    match outcome {
                        Some(outcome) => report.record(&outcome),
                        None => report.interrupted = true,
                    }
                }
                return report;
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to start {} sweep threads, evaluating sequentially: {}",
                    options.jobs,
                    e
                );
            }
        }
    }

    for path in &candidates {
        if shutdown.is_requested() {
            report.interrupted = true;
            break;
        }
        let outcome = evaluate_file(path, options.idle_threshold, options.dry_run, wall);
        log_outcome(&outcome);
        report.record(&outcome);
    }

    report
}

fn log_outcome(outcome: &FileOutcome) {
    match outcome {
        FileOutcome::Deleted { path, bytes } => {
            tracing::info!(bytes, "Deleted {}", path.display());
        }
        FileOutcome::WouldDelete { path, bytes } => {
            tracing::info!(bytes, "Would delete {}", path.display());
        }
        FileOutcome::Kept { path, idle_secs } => {
            tracing::debug!(idle_secs, "Keeping {}", path.display());
        }
        FileOutcome::Vanished { path } => {
            tracing::debug!("{} disappeared before it could be removed", path.display());
        }
        FileOutcome::Failed { path, error } => {
            tracing::warn!("Skipping {}: {}", path.display(), error);
        }
    }
}

fn is_not_found(err: Option<&io::Error>) -> bool {
    err.is_some_and(|e| e.kind() == io::ErrorKind::NotFound)
}
