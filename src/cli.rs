use clap::Parser;
use std::path::PathBuf;

/// Idle Sweeper - deletes files from a folder once the folder has gone quiet
///
/// Every scan interval the target folder's own modification time is checked.
/// Once the folder has been unmodified for longer than the idle threshold
/// (adding or removing a file counts as a modification), every file in the
/// tree that has also been unmodified for longer than the threshold is
/// deleted. Deletion is permanent.
#[derive(Parser, Debug)]
#[command(name = "idle-sweeper")]
#[command(author, version, about, long_about)]
pub struct Cli {
    /// Directory to watch
    #[arg(short, long, value_name = "DIR")]
    pub target: Option<PathBuf>,

    /// Seconds the folder, and then each file, may stay unmodified before files are deleted [default: 21600]
    #[arg(short = 'm', long, value_name = "SECS")]
    pub max_time_seconds: Option<u64>,

    /// Seconds to wait between scans of the folder [default: 3600]
    #[arg(short = 's', long, value_name = "SECS")]
    pub scan_interval: Option<u64>,

    /// Detach from the terminal and keep watching in the background
    #[arg(short, long)]
    pub background: bool,

    /// Sweep on every scan even if the folder itself was modified recently
    #[arg(long)]
    pub no_folder_gate: bool,

    /// Log what would be deleted without deleting anything
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Run a single scan immediately and exit
    #[arg(long)]
    pub once: bool,

    /// Threads used to evaluate files during a sweep
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Stop a running background instance
    #[arg(long, conflicts_with_all = ["status", "background", "once"])]
    pub stop: bool,

    /// Show whether a background instance is running
    #[arg(long, conflicts_with_all = ["background", "once"])]
    pub status: bool,

    /// Path to configuration file
    #[arg(short, long, value_name = "PATH", env = "IDLE_SWEEPER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}
