pub mod clock;
pub mod daemon;
pub mod service;
pub mod signals;
pub mod sweep;
pub mod types;

pub use clock::{
    convert_timepoint, epoch_secs, exceeds_threshold, idle_secs, Clock, FileClock, ManualClock,
    Offset, SystemClock, WallClock,
};
pub use daemon::{daemon_status, daemonize, stop_daemon, DaemonPaths};
pub use service::WatchService;
pub use signals::{install_signal_handlers, ShutdownFlag};
pub use sweep::{collect_candidates, evaluate_file, sweep};
pub use types::{CycleOutcome, FileOutcome, StopReason, SweepReport, WatchOptions};
