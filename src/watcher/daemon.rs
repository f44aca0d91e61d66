use std::fs::{self, OpenOptions};
use std::io;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::unistd::{dup2, fork, setsid, ForkResult, Pid};

use crate::error::{Result, SweeperError};

/// How long `--stop` waits for SIGTERM before sending SIGKILL
const STOP_GRACE: Duration = Duration::from_secs(5);
const STOP_POLL: Duration = Duration::from_millis(100);

/// Where a background instance keeps its PID file and log.
///
/// The PID file lives in `$XDG_RUNTIME_DIR`, the log in
/// `$XDG_STATE_HOME/idle-sweeper/`, falling back to the system temp dir.
#[derive(Debug, Clone)]
pub struct DaemonPaths {
    pub pid_file: PathBuf,
    pub log_file: PathBuf,
}

impl DaemonPaths {
    pub fn new() -> Self {
        let runtime_dir = std::env::var_os("XDG_RUNTIME_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir);
        let state_dir = std::env::var_os("XDG_STATE_HOME")
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|home| home.join(".local").join("state")))
            .unwrap_or_else(std::env::temp_dir);

        Self {
            pid_file: runtime_dir.join("idle-sweeper.pid"),
            log_file: state_dir.join("idle-sweeper").join("watch.log"),
        }
    }

    /// PID of the live instance recorded in the PID file.
    ///
    /// A file that is unreadable, malformed, or names a dead process is
    /// removed, so callers only ever see a live instance or nothing.
    pub fn running_pid(&self) -> Option<Pid> {
        let recorded = fs::read_to_string(&self.pid_file)
            .ok()
            .and_then(|text| text.trim().parse::<i32>().ok())
            .filter(|&raw| raw > 0)
            .map(Pid::from_raw);

        match recorded {
            Some(pid) if is_alive(pid) => Some(pid),
            _ => {
                self.remove_pid_file();
                None
            }
        }
    }

    fn record_own_pid(&self) -> Result<()> {
        fs::write(&self.pid_file, format!("{}\n", std::process::id()))
            .map_err(io_error(&self.pid_file))
    }

    /// Remove the PID file; a missing file is not an error.
    pub fn remove_pid_file(&self) {
        if let Err(e) = fs::remove_file(&self.pid_file) {
            if e.kind() != io::ErrorKind::NotFound {
                tracing::warn!("Failed to remove {}: {}", self.pid_file.display(), e);
            }
        }
    }
}

impl Default for DaemonPaths {
    fn default() -> Self {
        Self::new()
    }
}

/// Signal 0 checks for existence. EPERM still means someone owns that PID.
fn is_alive(pid: Pid) -> bool {
    !matches!(kill(pid, None), Err(Errno::ESRCH))
}

/// Fork once; the parent exits and the child carries on.
fn fork_into_child() -> Result<()> {
    // SAFETY: called during startup, before any other thread is spawned.
    match unsafe { fork() }? {
        ForkResult::Parent { .. } => std::process::exit(0),
        ForkResult::Child => Ok(()),
    }
}

/// Detach from the terminal and keep running in the background.
///
/// Returns in the detached process while the invoking one exits with 0. The
/// working directory becomes `/`, so the watched root must be absolute.
pub fn daemonize(paths: &DaemonPaths) -> Result<()> {
    if let Some(pid) = paths.running_pid() {
        return Err(SweeperError::AlreadyRunning(pid.as_raw() as u32));
    }

    let log_file = open_log(paths)?;

    fork_into_child()?;
    setsid()?;
    // not a session leader after this, so no terminal can be reacquired
    fork_into_child()?;

    std::env::set_current_dir("/")?;

    let dev_null = OpenOptions::new().read(true).write(true).open("/dev/null")?;
    dup2(dev_null.as_raw_fd(), io::stdin().as_raw_fd())?;
    dup2(log_file.as_raw_fd(), io::stdout().as_raw_fd())?;
    dup2(log_file.as_raw_fd(), io::stderr().as_raw_fd())?;

    paths.record_own_pid()
}

fn open_log(paths: &DaemonPaths) -> Result<fs::File> {
    if let Some(dir) = paths.log_file.parent() {
        fs::create_dir_all(dir).map_err(io_error(dir))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&paths.log_file)
        .map_err(io_error(&paths.log_file))
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> SweeperError {
    let path = path.to_path_buf();
    move |source| SweeperError::Io { path, source }
}

/// Stop the background instance. Returns whether one was running.
///
/// Sends SIGTERM, and SIGKILL if the instance is still alive after a grace
/// period. A sweep checks for shutdown before every file, so SIGTERM is
/// normally enough.
pub fn stop_daemon(paths: &DaemonPaths) -> Result<bool> {
    let Some(pid) = paths.running_pid() else {
        return Ok(false);
    };

    kill(pid, Signal::SIGTERM)?;

    let deadline = Instant::now() + STOP_GRACE;
    while is_alive(pid) {
        if Instant::now() >= deadline {
            tracing::warn!("PID {} ignored SIGTERM, sending SIGKILL", pid);
            kill(pid, Signal::SIGKILL)?;
            break;
        }
        thread::sleep(STOP_POLL);
    }

    paths.remove_pid_file();
    Ok(true)
}

/// PID of the running background instance, if any
pub fn daemon_status(paths: &DaemonPaths) -> Option<u32> {
    paths.running_pid().map(|pid| pid.as_raw() as u32)
}
