use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread;
use std::time::{Duration, Instant};

use nix::sys::signal::{self, SigHandler, Signal};

/// Granularity of [`ShutdownFlag::sleep`]
const SLEEP_SLICE: Duration = Duration::from_millis(250);

static RUNNING: OnceLock<Arc<AtomicBool>> = OnceLock::new();

/// Cancellation token shared between the watch loop and signal handlers.
///
/// Starts in the running state; [`ShutdownFlag::request`] flips it once and
/// for good.
#[derive(Debug, Clone)]
pub struct ShutdownFlag {
    running: Arc<AtomicBool>,
}

impl ShutdownFlag {
    pub fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn request(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        !self.running.load(Ordering::SeqCst)
    }

    /// Sleep for `duration`, waking early if shutdown is requested.
    ///
    /// Returns `false` when the wait was cut short by a shutdown request.
    /// A duration too long to express as an `Instant` waits until shutdown.
    pub fn sleep(&self, duration: Duration) -> bool {
        let deadline = Instant::now().checked_add(duration);

        loop {
            if self.is_requested() {
                return false;
            }
            let slice = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return true;
                    }
                    (deadline - now).min(SLEEP_SLICE)
                }
                None => SLEEP_SLICE,
            };
            thread::sleep(slice);
        }
    }
}

impl Default for ShutdownFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// Install SIGTERM/SIGINT handlers that request shutdown on `flag`.
///
/// Only the first call wires a flag to the handlers; later calls reinstall
/// the handlers for that same flag.
pub fn install_signal_handlers(flag: &ShutdownFlag) -> nix::Result<()> {
    let _ = RUNNING.set(Arc::clone(&flag.running));

    // SAFETY: the handler only performs an atomic store.
    unsafe {
        signal::signal(Signal::SIGTERM, SigHandler::Handler(handle_shutdown))?;
        signal::signal(Signal::SIGINT, SigHandler::Handler(handle_shutdown))?;
    }

    Ok(())
}

extern "C" fn handle_shutdown(_: i32) {
    if let Some(running) = RUNNING.get() {
        running.store(false, Ordering::SeqCst);
    }
}
