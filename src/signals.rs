//! Unix termination signals
//!
//! The first SIGINT/SIGTERM asks the UI thread for an orderly exit through
//! the command channel. A second signal releases the single-instance lock
//! directly and exits, so a wedged shutdown cannot hold the marker file
//! hostage.

use anyhow::{Context, Result};
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;
use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::thread;
use tracing::{info, warn};

use crate::instance::LockHandle;
use crate::lifecycle::AppCommand;

/// Spawn the watcher thread
///
/// `notify` is pinged after the Exit command is enqueued so the UI thread
/// wakes up without waiting for its next scheduled repaint.
pub fn spawn_watcher<F>(commands: Sender<AppCommand>, lock: Arc<LockHandle>, notify: F) -> Result<()>
where
    F: Fn() + Send + 'static,
{
    let mut signals =
        Signals::new([SIGINT, SIGTERM]).context("Failed to register signal handlers")?;

    thread::Builder::new()
        .name("webdesk-signals".to_string())
        .spawn(move || {
            let mut shutdown_requested = false;
            for signal in signals.forever() {
                if !shutdown_requested {
                    shutdown_requested = true;
                    info!(signal, "Termination signal received, requesting shutdown");
                    let _ = commands.send(AppCommand::Exit);
                    notify();
                } else {
                    warn!(signal, "Repeated termination signal, exiting immediately");
                    lock.release();
                    std::process::exit(1);
                }
            }
        })
        .context("Failed to spawn signal watcher")?;

    Ok(())
}
