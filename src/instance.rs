//! Single-instance guard
//!
//! An exclusive advisory lock on a marker file in the per-user application
//! directory. Only cooperating processes observe the lock; the OS drops it
//! automatically if the process dies without releasing, so a stale marker
//! file never blocks the next launch.

use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::app_dir;
use crate::constants::app;

#[derive(Debug, Error)]
pub enum AcquireError {
    /// Another live process holds the marker lock
    #[error("another instance already holds {path}")]
    AlreadyRunning { path: PathBuf },

    /// Marker directory or file could not be created or locked
    #[error("failed to prepare lock file: {0}")]
    Io(#[from] io::Error),
}

/// Exclusive claim on the single-instance marker file
///
/// Held for the life of the process. `release` is idempotent and shared
/// between the shutdown sequence and the signal watcher, so whichever runs
/// first wins and the other finds nothing left to do.
pub struct LockHandle {
    path: PathBuf,
    file: Mutex<Option<File>>,
}

/// Marker file location: `~/.webdesk/webdesk.lck`
pub fn default_lock_path() -> PathBuf {
    app_dir().join(app::LOCK_FILE)
}

/// Acquire the single-instance lock at the default per-user path
pub fn acquire() -> Result<Arc<LockHandle>, AcquireError> {
    acquire_at(default_lock_path())
}

/// Acquire the single-instance lock at a specific path
///
/// Never blocks: a contended lock returns `AlreadyRunning` immediately.
pub fn acquire_at(path: PathBuf) -> Result<Arc<LockHandle>, AcquireError> {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            info!(dir = %parent.display(), "Creating application directory");
            fs::create_dir_all(parent)?;
        }
    }

    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .open(&path)?;

    match file.try_lock_exclusive() {
        Ok(()) => {
            info!(path = %path.display(), "Acquired single-instance lock");
            Ok(Arc::new(LockHandle {
                path,
                file: Mutex::new(Some(file)),
            }))
        }
        Err(err) if err.kind() == fs2::lock_contended_error().kind() => {
            Err(AcquireError::AlreadyRunning { path })
        }
        Err(err) => Err(AcquireError::Io(err)),
    }
}

impl LockHandle {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the lock, close the handle and delete the marker file
    ///
    /// Idempotent: only the first call does any work. Failures are logged
    /// and never propagate into the shutdown path.
    pub fn release(&self) {
        let file = match self.file.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };

        let Some(file) = file else {
            return;
        };

        info!(path = %self.path.display(), "Releasing single-instance lock");
        if let Err(err) = FileExt::unlock(&file) {
            warn!(path = %self.path.display(), error = ?err, "Failed to unlock marker file");
        }
        drop(file);

        match fs::remove_file(&self.path) {
            Ok(()) => info!(path = %self.path.display(), "Removed marker file"),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "Marker file already removed");
            }
            Err(err) => {
                warn!(path = %self.path.display(), error = ?err, "Failed to remove marker file");
            }
        }
    }
}

impl Drop for LockHandle {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn temp_lock_path(name: &str) -> PathBuf {
        env::temp_dir()
            .join(format!("webdesk-instance-{}-{}", std::process::id(), name))
            .join(app::LOCK_FILE)
    }

    #[test]
    fn test_acquire_creates_directory_and_marker() {
        let path = temp_lock_path("fresh");
        assert!(!path.exists());

        let handle = acquire_at(path.clone()).unwrap();
        assert!(path.exists());
        assert_eq!(handle.path(), path.as_path());

        handle.release();
        assert!(!path.exists());
    }

    #[test]
    fn test_second_acquire_returns_already_running() {
        let path = temp_lock_path("contended");
        let _handle = acquire_at(path.clone()).unwrap();

        match acquire_at(path.clone()) {
            Err(AcquireError::AlreadyRunning { path: reported }) => {
                assert_eq!(reported, path);
            }
            Err(other) => panic!("expected AlreadyRunning, got {other:?}"),
            Ok(_) => panic!("second acquire must not succeed"),
        }
    }

    #[test]
    fn test_release_is_idempotent() {
        let path = temp_lock_path("idempotent");
        let handle = acquire_at(path.clone()).unwrap();

        handle.release();
        assert!(!path.exists());

        // Second release (explicit) and third (via Drop) find nothing to do
        handle.release();
        drop(handle);
        assert!(!path.exists());
    }

    #[test]
    fn test_reacquire_after_release() {
        let path = temp_lock_path("reacquire");
        let first = acquire_at(path.clone()).unwrap();
        first.release();

        let second = acquire_at(path.clone()).unwrap();
        assert!(path.exists());
        second.release();
    }

    #[test]
    fn test_unwritable_directory_is_io_error() {
        // A file standing where the parent directory should be
        let blocker = env::temp_dir().join(format!("webdesk-instance-{}-blocker", std::process::id()));
        fs::write(&blocker, b"").unwrap();

        let path = blocker.join(app::LOCK_FILE);
        match acquire_at(path) {
            Err(AcquireError::Io(_)) => {}
            Err(other) => panic!("expected Io error, got {other:?}"),
            Ok(_) => panic!("acquire must not succeed under a non-directory"),
        }
        let _ = fs::remove_file(&blocker);
    }
}
