//! Cross-process liveness through advisory file locks.
//!
//! A running browser process holds an exclusive `fs2` lock on
//! `locks/session_<id>.lock` for as long as it owns the session. The lock is
//! released by the kernel when the process dies, so a crash never leaves a
//! session looking live.
//!
//! Lock files are never removed. Unlinking a path that another process may
//! already have open would let that process lock an orphaned inode that no
//! liveness check can see.

use crate::domain::SessionId;
use crate::error::StoreError;
use crate::paths;
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Attempts made by [`SessionLock::acquire`] before reporting a live owner.
const ACQUIRE_ATTEMPTS: u32 = 5;

/// Pause between attempts; long enough for a concurrent liveness check to finish.
const ACQUIRE_RETRY_DELAY: Duration = Duration::from_millis(20);

/// Ownership of one session, held for the lifetime of the owning process.
#[derive(Debug)]
pub struct SessionLock {
    file: File,
    path: PathBuf,
    session_id: SessionId,
}

impl SessionLock {
    /// Takes the session lock without blocking.
    ///
    /// Fails with [`StoreError::AlreadyLive`] when another owner holds it.
    /// Contention is retried a few times, since a liveness check holds a
    /// shared lock for a moment.
    pub fn acquire(lock_dir: &Path, session_id: &SessionId) -> Result<Self, StoreError> {
        fs::create_dir_all(lock_dir).map_err(|e| StoreError::io(lock_dir, e))?;
        let path = paths::session_lock_path(lock_dir, session_id.as_str());
        let mut file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|e| StoreError::io(&path, e))?;

        let mut attempt = 1;
        loop {
            match FileExt::try_lock_exclusive(&file) {
                Ok(()) => break,
                Err(e) if e.kind() == ErrorKind::WouldBlock && attempt < ACQUIRE_ATTEMPTS => {
                    attempt += 1;
                    std::thread::sleep(ACQUIRE_RETRY_DELAY);
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => {
                    return Err(StoreError::AlreadyLive {
                        id: session_id.to_string(),
                    });
                }
                Err(e) => return Err(StoreError::io(&path, e)),
            }
        }

        // Owner pid, for humans inspecting the lock directory.
        file.set_len(0).map_err(|e| StoreError::io(&path, e))?;
        writeln!(file, "{}", std::process::id()).map_err(|e| StoreError::io(&path, e))?;

        tracing::debug!(session_id = %session_id, path = %path.display(), "session lock acquired");
        Ok(Self {
            file,
            path,
            session_id: session_id.clone(),
        })
    }

    #[cfg(test)]
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Releases the lock. The file stays in place for the next owner.
    pub fn release(self) -> Result<(), StoreError> {
        FileExt::unlock(&self.file)
            .map_err(|e| StoreError::io(&self.path, e))?;
        tracing::debug!(session_id = %self.session_id, "session lock released");
        Ok(())
    }
}

/// Probes a lock file: true while some process holds it.
///
/// A missing file means no owner. The probe takes a shared lock for a
/// moment when the file is free, so the answer is advisory and an owner
/// starting at the same time retries in [`SessionLock::acquire`].
pub fn probe(path: &Path) -> std::io::Result<bool> {
    let file = match OpenOptions::new().read(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    };
    match FileExt::try_lock_shared(&file) {
        Ok(()) => {
            FileExt::unlock(&file)?;
            Ok(false)
        }
        Err(e) if e.kind() == ErrorKind::WouldBlock => Ok(true),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
#[path = "tests/liveness_tests.rs"]
mod tests;
