//! Cross-process write lock.
//!
//! A single advisory lock file per store serializes writers from separate
//! processes. Acquisition polls for the OS-level exclusive lock and gives up
//! once a fixed 500ms budget elapses, returning [`TdError::Busy`]. Release is
//! guaranteed on every exit path of the critical section via `Drop`,
//! including unwinds from a panic.
//!
//! `fs2::FileExt::try_lock_exclusive` guarded by a `Drop`-releasing
//! wrapper, with an unbounded exponential backoff replaced by a flat
//! 500ms deadline.

use crate::error::{TdError, TdResult};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Total time budget for lock acquisition.
pub const LOCK_TIMEOUT: Duration = Duration::from_millis(500);
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// RAII guard for the store write lock. Releasing happens in `Drop` so the
/// lock is freed on every exit path of the critical section, including a
/// panic unwind.
pub struct WriteLock {
    file: File,
    path: PathBuf,
}

impl Drop for WriteLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

/// Acquire the store's write lock, blocking up to [`LOCK_TIMEOUT`].
pub fn acquire(path: &Path) -> TdResult<WriteLock> {
    let file = OpenOptions::new()
    .read(true)
    .write(true)
    .create(true)
    .truncate(false)
    .open(path)
    .map_err(|e| TdError::io(path, e))?;

    let deadline = Instant::now() + LOCK_TIMEOUT;
    loop {
        match file.try_lock_exclusive() {
            Ok(()) => {
                return Ok(WriteLock {
                        file,
                        path: path.to_path_buf(),
                });
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                if Instant::now() >= deadline {
                    return Err(TdError::Busy {
                            path: path.to_path_buf(),
                            timeout_ms: LOCK_TIMEOUT.as_millis() as u64,
                    });
                }
                std::thread::sleep(POLL_INTERVAL);
            }
            Err(e) => return Err(TdError::io(path, e)),
        }
    }
}
