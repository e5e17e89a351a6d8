use std::{
    ffi::OsString,
    fs::{File, OpenOptions},
    io,
    path::{Path, PathBuf},
    thread,
    time::{Duration, Instant},
};

use fs2::FileExt;
use tracing::{debug, trace};

use crate::{
    constants::LOCK_FILE_SUFFIX,
    error::{ConfigError, Result},
};

#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;

/// How long `FileLock::acquire` waits for a competing process
pub const LOCK_WAIT_TIMEOUT: Duration = Duration::from_secs(10);

const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Exclusive advisory lock on `<target>.lock`, held until released or dropped.
///
/// The lock file itself is left on disk; only the OS lock is dropped.
#[derive(Debug)]
pub struct FileLock {
    file: File,
    path: PathBuf,
    held: bool,
}

impl FileLock {
    /// Block until the lock guarding `target` is held.
    pub fn acquire(target: &Path) -> Result<Self> {
        Self::acquire_with_timeout(target, LOCK_WAIT_TIMEOUT)
    }

    pub fn acquire_with_timeout(target: &Path, timeout: Duration) -> Result<Self> {
        let path = lock_path(target);
        let file = open_lock_file(&path).map_err(|source| ConfigError::Lock {
            path: path.clone(),
            source,
        })?;

        let start = Instant::now();
        loop {
            match file.try_lock_exclusive() {
                Ok(()) => {
                    debug!("Acquired lock {}", path.display());
                    return Ok(Self {
                        file,
                        path,
                        held: true,
                    });
                }
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
                    let waited = start.elapsed();
                    if waited >= timeout {
                        return Err(ConfigError::LockTimeout { path, waited });
                    }
                    trace!("Waiting for lock {}", path.display());
                    thread::sleep(LOCK_POLL_INTERVAL);
                }
                Err(source) => return Err(ConfigError::Lock { path, source }),
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the lock. Calling this more than once is a no-op.
    pub fn release(&mut self) {
        if !self.held {
            return;
        }
        self.held = false;

        if let Err(e) = FileExt::unlock(&self.file) {
            debug!("Failed to unlock {}: {}", self.path.display(), e);
        } else {
            debug!("Released lock {}", self.path.display());
        }
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        self.release();
    }
}

/// `<target>.lock`, next to the file it guards
pub fn lock_path(target: &Path) -> PathBuf {
    let mut name = OsString::from(target.as_os_str());
    name.push(LOCK_FILE_SUFFIX);
    PathBuf::from(name)
}

fn open_lock_file(path: &Path) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.create(true).read(true).write(true);

    #[cfg(unix)]
    {
        options.mode(0o600);
    }

    options.open(path)
}
