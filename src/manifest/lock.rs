//! Advisory lock serializing manifest writers across processes.
//!
//! The lock is an exclusive `flock` on a dedicated lock file. It is released
//! when the guard (and with it the file descriptor) is dropped.
use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct ManifestLock {
    held: Option<(File, PathBuf)>,
}

impl ManifestLock {
    /// Block until the exclusive lock on `path` is acquired.
    pub fn acquire(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(path)
            .with_context(|| format!("open lock {}", path.display()))?;
        flock_exclusive(&file).with_context(|| format!("lock {}", path.display()))?;
        tracing::debug!(path = %path.display(), "manifest lock acquired");
        Ok(Self {
            held: Some((file, path.to_path_buf())),
        })
    }

    /// A guard that holds nothing, for backends without cross-process state.
    pub fn unlocked() -> Self {
        Self { held: None }
    }

    #[cfg(test)]
    pub fn is_held(&self) -> bool {
        self.held.is_some()
    }
}

impl Drop for ManifestLock {
    fn drop(&mut self) {
        if let Some((_, path)) = &self.held {
            tracing::debug!(path = %path.display(), "manifest lock released");
        }
    }
}

#[cfg(unix)]
fn flock_exclusive(file: &File) -> io::Result<()> {
    use std::os::unix::io::AsRawFd;
    let fd = file.as_raw_fd();
    loop {
        // SAFETY: fd is a valid descriptor owned by `file` for the duration of
        // the call; LOCK_EX blocks until the lock is granted.
        let result = unsafe { libc::flock(fd, libc::LOCK_EX) };
        if result == 0 {
            return Ok(());
        }
        let err = io::Error::last_os_error();
        if err.kind() != io::ErrorKind::Interrupted {
            return Err(err);
        }
    }
}

#[cfg(not(unix))]
fn flock_exclusive(_file: &File) -> io::Result<()> {
    Ok(())
}
