//! Machine-wide claim on the hosting endpoint.
//!
//! Only one process may expose targets under a given endpoint. The claim is an
//! exclusive advisory lock on a well-known file, held for the life of the
//! [`Host`](super::Host) and released when it is dropped (or the process
//! exits).

use crate::{RemoteError, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug)]
pub struct MachineLock {
    file: File,
    path: PathBuf,
}

impl MachineLock {
    /// Take the lock at `path`, failing fast if another process holds it.
    pub fn acquire(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| RemoteError::io_with_path(e, parent))?;
        }

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| RemoteError::io_with_path(e, path))?;

        if let Err(e) = FileExt::try_lock_exclusive(&file) {
            if e.kind() == fs2::lock_contended_error().kind()
                || e.raw_os_error() == fs2::lock_contended_error().raw_os_error()
            {
                return Err(RemoteError::AlreadyHostedElsewhere {
                    lock_path: path.to_path_buf(),
                });
            }
            return Err(RemoteError::io_with_path(e, path));
        }

        // Owner PID, for humans inspecting the file
        file.set_len(0)
            .and_then(|_| writeln!(file, "{}", std::process::id()))
            .map_err(|e| RemoteError::io_with_path(e, path))?;

        debug!("Acquired host lock {}", path.display());

        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for MachineLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            warn!("Failed to release host lock {}: {}", self.path.display(), e);
        }
    }
}
