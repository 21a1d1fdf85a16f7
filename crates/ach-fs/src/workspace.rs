//! Staged writes for `scratch/` and exclusive locking for `merged/`.
//!
//! [`Workspace`] stages files under a scratch directory and only makes them
//! visible to the rest of the pipeline on [`Workspace::commit`], which
//! atomically swaps the staging directory into place via [`replace_dir`].
//! Dropping an uncommitted workspace removes the scratch directory, so a
//! panicking or early-returning merge/processor stage never leaves partial
//! output behind.
//!
//! [`MergeLock`] serializes concurrent merges into the same destination's
//! open (not-yet-uploaded) file — two merge runs racing on the same
//! `{date}-{routing}-{seq}.ach` file would otherwise interleave writes.

use crate::primitives::{replace_dir, ReplaceDirOptions};
use crate::{Error, Result};
use fs2::FileExt;
use std::fs::File;
use std::path::{Path, PathBuf};

pub struct Workspace {
    staging: PathBuf,
    committed: bool,
}

impl Workspace {
    pub fn new(staging_dir: impl AsRef<Path>) -> Result<Self> {
        let staging = staging_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&staging).map_err(|e| Error::Write {
            path: staging.clone(),
            source: e,
        })?;
        Ok(Self {
            staging,
            committed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.staging
    }

    pub fn write(&self, relative: &Path, content: &[u8]) -> Result<()> {
        let full_path = self.staging.join(relative);
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::Write {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        crate::atomic_write(&full_path, content, crate::AtomicWriteOptions::new())
    }

    /// Atomically swaps the staged contents into `destination`, consuming
    /// the workspace so `Drop` can't race the commit.
    pub fn commit(mut self, destination: impl AsRef<Path>) -> Result<()> {
        replace_dir(&self.staging, destination.as_ref(), ReplaceDirOptions::new())?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if !self.committed && self.staging.exists() {
            let _ = std::fs::remove_dir_all(&self.staging);
        }
    }
}

/// Holds an OS-level exclusive lock on `path` for the lifetime of the value.
/// Used to guard a single destination's open merged file against concurrent
/// merge runs; the lock is released on drop even if the holder panics.
pub struct MergeLock {
    file: File,
    path: PathBuf,
}

impl MergeLock {
    /// Blocks until the lock is acquired.
    pub fn acquire(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = Self::open(&path)?;
        file.lock_exclusive().map_err(|e| Error::Lock {
            path: path.clone(),
            source: e,
        })?;
        Ok(Self { file, path })
    }

    /// Returns `Ok(None)` instead of blocking if another process already
    /// holds the lock.
    pub fn try_acquire(path: impl AsRef<Path>) -> Result<Option<Self>> {
        let path = path.as_ref().to_path_buf();
        let file = Self::open(&path)?;
        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(Self { file, path })),
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(Error::Lock { path, source: e }),
        }
    }

    fn open(path: &Path) -> Result<File> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::Write {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        File::options()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| Error::Lock {
                path: path.to_path_buf(),
                source: e,
            })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for MergeLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}
