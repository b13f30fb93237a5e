//! The locked seed directory and its read-once seed files.

use super::lock::{lock_exclusive, LockMode};
use super::seed_file::{SeedBuf, SeedKind, SeedLenError, MAX_SEED_LEN};
use crate::eintr::read_full;
use std::fs::{self, DirBuilder, File, OpenOptions};
use std::io::{self, Write};
use std::os::unix::fs::{DirBuilderExt, OpenOptionsExt};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from seed directory and seed file operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unable to create seed directory {}: {source}", .path.display())]
    CreateDir { path: PathBuf, source: io::Error },
    #[error("unable to open seed directory {}: {source}", .path.display())]
    OpenDir { path: PathBuf, source: io::Error },
    #[error("seed directory {} is locked by another process", .path.display())]
    Locked { path: PathBuf },
    #[error("unable to lock seed directory {}: {source}", .path.display())]
    Lock { path: PathBuf, source: io::Error },
    #[error("unable to open seed file {file}: {source}")]
    Open { file: SeedKind, source: io::Error },
    #[error("unable to read seed file {file}: {source}")]
    Read { file: SeedKind, source: io::Error },
    #[error("unable to remove seed file {file} after reading, so not seeding: {source}")]
    Remove { file: SeedKind, source: io::Error },
    #[error("unable to open seed file {file} for writing: {source}")]
    Create { file: SeedKind, source: io::Error },
    #[error("unable to write seed file {file}: {source}")]
    Write { file: SeedKind, source: io::Error },
    #[error("unable to sync seed file {file}: {source}")]
    Sync { file: SeedKind, source: io::Error },
    #[error("unable to rename {from} to {to}: {source}")]
    Rename {
        from: SeedKind,
        to: SeedKind,
        source: io::Error,
    },
    #[error(transparent)]
    SeedLen(#[from] SeedLenError),
}

/// Exclusive handle on the seed directory.
///
/// Holding a `SeedStore` means holding the directory lock; it is released
/// when the store is dropped. Only one process runs the seeding protocol
/// against a directory at a time.
#[derive(Debug)]
pub struct SeedStore {
    path: PathBuf,
    dir: File,
}

impl SeedStore {
    /// Creates (mode 0700) and locks the seed directory.
    pub fn open(path: impl AsRef<Path>, mode: LockMode) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        match DirBuilder::new().mode(0o700).create(&path) {
            Ok(()) => tracing::debug!(path = %path.display(), "Created seed directory"),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
            Err(source) => return Err(StoreError::CreateDir { path, source }),
        }

        let dir = match OpenOptions::new()
            .read(true)
            .custom_flags(libc::O_DIRECTORY)
            .open(&path)
        {
            Ok(dir) => dir,
            Err(source) => return Err(StoreError::OpenDir { path, source }),
        };

        match lock_exclusive(&dir, mode) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                return Err(StoreError::Locked { path });
            }
            Err(source) => return Err(StoreError::Lock { path, source }),
        }

        tracing::debug!(path = %path.display(), "Locked seed directory");
        Ok(Self { path, dir })
    }

    /// Returns the directory path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the full path of a seed file.
    pub fn file_path(&self, kind: SeedKind) -> PathBuf {
        self.path.join(kind.file_name())
    }

    /// Reads and deletes a seed file.
    ///
    /// A missing or empty file yields `None`. At most [`MAX_SEED_LEN`] bytes
    /// are read. The deletion is made durable before the contents are
    /// returned; if it cannot be, the contents are discarded and an error
    /// is returned so that the same seed is never used twice.
    pub fn consume(&self, kind: SeedKind) -> Result<Option<SeedBuf>, StoreError> {
        let file_path = self.file_path(kind);

        let mut file = match File::open(&file_path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(file = %kind, "No seed file present");
                return Ok(None);
            }
            Err(source) => return Err(StoreError::Open { file: kind, source }),
        };

        let mut seed = SeedBuf::zeroed(MAX_SEED_LEN)?;
        let len = read_full(&mut file, seed.as_mut_slice())
            .map_err(|source| StoreError::Read { file: kind, source })?;
        seed.truncate(len);
        drop(file);

        let removed = fs::remove_file(&file_path).and_then(|()| self.dir.sync_all());
        match removed {
            Err(source) if !seed.is_empty() => {
                return Err(StoreError::Remove { file: kind, source });
            }
            Err(e) => {
                tracing::debug!(file = %kind, error = %e, "Could not remove empty seed file");
            }
            Ok(()) => {}
        }

        if seed.is_empty() {
            tracing::debug!(file = %kind, "Seed file was empty");
            return Ok(None);
        }

        tracing::debug!(file = %kind, len = seed.len(), "Consumed seed file");
        Ok(Some(seed))
    }

    /// Writes `seed` to a seed file (mode 0400), replacing any previous
    /// contents, and syncs it to disk.
    pub fn store(&self, kind: SeedKind, seed: &[u8]) -> Result<(), StoreError> {
        if seed.len() > MAX_SEED_LEN {
            return Err(SeedLenError { len: seed.len() }.into());
        }

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o400)
            .open(self.file_path(kind))
            .map_err(|source| StoreError::Create { file: kind, source })?;

        file.write_all(seed)
            .map_err(|source| StoreError::Write { file: kind, source })?;
        file.sync_all()
            .map_err(|source| StoreError::Sync { file: kind, source })?;

        tracing::debug!(file = %kind, len = seed.len(), "Stored seed file");
        Ok(())
    }

    /// Atomically renames one seed file over another.
    pub fn promote(&self, from: SeedKind, to: SeedKind) -> Result<(), StoreError> {
        fs::rename(self.file_path(from), self.file_path(to))
            .map_err(|source| StoreError::Rename { from, to, source })?;
        tracing::debug!(from = %from, to = %to, "Promoted seed file");
        Ok(())
    }
}
