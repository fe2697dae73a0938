/*!
This module contains a decorator that limits the number of bytes a file system may hold.

The decorator keeps a running total of the bytes stored in the wrapped file system. The total is
guarded by its own mutex, independent of any lock inside the wrapped file system. Mutating calls
hold the mutex across the quota check, the forwarded call and the update of the total so that
concurrent writes and deletes cannot lose updates. Reads never touch the mutex.
*/

use parking_lot::Mutex;
use std::sync::Arc;

use crate::config::ROOT_PATH;
use crate::errors::{FsError, FsResult};
use crate::options::QuotaOptions;
use crate::utils::path::clean_path;

use super::traits::{FileInfo, FileSystem, FsUsage, ReadonlyFile, WriteOutcome};

/// File system decorator that rejects writes which would exceed a byte ceiling.
pub struct QuotaFileSystem {
    /// The wrapped file system.
    inner: Arc<dyn FileSystem>,

    /// The ceiling on the number of stored bytes.
    max_size_bytes: u64,

    /// Evict the oldest files instead of rejecting writes that do not fit.
    purge: bool,

    /// The number of bytes currently stored in the wrapped file system.
    current_size_bytes: Mutex<u64>,
}

/// Public methods
impl QuotaFileSystem {
    /**
    Wrap `inner` with a quota.

    The running total starts at the number of bytes `inner` already holds. It is fine for that to
    exceed the ceiling, in which case writes that grow the total are rejected until enough has been
    deleted.
    */
    pub fn new(inner: Arc<dyn FileSystem>, options: QuotaOptions) -> FsResult<Self> {
        let initial_size = inner.usage()?.bytes;

        log::info!(
            "Limiting {name} to {max} bytes ({initial_size} bytes in use, purge: {purge})",
            name = inner.get_name(),
            max = options.max_size_bytes,
            purge = options.purge
        );

        Ok(Self {
            inner,
            max_size_bytes: options.max_size_bytes,
            purge: options.purge,
            current_size_bytes: Mutex::new(initial_size),
        })
    }

    /// Get the number of bytes currently stored.
    pub fn current_size(&self) -> u64 {
        *self.current_size_bytes.lock()
    }

    /// Get the ceiling on the number of stored bytes.
    pub fn max_size(&self) -> u64 {
        self.max_size_bytes
    }
}

/// Private methods
impl QuotaFileSystem {
    /// Get the size of the file currently stored at the clean `path`, or 0 if there is none.
    fn existing_size(&self, path: &str) -> FsResult<u64> {
        match self.inner.stat(path) {
            Ok(info) if !info.is_dir => Ok(info.size),
            Ok(_) => Ok(0),
            Err(FsError::NotFound(_)) => Ok(0),
            Err(err) => Err(err),
        }
    }

    /// Build the error returned for a write that does not fit.
    fn quota_exceeded(&self, path: &str, requested_bytes: u64, current_bytes: u64) -> FsError {
        log::debug!(
            "Rejecting a write of {requested_bytes} bytes to {path}: {current_bytes} of {max} \
            bytes in use",
            max = self.max_size_bytes
        );

        FsError::QuotaExceeded {
            path: path.to_string(),
            requested_bytes,
            current_bytes,
            max_bytes: self.max_size_bytes,
        }
    }

    /**
    Delete the oldest files other than `keep_path` until at least `bytes_to_free` bytes were freed.

    The files to evict are chosen before anything is deleted. If deleting every other file would
    still not free enough, nothing is deleted and false is returned. The caller must hold the
    accounting lock and pass in its guarded total.
    */
    fn purge_oldest(
        &self,
        keep_path: &str,
        bytes_to_free: u64,
        current: &mut u64,
    ) -> FsResult<bool> {
        let mut candidates: Vec<FileInfo> = self
            .inner
            .list(ROOT_PATH, "")?
            .into_iter()
            .filter(|file| file.path != keep_path)
            .collect();
        candidates.sort_by(|a, b| a.modified.cmp(&b.modified).then(a.path.cmp(&b.path)));

        let mut planned_bytes: u64 = 0;
        let mut num_to_evict: usize = 0;
        for file in candidates.iter() {
            if planned_bytes >= bytes_to_free {
                break;
            }

            planned_bytes += file.size;
            num_to_evict += 1;
        }

        if planned_bytes < bytes_to_free {
            log::debug!(
                "Cannot free {bytes_to_free} bytes for {keep_path}, only {planned_bytes} bytes \
                can be evicted"
            );
            return Ok(false);
        }

        for file in candidates.iter().take(num_to_evict) {
            match self.inner.delete_file(&file.path) {
                Ok(size) => {
                    log::info!(
                        "Purged {path} ({size} bytes) to make room for {keep_path}",
                        path = file.path
                    );
                    *current = current.saturating_sub(size);
                }
                Err(FsError::NotFound(_)) => {}
                Err(err) => return Err(err),
            }
        }

        Ok(true)
    }
}

impl FileSystem for QuotaFileSystem {
    fn get_name(&self) -> String {
        format!("QuotaFileSystem({})", self.inner.get_name())
    }

    fn list(&self, root: &str, pattern: &str) -> FsResult<Vec<FileInfo>> {
        self.inner.list(root, pattern)
    }

    fn open(&self, path: &str) -> FsResult<Box<dyn ReadonlyFile>> {
        self.inner.open(path)
    }

    fn write_file(&self, path: &str, data: &[u8]) -> FsResult<WriteOutcome> {
        let path = clean_path(path);
        let new_size = data.len() as u64;

        let mut current = self.current_size_bytes.lock();
        if new_size > self.max_size_bytes {
            return Err(self.quota_exceeded(&path, new_size, *current));
        }

        let existing_size = self.existing_size(&path)?;
        let size_without_file = current.saturating_sub(existing_size);
        let projected_size = size_without_file + new_size;

        if projected_size > self.max_size_bytes {
            if !self.purge {
                return Err(self.quota_exceeded(
                    &path,
                    new_size.saturating_sub(existing_size),
                    *current,
                ));
            }

            let bytes_to_free = projected_size - self.max_size_bytes;
            if !self.purge_oldest(&path, bytes_to_free, &mut current)? {
                return Err(self.quota_exceeded(
                    &path,
                    new_size.saturating_sub(existing_size),
                    *current,
                ));
            }
        }

        let outcome = self.inner.write_file(&path, data)?;
        *current = current.saturating_sub(existing_size) + outcome.size;

        Ok(outcome)
    }

    fn delete_file(&self, path: &str) -> FsResult<u64> {
        let mut current = self.current_size_bytes.lock();
        let size = self.inner.delete_file(path)?;
        *current = current.saturating_sub(size);

        Ok(size)
    }

    fn stat(&self, path: &str) -> FsResult<FileInfo> {
        self.inner.stat(path)
    }

    fn rename(&self, from: &str, to: &str) -> FsResult<()> {
        let from = clean_path(from);
        let to = clean_path(to);
        if from == to {
            return self.inner.rename(&from, &to);
        }

        let mut current = self.current_size_bytes.lock();
        // A file at the destination is replaced and stops counting
        let replaced_size = self.existing_size(&to)?;
        self.inner.rename(&from, &to)?;
        *current = current.saturating_sub(replaced_size);

        Ok(())
    }

    fn usage(&self) -> FsResult<FsUsage> {
        let current = self.current_size_bytes.lock();
        let inner_usage = self.inner.usage()?;

        Ok(FsUsage {
            bytes: *current,
            files: inner_usage.files,
            limit: Some(self.max_size_bytes),
        })
    }
}

impl std::fmt::Debug for QuotaFileSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuotaFileSystem")
            .field("inner", &self.inner)
            .field("max_size_bytes", &self.max_size_bytes)
            .field("purge", &self.purge)
            .field("current_size_bytes", &self.current_size())
            .finish()
    }
}
