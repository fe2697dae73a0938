//! This module contains a decorator that turns any file system into a read-only one.

use std::io::Read;
use std::sync::Arc;

use crate::errors::{FsError, FsResult};

use super::traits::{FileInfo, FileSystem, FsUsage, ReadonlyFile, RemovedFiles, WriteOutcome};

/**
File system decorator that rejects every mutation.

Mutating calls fail with [`FsError::PermissionDenied`] and are never forwarded, so the wrapped file
system is left untouched. Reads are forwarded unchanged.
*/
pub struct ReadOnlyFileSystem {
    /// The wrapped file system.
    inner: Arc<dyn FileSystem>,
}

/// Public methods
impl ReadOnlyFileSystem {
    /// Wrap `inner` so that it can only be read.
    pub fn new(inner: Arc<dyn FileSystem>) -> Self {
        Self { inner }
    }
}

/// Private methods
impl ReadOnlyFileSystem {
    /// Build the error returned for a rejected operation.
    fn deny(&self, operation: &str, path: &str) -> FsError {
        log::debug!("Rejecting {operation} on {path} for the read-only file system");
        FsError::permission_denied(operation, path)
    }
}

impl FileSystem for ReadOnlyFileSystem {
    fn get_name(&self) -> String {
        format!("ReadOnlyFileSystem({})", self.inner.get_name())
    }

    fn list(&self, root: &str, pattern: &str) -> FsResult<Vec<FileInfo>> {
        self.inner.list(root, pattern)
    }

    fn open(&self, path: &str) -> FsResult<Box<dyn ReadonlyFile>> {
        self.inner.open(path)
    }

    fn write_file(&self, path: &str, _data: &[u8]) -> FsResult<WriteOutcome> {
        Err(self.deny("write", path))
    }

    fn delete_file(&self, path: &str) -> FsResult<u64> {
        Err(self.deny("delete", path))
    }

    fn stat(&self, path: &str) -> FsResult<FileInfo> {
        self.inner.stat(path)
    }

    fn rename(&self, from: &str, _to: &str) -> FsResult<()> {
        Err(self.deny("rename", from))
    }

    fn read_file(&self, path: &str) -> FsResult<Vec<u8>> {
        self.inner.read_file(path)
    }

    fn write_file_reader(&self, path: &str, _reader: &mut dyn Read) -> FsResult<WriteOutcome> {
        // Do not drain the reader
        Err(self.deny("write", path))
    }

    fn copy(&self, _from: &str, to: &str) -> FsResult<WriteOutcome> {
        Err(self.deny("copy", to))
    }

    fn remove_list(&self, root: &str, _pattern: &str) -> FsResult<RemovedFiles> {
        Err(self.deny("remove", root))
    }

    fn usage(&self) -> FsResult<FsUsage> {
        self.inner.usage()
    }
}

impl std::fmt::Debug for ReadOnlyFileSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadOnlyFileSystem")
            .field("inner", &self.inner)
            .finish()
    }
}
