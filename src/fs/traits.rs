/*!
The capability contract shared by every file system backend and decorator.

Application code only ever talks to a [`FileSystem`] trait object. Backends (memory, disk, object
store) implement the contract directly and decorators (quota, read-only) implement it by wrapping
another `Arc<dyn FileSystem>`, so restrictions can be layered in any order at construction time
without call sites changing.
*/

use core::fmt::Debug;
use std::io::{Read, Seek};
use std::time::SystemTime;

use crate::config::{READER_BUFFER_INITIAL_CAPACITY, ROOT_PATH};
use crate::errors::{FsError, FsResult};

/**
A detached metadata record for a file.

This is a copy taken at the time of the call and is not affected by later writes to the file.
*/
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FileInfo {
    /// The clean logical path of the file.
    pub path: String,

    /// The size of the file in bytes.
    pub size: u64,

    /// When the file was last written.
    pub modified: SystemTime,

    /// True if the path names a directory rather than a file.
    pub is_dir: bool,

    /// A CRC-32C checksum of the contents, if the backend keeps one.
    pub checksum: Option<u32>,
}

impl FileInfo {
    /// Create a [`FileInfo`] for a regular file without a checksum.
    pub fn file(path: String, size: u64, modified: SystemTime) -> Self {
        Self {
            path,
            size,
            modified,
            is_dir: false,
            checksum: None,
        }
    }

    /// Create a [`FileInfo`] for a directory.
    pub fn dir(path: String, modified: SystemTime) -> Self {
        Self {
            path,
            size: 0,
            modified,
            is_dir: true,
            checksum: None,
        }
    }
}

/// The result of a successful write.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct WriteOutcome {
    /// The number of bytes stored.
    pub size: u64,

    /// True if the path did not exist before the write.
    pub created: bool,
}

/// Storage usage of a file system.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FsUsage {
    /// The number of bytes currently stored.
    pub bytes: u64,

    /// The number of files currently stored.
    pub files: usize,

    /// The maximum number of bytes that may be stored, if there is a limit.
    pub limit: Option<u64>,
}

/// The files removed by a [`FileSystem::remove_list`] call.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RemovedFiles {
    /// Metadata of each removed file as it was listed.
    pub files: Vec<FileInfo>,

    /// The total number of bytes freed.
    pub bytes: u64,
}

/**
A readable handle to the contents of a file.

The handle is bound to the file as it was when it was opened. For the in-memory file system this
is a true snapshot that later writes cannot affect. Other backends only provide a best-effort
guarantee. Dropping the handle releases it.
*/
pub trait ReadonlyFile: Read + Seek + Send {
    /// Read a number of bytes starting from a given offset without moving the cursor.
    fn read_from(&self, buf: &mut [u8], offset: usize) -> FsResult<usize>;

    /// Get the length of the file.
    fn len(&self) -> u64;

    /// Return true if the file is empty. Otherwise, false.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the metadata of the file as of the time it was opened.
    fn info(&self) -> FileInfo;
}

/**
An interface for blob storage operations.

Paths are logical, `/`-separated and rooted at `/`. Implementations canonicalize the paths they
receive so callers may pass unclean paths.

# Concurrency

Implementations must be safe to call from many threads at once.
*/
pub trait FileSystem: Send + Sync {
    /// Return the name of file system implementation being used.
    fn get_name(&self) -> String;

    /**
    List the files under `root` that match the glob `pattern`.

    Patterns starting with `/` are matched against the full path and other patterns against the
    path relative to `root`. An empty pattern lists everything under `root`. Results are sorted
    lexicographically by path.
    */
    fn list(&self, root: &str, pattern: &str) -> FsResult<Vec<FileInfo>>;

    /// Open the file at `path` for reading.
    fn open(&self, path: &str) -> FsResult<Box<dyn ReadonlyFile>>;

    /// Create or atomically replace the file at `path` with `data`.
    fn write_file(&self, path: &str, data: &[u8]) -> FsResult<WriteOutcome>;

    /**
    Remove the file at `path`.

    Returns the size of the removed file. Readers that already opened the file are unaffected.
    */
    fn delete_file(&self, path: &str) -> FsResult<u64>;

    /// Get the metadata of the file or directory at `path`.
    fn stat(&self, path: &str) -> FsResult<FileInfo>;

    /// Move the file at `from` to `to`, replacing any file already at `to`.
    fn rename(&self, from: &str, to: &str) -> FsResult<()>;

    /// Read the whole file at `path`.
    fn read_file(&self, path: &str) -> FsResult<Vec<u8>> {
        let mut file = self.open(path)?;
        let mut contents = Vec::with_capacity(file.len() as usize);
        file.read_to_end(&mut contents)?;

        Ok(contents)
    }

    /**
    Create or replace the file at `path` with everything `reader` produces.

    The reader is drained completely before anything is written so a failing reader never leaves a
    partial file behind.
    */
    fn write_file_reader(&self, path: &str, reader: &mut dyn Read) -> FsResult<WriteOutcome> {
        let mut contents = Vec::with_capacity(READER_BUFFER_INITIAL_CAPACITY);
        reader.read_to_end(&mut contents)?;

        self.write_file(path, &contents)
    }

    /// Copy the file at `from` to `to`.
    fn copy(&self, from: &str, to: &str) -> FsResult<WriteOutcome> {
        let contents = self.read_file(from)?;
        self.write_file(to, &contents)
    }

    /**
    Remove every file under `root` that matches `pattern`.

    Files that disappear between listing and removal are skipped.
    */
    fn remove_list(&self, root: &str, pattern: &str) -> FsResult<RemovedFiles> {
        let mut removed = RemovedFiles::default();
        for file in self.list(root, pattern)? {
            match self.delete_file(&file.path) {
                Ok(size) => {
                    removed.bytes += size;
                    removed.files.push(file);
                }
                Err(FsError::NotFound(_)) => {}
                Err(err) => return Err(err),
            }
        }

        Ok(removed)
    }

    /// Get the current storage usage.
    fn usage(&self) -> FsResult<FsUsage> {
        let files = self.list(ROOT_PATH, "")?;
        Ok(FsUsage {
            bytes: files.iter().map(|file| file.size).sum(),
            files: files.len(),
            limit: None,
        })
    }
}

impl Debug for dyn ReadonlyFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReadonlyFile")
    }
}

impl Debug for dyn FileSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.get_name())
    }
}
