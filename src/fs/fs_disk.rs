/*!
This module contains a file system that stores files on local disk below a root directory.

Logical paths map onto host paths relative to the root, so `/hls/seg-1.ts` is stored at
`<root>/hls/seg-1.ts`. Writes go to a temporary file in the destination directory which is then
renamed over the target, so readers never see a partially written file. Temporary files carry a
reserved name prefix and are left out of listings. Unlike the in-memory file
system, an open handle reads from the live file and is not isolated from later writes beyond what
the operating system provides.
*/

use std::fs::{self, File};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tempfile::{Builder, TempDir};

use crate::config::DISK_TEMP_FILE_PREFIX;
use crate::errors::{FsError, FsResult};
use crate::glob::ListFilter;
use crate::utils::path::{clean_path, logical_from_host, relative_to};

use super::traits::{FileInfo, FileSystem, ReadonlyFile, WriteOutcome};

/// File system implementation that delegates I/O to the operating system.
pub struct DiskFileSystem {
    /// The directory all logical paths are relative to.
    root: PathBuf,

    /**
    Keeps a temporary root alive.

    The directory and everything in it is removed when the file system is dropped.
    */
    _temp_dir: Option<TempDir>,
}

/// Public methods
impl DiskFileSystem {
    /// Create an instance of [`DiskFileSystem`] rooted at `root`, creating the directory if needed.
    pub fn new<P: AsRef<Path>>(root: P) -> FsResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;

        Ok(DiskFileSystem {
            root,
            _temp_dir: None,
        })
    }

    /**
    Create an instance of [`DiskFileSystem`] rooted at a new temporary directory.

    The directory is created inside `parent` if provided and inside the system's temporary
    directory otherwise. It is deleted when the file system is dropped.
    */
    pub fn temporary(parent: Option<&Path>) -> FsResult<Self> {
        let temp_dir = match parent {
            Some(path) => TempDir::new_in(path)?,
            None => TempDir::new()?,
        };

        Ok(DiskFileSystem {
            root: temp_dir.path().to_path_buf(),
            _temp_dir: Some(temp_dir),
        })
    }

    /// Get the root directory of this file system.
    pub fn root_path(&self) -> &Path {
        &self.root
    }
}

/// Private methods
impl DiskFileSystem {
    /// Get the host path for the clean logical `path`.
    fn host_path(&self, path: &str) -> PathBuf {
        let relative = relative_to(path, "/");
        if relative.is_empty() {
            return self.root.clone();
        }

        self.root.join(relative)
    }

    /// Get metadata for the clean logical `path` and fail if it is not a regular file.
    fn file_metadata(&self, path: &str) -> FsResult<fs::Metadata> {
        let metadata = fs::metadata(self.host_path(path))?;
        if !metadata.is_file() {
            return Err(FsError::not_found(path));
        }

        Ok(metadata)
    }

    /// Build a [`FileInfo`] for the clean logical `path` from host metadata.
    fn to_info(path: String, metadata: &fs::Metadata) -> FileInfo {
        let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        if metadata.is_dir() {
            return FileInfo::dir(path, modified);
        }

        FileInfo::file(path, metadata.len(), modified)
    }

    /**
    Recursively collect the files below `dir` that the filter accepts.

    Entries that vanish while the directory is walked are skipped.
    */
    fn walk(&self, dir: &Path, filter: &ListFilter, results: &mut Vec<FileInfo>) -> FsResult<()> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(err) => return Err(err.into()),
        };

        for maybe_entry in entries {
            let entry = maybe_entry?;
            let host_path = entry.path();
            let metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                Err(err) if err.kind() == io::ErrorKind::NotFound => continue,
                Err(err) => return Err(err.into()),
            };

            if metadata.is_dir() {
                self.walk(&host_path, filter, results)?;
                continue;
            }

            if !metadata.is_file() {
                continue;
            }

            // Writes that are still in flight
            if entry
                .file_name()
                .to_str()
                .map_or(false, |name| name.starts_with(DISK_TEMP_FILE_PREFIX))
            {
                continue;
            }

            let logical_path = match host_path
                .strip_prefix(&self.root)
                .ok()
                .and_then(logical_from_host)
            {
                Some(logical_path) => logical_path,
                None => {
                    log::warn!(
                        "Skipping {path} because it cannot be represented as a logical path",
                        path = host_path.to_string_lossy()
                    );
                    continue;
                }
            };

            if filter.accepts(&logical_path) {
                results.push(DiskFileSystem::to_info(logical_path, &metadata));
            }
        }

        Ok(())
    }
}

impl FileSystem for DiskFileSystem {
    fn get_name(&self) -> String {
        "DiskFileSystem".to_string()
    }

    fn list(&self, root: &str, pattern: &str) -> FsResult<Vec<FileInfo>> {
        let filter = ListFilter::new(&clean_path(root), pattern)?;
        let mut results = vec![];
        self.walk(&self.host_path(filter.root()), &filter, &mut results)?;
        results.sort_by(|a, b| a.path.cmp(&b.path));

        Ok(results)
    }

    fn open(&self, path: &str) -> FsResult<Box<dyn ReadonlyFile>> {
        let path = clean_path(path);
        let file = File::open(self.host_path(&path))?;
        let metadata = file.metadata()?;
        if !metadata.is_file() {
            return Err(FsError::not_found(&path));
        }

        let info = DiskFileSystem::to_info(path, &metadata);
        Ok(Box::new(DiskFileReader { file, info }))
    }

    fn write_file(&self, path: &str, data: &[u8]) -> FsResult<WriteOutcome> {
        let path = clean_path(path);
        let host_path = self.host_path(&path);
        let parent = host_path
            .parent()
            .ok_or_else(|| FsError::not_found(&path))?
            .to_path_buf();
        fs::create_dir_all(&parent)?;

        let created = !host_path.is_file();
        let mut temp_file = Builder::new()
            .prefix(DISK_TEMP_FILE_PREFIX)
            .tempfile_in(&parent)?;
        temp_file.write_all(data)?;
        temp_file.flush()?;
        temp_file
            .persist(&host_path)
            .map_err(|persist_err| FsError::from(persist_err.error))?;

        log::debug!(
            "Wrote {size} bytes to {path} on disk (created: {created})",
            size = data.len()
        );

        Ok(WriteOutcome {
            size: data.len() as u64,
            created,
        })
    }

    fn delete_file(&self, path: &str) -> FsResult<u64> {
        let path = clean_path(path);
        let size = self.file_metadata(&path)?.len();
        fs::remove_file(self.host_path(&path))?;

        log::debug!("Deleted {path} ({size} bytes) from disk");

        Ok(size)
    }

    fn stat(&self, path: &str) -> FsResult<FileInfo> {
        let path = clean_path(path);
        let metadata = fs::metadata(self.host_path(&path))?;

        Ok(DiskFileSystem::to_info(path, &metadata))
    }

    fn rename(&self, from: &str, to: &str) -> FsResult<()> {
        let from = clean_path(from);
        let to = clean_path(to);
        self.file_metadata(&from)?;

        let to_host_path = self.host_path(&to);
        if let Some(parent) = to_host_path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::rename(self.host_path(&from), to_host_path)?;

        Ok(())
    }
}

impl std::fmt::Debug for DiskFileSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiskFileSystem")
            .field("root", &self.root)
            .field("is_temporary", &self._temp_dir.is_some())
            .finish()
    }
}

/// A file on disk opened for reading.
struct DiskFileReader {
    /// The open file.
    file: File,

    /// Metadata as of the time the file was opened.
    info: FileInfo,
}

impl Read for DiskFileReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

impl Seek for DiskFileReader {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.file.seek(pos)
    }
}

impl ReadonlyFile for DiskFileReader {
    #[cfg(target_family = "windows")]
    fn read_from(&self, buf: &mut [u8], offset: usize) -> FsResult<usize> {
        use std::os::windows::prelude::FileExt;

        Ok(self.file.seek_read(buf, offset as u64)?)
    }

    #[cfg(target_family = "unix")]
    fn read_from(&self, buf: &mut [u8], offset: usize) -> FsResult<usize> {
        use std::os::unix::prelude::FileExt;

        Ok(self.file.read_at(buf, offset as u64)?)
    }

    fn len(&self) -> u64 {
        self.info.size
    }

    fn info(&self) -> FileInfo {
        self.info.clone()
    }
}
