/*!
This module contains the in-memory file system.

# Design

Files are immutable snapshots ([`MemFile`]) shared through [`Arc`]. Writing a file never touches the
bytes of the previous snapshot: a new snapshot is built first and then published by swapping a
pointer. A reader that opened the previous snapshot keeps its own `Arc` and continues to see the
old bytes in full until it drops its handle, at which point the old snapshot is freed.

The path table is split into shards. Each shard is a `BTreeMap` from clean path to a slot, guarded
by a [`RwLock`] that protects only the structure of the map. A slot is an [`ArcSwap`] holding the
current snapshot for a path, so replacing an existing file only needs the shard's read lock and a
single atomic swap. Creating, deleting and renaming files change the structure of a map and take
the write lock. No lock is ever held while payload bytes are copied.

Locks on more than one shard are always acquired in shard index order. Listing takes every shard's
read lock and renaming takes the write locks of the shards involved, which makes a rename atomic
with respect to a listing.
*/

use arc_swap::ArcSwap;
use parking_lot::RwLock;
use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::fs;
use std::hash::{Hash, Hasher};
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;

use crate::config::{NUM_PATH_TABLE_SHARDS, ROOT_PATH};
use crate::errors::{FsError, FsResult};
use crate::glob::ListFilter;
use crate::options::MemFsOptions;
use crate::utils::crc;
use crate::utils::path::{clean_path, dir_prefix, logical_from_host};

use super::observer::FsObserver;
use super::traits::{FileInfo, FileSystem, FsUsage, ReadonlyFile, WriteOutcome};

/// An immutable snapshot of the contents of a file.
#[derive(Debug)]
pub(crate) struct MemFile {
    /// The clean logical path of the file.
    path: String,

    /// The contents of the file.
    contents: Arc<[u8]>,

    /// When this snapshot was created.
    modified: SystemTime,

    /// CRC-32C of the contents.
    checksum: u32,
}

/// Crate-only methods
impl MemFile {
    /// Create a new snapshot. The checksum is calculated here, before the snapshot is published.
    pub(crate) fn new(path: String, contents: Arc<[u8]>, modified: SystemTime) -> Self {
        let checksum = crc::checksum(&contents);
        Self {
            path,
            contents,
            modified,
            checksum,
        }
    }

    /// Create a snapshot of the same contents under a different path.
    fn renamed(&self, path: String) -> Self {
        Self {
            path,
            contents: Arc::clone(&self.contents),
            modified: self.modified,
            checksum: self.checksum,
        }
    }

    /// Get the size of the file in bytes.
    pub(crate) fn len(&self) -> u64 {
        self.contents.len() as u64
    }

    /// Get a detached copy of the metadata of this snapshot.
    pub(crate) fn info(&self) -> FileInfo {
        FileInfo {
            path: self.path.clone(),
            size: self.len(),
            modified: self.modified,
            is_dir: false,
            checksum: Some(self.checksum),
        }
    }
}

/// The current snapshot of a single path.
type Slot = ArcSwap<MemFile>;

/// One lock-protected partition of the path table.
type Shard = RwLock<BTreeMap<String, Slot>>;

/// File system implementation that is backed by memory.
pub struct MemFileSystem {
    /// The shards of the path table.
    shards: Vec<Shard>,

    /// Notified after every successful mutation.
    observer: Option<Arc<dyn FsObserver>>,
}

/// Public methods
impl MemFileSystem {
    /**
    Create a new instance of the in-memory file system.

    # Errors

    Returns [`FsError::NotFound`] if a seed directory was configured but does not exist, and
    [`FsError::Medium`] if it could not be read.
    */
    pub fn new(options: MemFsOptions) -> FsResult<Self> {
        let mut shards = Vec::with_capacity(NUM_PATH_TABLE_SHARDS);
        for _ in 0..NUM_PATH_TABLE_SHARDS {
            shards.push(RwLock::new(BTreeMap::new()));
        }

        let file_system = Self {
            shards,
            observer: options.observer,
        };

        if let Some(seed_dir) = options.seed_dir.as_ref() {
            file_system.load_dir(seed_dir)?;
        }

        Ok(file_system)
    }
}

/// Private methods
impl MemFileSystem {
    /// Get the index of the shard responsible for the clean `path`.
    fn shard_index(path: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        path.hash(&mut hasher);
        (hasher.finish() as usize) % NUM_PATH_TABLE_SHARDS
    }

    /// Get the shard responsible for the clean `path`.
    fn shard(&self, path: &str) -> &Shard {
        &self.shards[MemFileSystem::shard_index(path)]
    }

    /// Get the current snapshot at the clean `path`.
    fn get_file(&self, path: &str) -> Option<Arc<MemFile>> {
        self.shard(path).read().get(path).map(|slot| slot.load_full())
    }

    /// Returns true if some file lives below the clean `path`.
    fn has_children(&self, path: &str) -> bool {
        let prefix = dir_prefix(path);
        self.shards.iter().any(|shard| {
            shard
                .read()
                .range(prefix.clone()..)
                .next()
                .map_or(false, |(key, _)| key.starts_with(&prefix))
        })
    }

    /**
    Publish `file` as the current snapshot of its path.

    Returns the previous snapshot if the path already existed.
    */
    fn publish(&self, file: MemFile) -> Option<Arc<MemFile>> {
        let path = file.path.clone();
        let file = Arc::new(file);
        let shard = self.shard(&path);

        // Replacing an existing file only needs a pointer swap
        {
            let files = shard.read();
            if let Some(slot) = files.get(&path) {
                return Some(slot.swap(file));
            }
        }

        // The path was new when checked. Another writer may have created it since.
        let mut files = shard.write();
        match files.get(&path) {
            Some(slot) => Some(slot.swap(file)),
            None => {
                files.insert(path, ArcSwap::new(file));
                None
            }
        }
    }

    /// Recursively load every regular file below `dir`.
    fn load_dir(&self, dir: &Path) -> FsResult<()> {
        let mut num_files: usize = 0;
        let mut num_bytes: u64 = 0;
        let mut pending_dirs = vec![dir.to_path_buf()];

        while let Some(current_dir) = pending_dirs.pop() {
            for maybe_entry in fs::read_dir(&current_dir)? {
                let entry = maybe_entry?;
                let file_type = entry.file_type()?;
                let host_path = entry.path();

                if file_type.is_dir() {
                    pending_dirs.push(host_path);
                    continue;
                }

                if !file_type.is_file() {
                    continue;
                }

                let relative = host_path.strip_prefix(dir).map_err(|err| {
                    FsError::Medium(io::Error::new(io::ErrorKind::Other, err.to_string()))
                })?;
                let logical_path = match logical_from_host(relative) {
                    Some(logical_path) => logical_path,
                    None => {
                        log::warn!(
                            "Skipping {path} while seeding the in-memory file system because its \
                            name is not valid UTF-8",
                            path = host_path.to_string_lossy()
                        );
                        continue;
                    }
                };

                let contents = fs::read(&host_path)?;
                let modified = entry
                    .metadata()
                    .and_then(|metadata| metadata.modified())
                    .unwrap_or_else(|_| SystemTime::now());

                num_bytes += contents.len() as u64;
                num_files += 1;
                self.publish(MemFile::new(logical_path, contents.into(), modified));
            }
        }

        log::info!(
            "Seeded the in-memory file system with {num_files} files ({num_bytes} bytes) from \
            {dir}",
            dir = dir.to_string_lossy()
        );

        Ok(())
    }
}

impl FileSystem for MemFileSystem {
    fn get_name(&self) -> String {
        "MemFileSystem".to_string()
    }

    fn list(&self, root: &str, pattern: &str) -> FsResult<Vec<FileInfo>> {
        let filter = ListFilter::new(&clean_path(root), pattern)?;

        let mut results: Vec<FileInfo> = vec![];
        {
            // Hold every shard so the listing is a single point in time
            let guards: Vec<_> = self.shards.iter().map(|shard| shard.read()).collect();
            for files in guards.iter() {
                for (path, slot) in files.iter() {
                    if filter.accepts(path) {
                        results.push(slot.load().info());
                    }
                }
            }
        }

        results.sort_by(|a, b| a.path.cmp(&b.path));

        Ok(results)
    }

    fn open(&self, path: &str) -> FsResult<Box<dyn ReadonlyFile>> {
        let path = clean_path(path);
        match self.get_file(&path) {
            Some(file) => Ok(Box::new(MemFileReader::new(file))),
            None => Err(FsError::not_found(&path)),
        }
    }

    fn write_file(&self, path: &str, data: &[u8]) -> FsResult<WriteOutcome> {
        let path = clean_path(path);
        let file = MemFile::new(path, data.into(), SystemTime::now());
        let info = file.info();

        let previous = self.publish(file);
        let outcome = WriteOutcome {
            size: info.size,
            created: previous.is_none(),
        };

        log::debug!(
            "Wrote {size} bytes to {path} (created: {created})",
            size = outcome.size,
            path = info.path,
            created = outcome.created
        );

        if let Some(observer) = self.observer.as_ref() {
            observer.on_write(&info, outcome.created);
        }

        Ok(outcome)
    }

    fn delete_file(&self, path: &str) -> FsResult<u64> {
        let path = clean_path(path);
        let removed = self.shard(&path).write().remove(&path);

        match removed {
            Some(slot) => {
                let size = slot.load().len();
                log::debug!("Deleted {path} ({size} bytes)");

                if let Some(observer) = self.observer.as_ref() {
                    observer.on_delete(&path, size);
                }

                Ok(size)
            }
            None => Err(FsError::not_found(&path)),
        }
    }

    fn stat(&self, path: &str) -> FsResult<FileInfo> {
        let path = clean_path(path);
        if let Some(file) = self.get_file(&path) {
            return Ok(file.info());
        }

        // Directories only exist implicitly as prefixes of stored files
        if path == ROOT_PATH || self.has_children(&path) {
            return Ok(FileInfo::dir(path, SystemTime::now()));
        }

        Err(FsError::not_found(&path))
    }

    fn rename(&self, from: &str, to: &str) -> FsResult<()> {
        let from = clean_path(from);
        let to = clean_path(to);
        let from_idx = MemFileSystem::shard_index(&from);
        let to_idx = MemFileSystem::shard_index(&to);

        if from == to {
            return match self.get_file(&from) {
                Some(_) => Ok(()),
                None => Err(FsError::not_found(&from)),
            };
        }

        if from_idx == to_idx {
            let mut files = self.shards[from_idx].write();
            let slot = files.remove(&from).ok_or_else(|| FsError::not_found(&from))?;
            let renamed = slot.load().renamed(to.clone());
            files.insert(to.clone(), ArcSwap::from_pointee(renamed));
        } else {
            let (low_idx, high_idx) = if from_idx < to_idx {
                (from_idx, to_idx)
            } else {
                (to_idx, from_idx)
            };
            let mut low_files = self.shards[low_idx].write();
            let mut high_files = self.shards[high_idx].write();
            let (from_files, to_files) = if from_idx < to_idx {
                (&mut *low_files, &mut *high_files)
            } else {
                (&mut *high_files, &mut *low_files)
            };

            let slot = from_files
                .remove(&from)
                .ok_or_else(|| FsError::not_found(&from))?;
            let renamed = slot.load().renamed(to.clone());
            to_files.insert(to.clone(), ArcSwap::from_pointee(renamed));
        }

        log::debug!("Renamed {from} to {to}");

        if let Some(observer) = self.observer.as_ref() {
            observer.on_rename(&from, &to);
        }

        Ok(())
    }

    fn usage(&self) -> FsResult<FsUsage> {
        let mut usage = FsUsage {
            bytes: 0,
            files: 0,
            limit: None,
        };

        for shard in self.shards.iter() {
            let files = shard.read();
            usage.files += files.len();
            usage.bytes += files.values().map(|slot| slot.load().len()).sum::<u64>();
        }

        Ok(usage)
    }
}

impl std::fmt::Debug for MemFileSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemFileSystem")
            .field("num_shards", &self.shards.len())
            .field("observer", &self.observer)
            .finish()
    }
}

/**
A read cursor over a single snapshot.

The reader owns a reference to the snapshot so the snapshot stays alive for as long as the reader
does, even if the path is overwritten or deleted in the meantime.
*/
pub(crate) struct MemFileReader {
    /// The snapshot being read.
    file: Arc<MemFile>,

    /// The current position in the file.
    cursor: u64,
}

/// Crate-only methods
impl MemFileReader {
    /// Create a new instance of [`MemFileReader`] positioned at the start of the file.
    pub(crate) fn new(file: Arc<MemFile>) -> Self {
        Self { file, cursor: 0 }
    }
}

impl Read for MemFileReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let contents = &self.file.contents;
        let start = (self.cursor as usize).min(contents.len());
        let num_bytes_to_read = buf.len().min(contents.len() - start);

        buf[..num_bytes_to_read].copy_from_slice(&contents[start..start + num_bytes_to_read]);
        self.cursor += num_bytes_to_read as u64;

        Ok(num_bytes_to_read)
    }
}

impl Seek for MemFileReader {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let (base, offset) = match pos {
            SeekFrom::Start(off) => {
                self.cursor = off;
                return Ok(off);
            }
            SeekFrom::Current(off) => (self.cursor, off),
            SeekFrom::End(off) => (self.file.len(), off),
        };

        match base.checked_add_signed(offset) {
            Some(new_cursor) => {
                self.cursor = new_cursor;
                Ok(new_cursor)
            }
            None => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Cannot seek to a negative position. Offset was {offset}."),
            )),
        }
    }
}

impl ReadonlyFile for MemFileReader {
    fn read_from(&self, buf: &mut [u8], offset: usize) -> FsResult<usize> {
        let contents = &self.file.contents;
        if offset > contents.len() {
            return Err(FsError::Medium(io::Error::new(
                io::ErrorKind::InvalidInput,
                "The provided offset goes beyond the end of the file.",
            )));
        }

        let bytes_to_read = buf.len().min(contents.len() - offset);
        // `copy_from_slice` requires slices of the same length
        buf[..bytes_to_read].copy_from_slice(&contents[offset..offset + bytes_to_read]);

        Ok(bytes_to_read)
    }

    fn len(&self) -> u64 {
        self.file.len()
    }

    fn info(&self) -> FileInfo {
        self.file.info()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::errors::FsErrorKind;

    fn new_fs() -> MemFileSystem {
        MemFileSystem::new(MemFsOptions::default()).unwrap()
    }

    fn paths(files: &[FileInfo]) -> Vec<&str> {
        files.iter().map(|file| file.path.as_str()).collect()
    }

    #[test]
    fn a_reader_keeps_seeing_the_contents_it_opened_after_an_overwrite() {
        let fs = new_fs();
        fs.write_file("/foobar", b"xxxxx").unwrap();

        let mut file = fs.open("/foobar").unwrap();

        fs.write_file("/foobar", b"yyyyy").unwrap();

        let mut contents = vec![];
        file.read_to_end(&mut contents).unwrap();
        assert_eq!(contents, b"xxxxx");
        assert_eq!(fs.read_file("/foobar").unwrap(), b"yyyyy");
    }

    #[test]
    fn a_reader_keeps_its_snapshot_alive_after_a_delete() {
        let fs = new_fs();
        fs.write_file("/foobar", b"xxxxx").unwrap();
        let mut file = fs.open("/foobar").unwrap();

        assert_eq!(fs.delete_file("/foobar").unwrap(), 5);

        let mut contents = String::new();
        file.read_to_string(&mut contents).unwrap();
        assert_eq!(contents, "xxxxx");
        assert!(fs.open("/foobar").unwrap_err().is_not_found());
    }

    #[test]
    fn superseded_snapshots_are_released_when_the_last_reader_drops() {
        let fs = new_fs();
        fs.write_file("/foobar", b"xxxxx").unwrap();
        let old_snapshot = fs.get_file("/foobar").unwrap();
        let reader = fs.open("/foobar").unwrap();

        fs.write_file("/foobar", b"yyyyy").unwrap();
        // The test handle and the reader
        assert_eq!(Arc::strong_count(&old_snapshot), 2);

        drop(reader);
        assert_eq!(Arc::strong_count(&old_snapshot), 1);
    }

    #[test]
    fn write_reports_whether_the_path_was_created() {
        let fs = new_fs();
        assert_eq!(
            fs.write_file("/a/b.ts", b"hello").unwrap(),
            WriteOutcome {
                size: 5,
                created: true
            }
        );
        assert_eq!(
            fs.write_file("a//b.ts", b"hi").unwrap(),
            WriteOutcome {
                size: 2,
                created: false
            }
        );
        assert_eq!(fs.stat("/a/b.ts").unwrap().size, 2);
    }

    #[test]
    fn list_returns_sorted_matches_under_the_root() {
        let fs = new_fs();
        for path in [
            "/live/seg-2.ts",
            "/live/index.m3u8",
            "/live/seg-1.ts",
            "/vod/movie/seg-1.ts",
            "/snapshot.jpg",
        ] {
            fs.write_file(path, path.as_bytes()).unwrap();
        }

        let files = fs.list("/", "/live/*.ts").unwrap();
        assert_eq!(paths(&files), vec!["/live/seg-1.ts", "/live/seg-2.ts"]);

        let files = fs.list("/", "/**/*.ts").unwrap();
        assert_eq!(
            paths(&files),
            vec!["/live/seg-1.ts", "/live/seg-2.ts", "/vod/movie/seg-1.ts"]
        );

        let files = fs.list("/vod", "").unwrap();
        assert_eq!(paths(&files), vec!["/vod/movie/seg-1.ts"]);

        let files = fs.list("/", "").unwrap();
        assert_eq!(files.len(), 5);
    }

    #[test]
    fn list_rejects_invalid_patterns() {
        let fs = new_fs();
        let err = fs.list("/", "/live/[0-9").unwrap_err();
        assert_eq!(err.kind(), FsErrorKind::InvalidPattern);
    }

    #[test]
    fn listed_metadata_is_detached_from_later_writes() {
        let fs = new_fs();
        fs.write_file("/a", b"12345").unwrap();
        let listed = fs.list("/", "").unwrap();

        fs.write_file("/a", b"1").unwrap();
        assert_eq!(listed[0].size, 5);
        assert_eq!(listed[0].checksum, Some(crc::checksum(b"12345")));
    }

    #[test]
    fn deleting_a_missing_path_reports_not_found_without_side_effects() {
        let fs = new_fs();
        fs.write_file("/a", b"1").unwrap();

        assert!(fs.delete_file("/missing").unwrap_err().is_not_found());
        assert_eq!(fs.usage().unwrap().files, 1);

        fs.delete_file("/a").unwrap();
        assert!(fs.stat("/a").unwrap_err().is_not_found());
    }

    #[test]
    fn stat_reports_implicit_directories() {
        let fs = new_fs();
        fs.write_file("/some/database/wal/wal-123.log", b"1").unwrap();

        assert!(fs.stat("/").unwrap().is_dir);
        assert!(fs.stat("/some").unwrap().is_dir);
        assert!(fs.stat("/some/database/wal").unwrap().is_dir);
        assert!(!fs.stat("/some/database/wal/wal-123.log").unwrap().is_dir);
        assert!(fs.stat("/some/data").unwrap_err().is_not_found());
    }

    #[test]
    fn rename_moves_the_file_and_replaces_the_destination() {
        let fs = new_fs();
        fs.write_file("/tmp/seg.ts", b"new").unwrap();
        fs.write_file("/live/seg.ts", b"old-contents").unwrap();

        fs.rename("/tmp/seg.ts", "/live/seg.ts").unwrap();

        assert!(fs.stat("/tmp/seg.ts").unwrap_err().is_not_found());
        assert_eq!(fs.read_file("/live/seg.ts").unwrap(), b"new");
        assert_eq!(paths(&fs.list("/", "").unwrap()), vec!["/live/seg.ts"]);

        assert!(fs.rename("/missing", "/x").unwrap_err().is_not_found());
        fs.rename("/live/seg.ts", "/live/seg.ts").unwrap();
    }

    #[test]
    fn renaming_across_many_shards_keeps_every_file() {
        let fs = new_fs();
        for idx in 0..64 {
            fs.write_file(&format!("/in/{idx}"), idx.to_string().as_bytes())
                .unwrap();
        }

        for idx in 0..64 {
            fs.rename(&format!("/in/{idx}"), &format!("/out/{idx}"))
                .unwrap();
        }

        assert_eq!(fs.list("/in", "").unwrap().len(), 0);
        assert_eq!(fs.list("/out", "").unwrap().len(), 64);
        assert_eq!(fs.read_file("/out/42").unwrap(), b"42");
    }

    #[test]
    fn readers_support_seeking_and_positional_reads() {
        let fs = new_fs();
        fs.write_file("/wal-123.log", b"Hello World").unwrap();
        let mut file = fs.open("/wal-123.log").unwrap();

        let mut buf = [0_u8; 5];
        assert_eq!(file.read_from(&mut buf, 6).unwrap(), 5);
        assert_eq!(&buf, b"World");

        file.seek(SeekFrom::End(-5)).unwrap();
        let mut contents = String::new();
        file.read_to_string(&mut contents).unwrap();
        assert_eq!(contents, "World");

        assert!(file.seek(SeekFrom::Current(-100)).is_err());
        assert_eq!(file.read_from(&mut buf, 11).unwrap(), 0);
        assert!(file.read_from(&mut buf, 12).is_err());
        assert_eq!(file.len(), 11);
    }

    #[test]
    fn copy_and_remove_list_use_the_contract() {
        let fs = new_fs();
        fs.write_file("/live/seg-1.ts", b"123").unwrap();
        fs.write_file("/live/seg-2.ts", b"4567").unwrap();
        fs.write_file("/live/index.m3u8", b"#EXTM3U").unwrap();

        fs.copy("/live/index.m3u8", "/backup/index.m3u8").unwrap();
        assert_eq!(fs.read_file("/backup/index.m3u8").unwrap(), b"#EXTM3U");

        let removed = fs.remove_list("/live", "*.ts").unwrap();
        assert_eq!(removed.bytes, 7);
        assert_eq!(removed.files.len(), 2);
        assert_eq!(
            paths(&fs.list("/", "").unwrap()),
            vec!["/backup/index.m3u8", "/live/index.m3u8"]
        );
    }

    #[test]
    fn seeding_loads_every_regular_file_below_the_directory() {
        let seed_dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(seed_dir.path().join("hls").join("live")).unwrap();
        fs::write(seed_dir.path().join("mem.go"), b"package fs").unwrap();
        fs::write(seed_dir.path().join("disk.go"), b"package fs").unwrap();
        fs::write(seed_dir.path().join("notes.txt"), b"notes").unwrap();
        fs::write(
            seed_dir.path().join("hls").join("live").join("seg-1.ts"),
            b"ts",
        )
        .unwrap();

        let fs = MemFileSystem::new(MemFsOptions {
            seed_dir: Some(seed_dir.path().to_path_buf()),
            ..MemFsOptions::default()
        })
        .unwrap();

        assert_eq!(
            paths(&fs.list("/", "/*.go").unwrap()),
            vec!["/disk.go", "/mem.go"]
        );
        assert_eq!(fs.read_file("/hls/live/seg-1.ts").unwrap(), b"ts");
        assert_eq!(fs.usage().unwrap().files, 4);
    }

    #[test]
    fn seeding_from_a_missing_directory_fails() {
        let seed_dir = tempfile::tempdir().unwrap();
        let result = MemFileSystem::new(MemFsOptions {
            seed_dir: Some(seed_dir.path().join("does-not-exist")),
            ..MemFsOptions::default()
        });

        assert!(result.unwrap_err().is_not_found());
    }

    #[test]
    fn seeding_from_a_regular_file_is_a_medium_error() {
        let seed_dir = tempfile::tempdir().unwrap();
        let not_a_dir = seed_dir.path().join("seg-1.ts");
        fs::write(&not_a_dir, b"ts").unwrap();

        let result = MemFileSystem::new(MemFsOptions {
            seed_dir: Some(not_a_dir),
            ..MemFsOptions::default()
        });

        assert_eq!(result.unwrap_err().kind(), FsErrorKind::Medium);
    }

    #[derive(Default)]
    struct CountingObserver {
        writes: AtomicUsize,
        deletes: AtomicUsize,
        renames: AtomicUsize,
    }

    impl FsObserver for CountingObserver {
        fn on_write(&self, _info: &FileInfo, _created: bool) {
            self.writes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_delete(&self, _path: &str, _size: u64) {
            self.deletes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_rename(&self, _from: &str, _to: &str) {
            self.renames.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn the_observer_is_notified_of_successful_mutations_only() {
        let observer = Arc::new(CountingObserver::default());
        let fs = MemFileSystem::new(MemFsOptions {
            observer: Some(Arc::clone(&observer) as Arc<dyn FsObserver>),
            ..MemFsOptions::default()
        })
        .unwrap();

        fs.write_file("/a", b"1").unwrap();
        fs.write_file("/a", b"2").unwrap();
        fs.rename("/a", "/b").unwrap();
        fs.delete_file("/b").unwrap();
        assert!(fs.delete_file("/b").is_err());

        assert_eq!(observer.writes.load(Ordering::SeqCst), 2);
        assert_eq!(observer.renames.load(Ordering::SeqCst), 1);
        assert_eq!(observer.deletes.load(Ordering::SeqCst), 1);
    }
}
