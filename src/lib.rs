/*!
blobfs is a virtual file system for storing media blobs such as recordings, playlists and
snapshots. Every storage backend implements the same [`FileSystem`] contract so that application
code does not care whether files live in memory, on local disk or in a remote object store.

The in-memory backend ([`MemFileSystem`]) stores immutable snapshots and replaces them with a
pointer swap. A file can be read to completion while another thread overwrites it, and the reader
sees exactly the bytes that were there when it opened the file.

Restrictions are added by wrapping a backend in a decorator. Decorators implement the same
contract, so they can be stacked in any order:

```
use std::sync::Arc;

use blobfs::fs::{FileSystem, MemFileSystem, QuotaFileSystem, ReadOnlyFileSystem};
use blobfs::{MemFsOptions, QuotaOptions};

let memory: Arc<dyn FileSystem> = Arc::new(MemFileSystem::new(MemFsOptions::default()).unwrap());
let limited: Arc<dyn FileSystem> =
    Arc::new(QuotaFileSystem::new(Arc::clone(&memory), QuotaOptions::new(1024)).unwrap());
limited.write_file("/live/index.m3u8", b"#EXTM3U").unwrap();

let public = ReadOnlyFileSystem::new(Arc::clone(&limited));
assert_eq!(public.read_file("/live/index.m3u8").unwrap(), b"#EXTM3U");
assert!(public.delete_file("/live/index.m3u8").is_err());
```

Files are listed with glob patterns, see the [`glob`] module for the syntax.
*/

#![warn(missing_debug_implementations, missing_docs)]

pub mod fs;
pub use fs::{FileInfo, FileSystem, FsObserver, MemFileSystem, WriteOutcome};

pub mod glob;
pub use glob::Pattern;

mod config;
mod utils;

mod errors;
pub use errors::{FsError, FsErrorKind, FsResult};

pub mod options;
pub use options::{MemFsOptions, ObjectStoreOptions, QuotaOptions};
