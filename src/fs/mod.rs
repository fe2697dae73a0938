/*!
File system backends and the decorators that restrict them.

The backends are the in-memory [`MemFileSystem`], the local [`DiskFileSystem`] and the remote
[`ObjectStoreFileSystem`]. [`QuotaFileSystem`] and [`ReadOnlyFileSystem`] wrap any of them.
*/

mod traits;
pub use self::traits::{FileInfo, FileSystem, FsUsage, ReadonlyFile, RemovedFiles, WriteOutcome};

mod observer;
pub use self::observer::FsObserver;

mod fs_mem;
pub use self::fs_mem::MemFileSystem;

mod fs_quota;
pub use self::fs_quota::QuotaFileSystem;

mod fs_readonly;
pub use self::fs_readonly::ReadOnlyFileSystem;

mod fs_disk;
pub use self::fs_disk::DiskFileSystem;

mod fs_object;
pub use self::fs_object::{ObjectMeta, ObjectStoreClient, ObjectStoreFileSystem};
