/*!
This module contains global configuration constants for the file systems.

These are static values that tune internal data structures. Options that users are expected to
change live in [`crate::options`].
*/

/**
The number of shards the in-memory path table is split into.

Each shard has its own structural lock so that writers creating or deleting files on different
shards do not serialize on a single lock. Listing takes every shard's read lock in index order.
*/
pub(crate) const NUM_PATH_TABLE_SHARDS: usize = 16;

/// The path separator used by logical paths regardless of the host platform.
pub(crate) const PATH_SEPARATOR: char = '/';

/// The name of the root directory of every file system.
pub(crate) const ROOT_PATH: &str = "/";

/**
The initial capacity of the buffer used when draining a reader into a file.

Media segments are commonly a few hundred KiB so start with something reasonable.
*/
pub(crate) const READER_BUFFER_INITIAL_CAPACITY: usize = 64 * 1024;

/**
The file name prefix of the temporary files the disk file system writes before renaming them over
their target.

Host entries starting with this prefix are never listed.
*/
pub(crate) const DISK_TEMP_FILE_PREFIX: &str = ".blobfs-tmp-";
