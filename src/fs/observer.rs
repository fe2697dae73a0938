//! Hooks for observing changes made to a file system, e.g. to feed metrics.

use core::fmt::Debug;

use super::traits::FileInfo;

/**
Receives notifications about successful mutations.

All methods default to doing nothing so implementors only override what they care about. Hooks
are invoked after the change has been published and outside of any internal lock, so they may call
back into the file system.
*/
pub trait FsObserver: Send + Sync {
    /// Called after the file described by `info` was written.
    fn on_write(&self, _info: &FileInfo, _created: bool) {}

    /// Called after the file at `path` holding `size` bytes was removed.
    fn on_delete(&self, _path: &str, _size: u64) {}

    /// Called after a file was moved from `from` to `to`.
    fn on_rename(&self, _from: &str, _to: &str) {}
}

impl Debug for dyn FsObserver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FsObserver")
    }
}
