/*!
This module holds the option structures that are used to construct the file systems.
*/

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::fs::FsObserver;

/// Options for constructing a [`MemFileSystem`](crate::fs::MemFileSystem).
#[derive(Clone, Debug, Default)]
pub struct MemFsOptions {
    /**
    A directory to load into the file system at construction time.

    Every regular file below the directory becomes one file whose logical path is its path
    relative to the directory.

    **This defaults to `None` i.e. the file system starts empty.**
    */
    pub seed_dir: Option<PathBuf>,

    /**
    An observer that is notified of every successful mutation.

    **This defaults to `None`.**
    */
    pub observer: Option<Arc<dyn FsObserver>>,
}

/// Options for constructing a [`QuotaFileSystem`](crate::fs::QuotaFileSystem).
#[derive(Clone, Debug)]
pub struct QuotaOptions {
    /// The maximum number of bytes that may be stored in the wrapped file system.
    pub max_size_bytes: u64,

    /**
    Evict the oldest files to make room for a write that would otherwise exceed the quota.

    A single write that is larger than `max_size_bytes` is rejected regardless.

    **This defaults to false.**
    */
    pub purge: bool,
}

/// Public methods
impl QuotaOptions {
    /// Create options that reject writes beyond `max_size_bytes` without purging.
    pub fn new(max_size_bytes: u64) -> Self {
        Self {
            max_size_bytes,
            purge: false,
        }
    }
}

/**
Options for constructing an [`ObjectStoreFileSystem`](crate::fs::ObjectStoreFileSystem).

These values are not interpreted by the file system. They are handed as-is to the
[`ObjectStoreClient`](crate::fs::ObjectStoreClient) that talks to the service.
*/
#[derive(Clone)]
pub struct ObjectStoreOptions {
    /// The endpoint of the object store service, e.g. `s3.eu-central-1.amazonaws.com`.
    pub endpoint: String,

    /// The name of the bucket (or container) holding the files.
    pub bucket: String,

    /// The region of the bucket.
    pub region: String,

    /// The access key used to authenticate requests.
    pub access_key_id: String,

    /// The secret matching `access_key_id`.
    pub secret_access_key: String,

    /**
    Whether to connect to the endpoint with TLS.

    **This defaults to true.**
    */
    pub use_ssl: bool,

    /**
    How long a single request may take before the client aborts it.

    **This defaults to 30 seconds.**
    */
    pub request_timeout: Duration,
}

impl Default for ObjectStoreOptions {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            bucket: String::new(),
            region: String::new(),
            access_key_id: String::new(),
            secret_access_key: String::new(),
            use_ssl: true,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl std::fmt::Debug for ObjectStoreOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectStoreOptions")
            .field("endpoint", &self.endpoint)
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("use_ssl", &self.use_ssl)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}
