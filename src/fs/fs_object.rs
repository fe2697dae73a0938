/*!
This module contains a file system backed by a remote object store such as S3.

The file system only translates between logical paths and object keys. All network traffic goes
through an [`ObjectStoreClient`], which is constructed by the application from the
[`ObjectStoreOptions`] and owns connection handling, authentication, timeouts and retries.

Object keys are logical paths without the leading separator. Opening a file downloads the whole
object into an immutable in-memory snapshot. Renaming is a copy followed by a delete and is not
atomic.
*/

use std::io;
use std::sync::Arc;
use std::time::SystemTime;

use crate::config::{PATH_SEPARATOR, ROOT_PATH};
use crate::errors::{FsError, FsResult};
use crate::glob::ListFilter;
use crate::options::ObjectStoreOptions;
use crate::utils::path::{clean_path, dir_prefix};

use super::fs_mem::{MemFile, MemFileReader};
use super::traits::{FileInfo, FileSystem, ReadonlyFile, WriteOutcome};

/// Metadata of a stored object.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ObjectMeta {
    /// The key of the object within its bucket.
    pub key: String,

    /// The size of the object in bytes.
    pub size: u64,

    /// When the object was last written.
    pub modified: SystemTime,
}

/**
The subset of an object store API that the file system needs.

Errors are reported as [`io::Error`]s. A missing object must be reported with
[`io::ErrorKind::NotFound`] from `get_object` and `delete_object` and as `Ok(None)` from
`head_object`. Other error kinds are surfaced to callers as medium failures.
*/
pub trait ObjectStoreClient: Send + Sync {
    /// Download the contents of an object.
    fn get_object(&self, bucket: &str, key: &str) -> io::Result<Vec<u8>>;

    /// Create or replace an object.
    fn put_object(&self, bucket: &str, key: &str, data: &[u8]) -> io::Result<()>;

    /// Get the metadata of an object, or `None` if it does not exist.
    fn head_object(&self, bucket: &str, key: &str) -> io::Result<Option<ObjectMeta>>;

    /// Remove an object.
    fn delete_object(&self, bucket: &str, key: &str) -> io::Result<()>;

    /// Copy an object within the bucket, replacing any object at `to_key`.
    fn copy_object(&self, bucket: &str, from_key: &str, to_key: &str) -> io::Result<()>;

    /// List every object whose key starts with `prefix`.
    fn list_objects(&self, bucket: &str, prefix: &str) -> io::Result<Vec<ObjectMeta>>;
}

/// File system implementation that stores files as objects in a bucket.
pub struct ObjectStoreFileSystem<C: ObjectStoreClient> {
    /// The client used to talk to the object store.
    client: Arc<C>,

    /// The options the client was built from.
    options: ObjectStoreOptions,
}

/// Public methods
impl<C: ObjectStoreClient> ObjectStoreFileSystem<C> {
    /// Create an instance of [`ObjectStoreFileSystem`] on top of a connected client.
    pub fn new(client: Arc<C>, options: ObjectStoreOptions) -> Self {
        log::info!(
            "Using bucket {bucket} at {endpoint} ({region})",
            bucket = options.bucket,
            endpoint = options.endpoint,
            region = options.region
        );

        Self { client, options }
    }

    /// Get the options this file system was created with.
    pub fn options(&self) -> &ObjectStoreOptions {
        &self.options
    }
}

/// Private methods
impl<C: ObjectStoreClient> ObjectStoreFileSystem<C> {
    /// Get the metadata of the object at the clean logical `path`.
    fn head(&self, path: &str) -> FsResult<ObjectMeta> {
        self.client
            .head_object(&self.options.bucket, object_key(path))?
            .ok_or_else(|| FsError::not_found(path))
    }
}

/// Get the object key for the clean logical `path`.
fn object_key(path: &str) -> &str {
    path.trim_start_matches(PATH_SEPARATOR)
}

/// Convert object metadata into a [`FileInfo`].
fn to_info(meta: ObjectMeta) -> FileInfo {
    FileInfo::file(clean_path(&meta.key), meta.size, meta.modified)
}

impl<C: ObjectStoreClient> FileSystem for ObjectStoreFileSystem<C> {
    fn get_name(&self) -> String {
        format!("ObjectStoreFileSystem({})", self.options.bucket)
    }

    fn list(&self, root: &str, pattern: &str) -> FsResult<Vec<FileInfo>> {
        let filter = ListFilter::new(&clean_path(root), pattern)?;
        let prefix = dir_prefix(filter.root());
        let key_prefix = object_key(&prefix);

        let mut results: Vec<FileInfo> = self
            .client
            .list_objects(&self.options.bucket, key_prefix)?
            .into_iter()
            .map(to_info)
            .filter(|info| filter.accepts(&info.path))
            .collect();
        results.sort_by(|a, b| a.path.cmp(&b.path));

        Ok(results)
    }

    fn open(&self, path: &str) -> FsResult<Box<dyn ReadonlyFile>> {
        let path = clean_path(path);
        let meta = self.head(&path)?;
        let contents = self
            .client
            .get_object(&self.options.bucket, object_key(&path))?;

        let file = MemFile::new(path, contents.into(), meta.modified);
        Ok(Box::new(MemFileReader::new(Arc::new(file))))
    }

    fn write_file(&self, path: &str, data: &[u8]) -> FsResult<WriteOutcome> {
        let path = clean_path(path);
        let key = object_key(&path);
        let created = self
            .client
            .head_object(&self.options.bucket, key)?
            .is_none();
        self.client.put_object(&self.options.bucket, key, data)?;

        log::debug!(
            "Uploaded {size} bytes to {path} (created: {created})",
            size = data.len()
        );

        Ok(WriteOutcome {
            size: data.len() as u64,
            created,
        })
    }

    fn delete_file(&self, path: &str) -> FsResult<u64> {
        let path = clean_path(path);
        let meta = self.head(&path)?;
        self.client
            .delete_object(&self.options.bucket, object_key(&path))?;

        log::debug!("Deleted {path} ({size} bytes)", size = meta.size);

        Ok(meta.size)
    }

    fn stat(&self, path: &str) -> FsResult<FileInfo> {
        let path = clean_path(path);
        let key = object_key(&path);
        if let Some(meta) = self.client.head_object(&self.options.bucket, key)? {
            return Ok(to_info(meta));
        }

        // Directories only exist as key prefixes
        if path == ROOT_PATH {
            return Ok(FileInfo::dir(path, SystemTime::now()));
        }

        let prefix = dir_prefix(&path);
        let children = self
            .client
            .list_objects(&self.options.bucket, object_key(&prefix))?;
        if !children.is_empty() {
            return Ok(FileInfo::dir(path, SystemTime::now()));
        }

        Err(FsError::not_found(&path))
    }

    fn rename(&self, from: &str, to: &str) -> FsResult<()> {
        let from = clean_path(from);
        let to = clean_path(to);
        self.head(&from)?;
        if from == to {
            return Ok(());
        }

        let from_key = object_key(&from);
        self.client
            .copy_object(&self.options.bucket, from_key, object_key(&to))?;
        self.client.delete_object(&self.options.bucket, from_key)?;

        log::debug!("Renamed {from} to {to}");

        Ok(())
    }
}

impl<C: ObjectStoreClient> std::fmt::Debug for ObjectStoreFileSystem<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Leave the credentials out
        f.debug_struct("ObjectStoreFileSystem")
            .field("endpoint", &self.options.endpoint)
            .field("bucket", &self.options.bucket)
            .field("region", &self.options.region)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;
    use std::io::Read;

    use super::*;
    use crate::errors::FsErrorKind;

    /// An object store that keeps objects in a map and can be told to fail.
    #[derive(Default)]
    struct FakeClient {
        objects: Mutex<BTreeMap<String, Vec<u8>>>,
        buckets_seen: Mutex<Vec<String>>,
        fail_requests: Mutex<bool>,
    }

    impl FakeClient {
        fn check(&self, bucket: &str) -> io::Result<()> {
            self.buckets_seen.lock().push(bucket.to_string());
            if *self.fail_requests.lock() {
                return Err(io::Error::new(io::ErrorKind::TimedOut, "request timed out"));
            }

            Ok(())
        }

        fn meta(key: &str, data: &[u8]) -> ObjectMeta {
            ObjectMeta {
                key: key.to_string(),
                size: data.len() as u64,
                modified: SystemTime::UNIX_EPOCH,
            }
        }
    }

    impl ObjectStoreClient for FakeClient {
        fn get_object(&self, bucket: &str, key: &str) -> io::Result<Vec<u8>> {
            self.check(bucket)?;
            self.objects
                .lock()
                .get(key)
                .cloned()
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "NoSuchKey"))
        }

        fn put_object(&self, bucket: &str, key: &str, data: &[u8]) -> io::Result<()> {
            self.check(bucket)?;
            self.objects.lock().insert(key.to_string(), data.to_vec());
            Ok(())
        }

        fn head_object(&self, bucket: &str, key: &str) -> io::Result<Option<ObjectMeta>> {
            self.check(bucket)?;
            Ok(self
                .objects
                .lock()
                .get(key)
                .map(|data| FakeClient::meta(key, data)))
        }

        fn delete_object(&self, bucket: &str, key: &str) -> io::Result<()> {
            self.check(bucket)?;
            match self.objects.lock().remove(key) {
                Some(_) => Ok(()),
                None => Err(io::Error::new(io::ErrorKind::NotFound, "NoSuchKey")),
            }
        }

        fn copy_object(&self, bucket: &str, from_key: &str, to_key: &str) -> io::Result<()> {
            self.check(bucket)?;
            let mut objects = self.objects.lock();
            let data = objects
                .get(from_key)
                .cloned()
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "NoSuchKey"))?;
            objects.insert(to_key.to_string(), data);
            Ok(())
        }

        fn list_objects(&self, bucket: &str, prefix: &str) -> io::Result<Vec<ObjectMeta>> {
            self.check(bucket)?;
            Ok(self
                .objects
                .lock()
                .iter()
                .filter(|(key, _)| key.starts_with(prefix))
                .map(|(key, data)| FakeClient::meta(key, data))
                .collect())
        }
    }

    fn setup() -> (Arc<FakeClient>, ObjectStoreFileSystem<FakeClient>) {
        let client = Arc::new(FakeClient::default());
        let fs = ObjectStoreFileSystem::new(
            Arc::clone(&client),
            ObjectStoreOptions {
                endpoint: "localhost:9000".to_string(),
                bucket: "recordings".to_string(),
                region: "us-east-1".to_string(),
                ..ObjectStoreOptions::default()
            },
        );

        (client, fs)
    }

    #[test]
    fn files_are_stored_as_objects_without_the_leading_separator() {
        let (client, fs) = setup();

        assert!(fs.write_file("/live/seg-1.ts", b"12345").unwrap().created);
        assert!(!fs.write_file("live//seg-1.ts", b"123").unwrap().created);

        assert_eq!(
            client.objects.lock().keys().cloned().collect::<Vec<_>>(),
            vec!["live/seg-1.ts".to_string()]
        );
        assert!(client
            .buckets_seen
            .lock()
            .iter()
            .all(|bucket| bucket == "recordings"));
    }

    #[test]
    fn listing_applies_the_glob_semantics() {
        let (_client, fs) = setup();
        for path in [
            "/live/seg-2.ts",
            "/live/seg-1.ts",
            "/live/index.m3u8",
            "/lively/x.ts",
        ] {
            fs.write_file(path, b"x").unwrap();
        }

        let listed: Vec<String> = fs
            .list("/live", "*.ts")
            .unwrap()
            .into_iter()
            .map(|file| file.path)
            .collect();
        assert_eq!(listed, vec!["/live/seg-1.ts", "/live/seg-2.ts"]);
        assert_eq!(fs.list("/", "/**/*.ts").unwrap().len(), 3);
    }

    #[test]
    fn open_reads_a_snapshot_of_the_object() {
        let (_client, fs) = setup();
        fs.write_file("/foobar", b"xxxxx").unwrap();

        let mut file = fs.open("/foobar").unwrap();
        fs.write_file("/foobar", b"yyyyy").unwrap();

        let mut contents = vec![];
        file.read_to_end(&mut contents).unwrap();
        assert_eq!(contents, b"xxxxx");
        assert!(fs.open("/missing").unwrap_err().is_not_found());
    }

    #[test]
    fn opened_files_report_the_same_metadata_as_stat() {
        let (_client, fs) = setup();
        fs.write_file("/live/seg-1.ts", b"12345").unwrap();

        let file = fs.open("/live/seg-1.ts").unwrap();
        let stat = fs.stat("/live/seg-1.ts").unwrap();

        assert_eq!(file.info().modified, stat.modified);
        assert_eq!(file.info().modified, SystemTime::UNIX_EPOCH);
        assert_eq!(file.len(), stat.size);
    }

    #[test]
    fn stat_delete_and_rename_follow_the_contract() {
        let (_client, fs) = setup();
        fs.write_file("/tmp/seg.ts", b"123").unwrap();

        assert!(fs.stat("/tmp").unwrap().is_dir);
        assert_eq!(fs.stat("/tmp/seg.ts").unwrap().size, 3);

        fs.rename("/tmp/seg.ts", "/live/seg.ts").unwrap();
        assert!(fs.stat("/tmp/seg.ts").unwrap_err().is_not_found());
        assert_eq!(fs.read_file("/live/seg.ts").unwrap(), b"123");

        assert_eq!(fs.delete_file("/live/seg.ts").unwrap(), 3);
        assert!(fs.delete_file("/live/seg.ts").unwrap_err().is_not_found());
        assert!(fs.rename("/missing", "/x").unwrap_err().is_not_found());
    }

    #[test]
    fn client_failures_are_reported_as_medium_errors() {
        let (client, fs) = setup();
        *client.fail_requests.lock() = true;

        assert_eq!(
            fs.write_file("/a", b"1").unwrap_err().kind(),
            FsErrorKind::Medium
        );
        assert_eq!(fs.list("/", "").unwrap_err().kind(), FsErrorKind::Medium);
        assert_eq!(fs.open("/a").unwrap_err().kind(), FsErrorKind::Medium);
    }

    #[test]
    fn debug_output_leaves_out_credentials() {
        let client = Arc::new(FakeClient::default());
        let fs = ObjectStoreFileSystem::new(
            client,
            ObjectStoreOptions {
                bucket: "recordings".to_string(),
                secret_access_key: "super-secret".to_string(),
                ..ObjectStoreOptions::default()
            },
        );

        assert!(!format!("{fs:?}").contains("super-secret"));
    }
}
