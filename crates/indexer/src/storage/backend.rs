//! Production storage backend built on `object_store`.
//!
//! [`ObjectStoreBackend`] wraps any `object_store::ObjectStore`. Two
//! constructors cover the configured backends:
//!
//! - [`ObjectStoreBackend::s3`]: an S3 (or S3-compatible) bucket. Credentials
//!   come from the standard `AWS_*` environment variables.
//! - [`ObjectStoreBackend::local`]: an existing directory on the local
//!   filesystem, used as a bucket stand-in.
//!
//! [`LocalDestination`] is the `--local-dir` publish target. Its directory is
//! created by the first write, so dry runs and aborted runs leave no trace.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use futures::StreamExt;
use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::path::Path as ObjPath;
use object_store::{ObjectMeta, ObjectStore};
use tokio::sync::OnceCell;
use wheelhouse_core::error::StorageError;

use super::{DEFAULT_PAGE_SIZE, ListPage, ObjectInfo, ObjectStorage, normalize_prefix};
use crate::config::{IndexerConfig, StorageBackend};

/// `object_store` backed bucket.
pub struct ObjectStoreBackend {
    store: Arc<dyn ObjectStore>,
    location: String,
    page_size: usize,
    /// S3 lists in key order; the local filesystem does not.
    ordered_listing: bool,
}

impl std::fmt::Debug for ObjectStoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectStoreBackend")
            .field("location", &self.location)
            .field("page_size", &self.page_size)
            .finish()
    }
}

impl ObjectStoreBackend {
    /// Connects to an S3 bucket.
    ///
    /// `endpoint` selects an S3-compatible service (MinIO, R2); `region`
    /// overrides `AWS_REGION`. Empty strings are treated as unset.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the client cannot be configured.
    pub fn s3(
        bucket: &str,
        endpoint: Option<&str>,
        region: Option<&str>,
    ) -> Result<Self, StorageError> {
        if bucket.is_empty() {
            return Err(StorageError::Connection(
                "bucket name must not be empty".to_owned(),
            ));
        }

        let mut builder = AmazonS3Builder::from_env().with_bucket_name(bucket);
        if let Some(endpoint) = endpoint.filter(|e| !e.is_empty()) {
            builder = builder
                .with_endpoint(endpoint)
                .with_allow_http(endpoint.starts_with("http://"));
        }
        if let Some(region) = region.filter(|r| !r.is_empty()) {
            builder = builder.with_region(region);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::Connection(format!("s3 client for '{bucket}': {e}")))?;

        Ok(Self {
            store: Arc::new(store),
            location: format!("s3://{bucket}"),
            page_size: DEFAULT_PAGE_SIZE,
            ordered_listing: true,
        })
    }

    /// Opens an existing local directory as a bucket.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the directory does not exist.
    pub fn local(root: impl AsRef<Path>) -> Result<Self, StorageError> {
        let root = root.as_ref();
        let store = LocalFileSystem::new_with_prefix(root).map_err(|e| {
            StorageError::Connection(format!("local directory '{}': {e}", root.display()))
        })?;

        Ok(Self {
            store: Arc::new(store),
            location: format!("file://{}", root.display()),
            page_size: DEFAULT_PAGE_SIZE,
            ordered_listing: false,
        })
    }

    /// Opens the bucket to scan, as configured.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the backend cannot be opened.
    pub fn open_source(config: &IndexerConfig) -> Result<Self, StorageError> {
        let backend = match config.backend {
            StorageBackend::S3 => Self::s3(
                &config.bucket,
                config.endpoint.as_deref(),
                config.region.as_deref(),
            )?,
            StorageBackend::Local => Self::local(&config.bucket)?,
        };
        Ok(backend.with_page_size(config.list_page_size))
    }

    /// Returns the configured local output directory, if any.
    ///
    /// `None` means pages are published back to the scanned bucket. Nothing
    /// is created on disk until the first page is written.
    pub fn open_local_destination(config: &IndexerConfig) -> Option<LocalDestination> {
        config.local_dir.as_deref().map(LocalDestination::new)
    }

    /// Sets the number of objects per listing page (minimum 1).
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Page size used for listings.
    pub fn page_size(&self) -> usize {
        self.page_size
    }
}

fn parse_key(key: &str) -> Result<ObjPath, StorageError> {
    ObjPath::parse(key).map_err(|e| StorageError::InvalidKey {
        key: key.to_owned(),
        reason: e.to_string(),
    })
}

fn object_info(meta: ObjectMeta) -> ObjectInfo {
    ObjectInfo {
        key: meta.location.to_string(),
        size: meta.size,
        last_modified: Some(meta.last_modified),
    }
}

impl ObjectStorage for ObjectStoreBackend {
    fn location(&self) -> String {
        self.location.clone()
    }

    async fn list_page(
        &self,
        prefix: Option<&str>,
        continuation: Option<&str>,
    ) -> Result<ListPage, StorageError> {
        let dir = normalize_prefix(prefix);
        let prefix_path = dir.map(parse_key).transpose()?;
        let list_error = |e: object_store::Error| StorageError::List {
            prefix: dir.unwrap_or_default().to_owned(),
            reason: e.to_string(),
        };

        let mut stream = match continuation {
            Some(token) => self
                .store
                .list_with_offset(prefix_path.as_ref(), &parse_key(token)?),
            None => self.store.list(prefix_path.as_ref()),
        };

        // A full ordered page may be followed by an empty one; peeking ahead
        // would cost a second LIST request per page.
        let mut metas = Vec::new();
        let has_more = if self.ordered_listing {
            let mut limited = stream.take(self.page_size);
            while let Some(meta) = limited.next().await {
                metas.push(meta.map_err(list_error)?);
            }
            metas.len() == self.page_size
        } else {
            while let Some(meta) = stream.next().await {
                metas.push(meta.map_err(list_error)?);
            }
            metas.sort_by(|a, b| a.location.cmp(&b.location));
            let has_more = metas.len() > self.page_size;
            metas.truncate(self.page_size);
            has_more
        };

        let objects: Vec<ObjectInfo> = metas.into_iter().map(object_info).collect();
        let continuation = if has_more {
            objects.last().map(|o| o.key.clone())
        } else {
            None
        };

        Ok(ListPage {
            objects,
            continuation,
        })
    }

    async fn put_object(&self, key: &str, body: Bytes) -> Result<(), StorageError> {
        let path = parse_key(key)?;
        self.store
            .put(&path, body.into())
            .await
            .map_err(|e| StorageError::Write {
                key: key.to_owned(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    async fn get_object(&self, key: &str) -> Result<Bytes, StorageError> {
        let path = parse_key(key)?;
        let read_error = |e: object_store::Error| match e {
            object_store::Error::NotFound { .. } => StorageError::NotFound {
                key: key.to_owned(),
            },
            other => StorageError::Read {
                key: key.to_owned(),
                reason: other.to_string(),
            },
        };

        let result = self.store.get(&path).await.map_err(read_error)?;
        result.bytes().await.map_err(read_error)
    }
}

/// Local directory publish target, created on the first write.
pub struct LocalDestination {
    root: PathBuf,
    backend: OnceCell<ObjectStoreBackend>,
}

impl std::fmt::Debug for LocalDestination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalDestination")
            .field("root", &self.root)
            .field("created", &self.backend.initialized())
            .finish()
    }
}

impl LocalDestination {
    /// Targets `root` without touching the filesystem.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            backend: OnceCell::new(),
        }
    }

    /// Output directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates the directory if needed and opens it.
    async fn create(&self) -> Result<&ObjectStoreBackend, StorageError> {
        self.backend
            .get_or_try_init(|| async {
                tokio::fs::create_dir_all(&self.root).await.map_err(|e| {
                    StorageError::Connection(format!(
                        "create directory '{}': {e}",
                        self.root.display()
                    ))
                })?;
                ObjectStoreBackend::local(&self.root)
            })
            .await
    }

    /// Opens the directory only if it already exists.
    async fn existing(&self) -> Result<Option<&ObjectStoreBackend>, StorageError> {
        if let Some(backend) = self.backend.get() {
            return Ok(Some(backend));
        }
        match tokio::fs::metadata(&self.root).await {
            Ok(meta) if meta.is_dir() => self.create().await.map(Some),
            _ => Ok(None),
        }
    }
}

impl ObjectStorage for LocalDestination {
    fn location(&self) -> String {
        format!("file://{}", self.root.display())
    }

    async fn list_page(
        &self,
        prefix: Option<&str>,
        continuation: Option<&str>,
    ) -> Result<ListPage, StorageError> {
        match self.existing().await? {
            Some(backend) => backend.list_page(prefix, continuation).await,
            None => Ok(ListPage::default()),
        }
    }

    async fn put_object(&self, key: &str, body: Bytes) -> Result<(), StorageError> {
        self.create().await?.put_object(key, body).await
    }

    async fn get_object(&self, key: &str) -> Result<Bytes, StorageError> {
        match self.existing().await? {
            Some(backend) => backend.get_object(key).await,
            None => Err(StorageError::NotFound {
                key: key.to_owned(),
            }),
        }
    }
}
