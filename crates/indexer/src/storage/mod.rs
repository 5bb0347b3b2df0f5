//! Object storage abstraction for testability.
//!
//! The [`ObjectStorage`] trait is the only way the indexer touches a bucket.
//! Production code uses [`ObjectStoreBackend`] (S3 or a local directory via
//! `object_store`), tests use [`MemoryStorage`].
//!
//! # Architecture
//!
//! ```text
//!   BucketScanner   Publisher   DigestResolver
//!        │              │              │
//!        ▼              ▼              ▼
//!   ┌──────────────────────────────────────┐
//!   │        ObjectStorage (trait)         │
//!   └──────────────────────────────────────┘
//!          │                      │
//!          ▼                      ▼
//!   ObjectStoreBackend       MemoryStorage
//!    (S3 / local dir)         (in-memory)
//! ```
//!
//! # Prefix semantics
//!
//! A listing prefix is a directory path: `pkg` and `pkg/` both match
//! `pkg/foo.whl` but not `pkgs/foo.whl`. An empty prefix lists the whole bucket.
//!
//! # Pagination
//!
//! [`ObjectStorage::list_page`] returns at most one page of objects in
//! lexical key order. The continuation token is the last key of the page;
//! the next page starts strictly after it.

pub mod memory;
pub mod backend;

pub use memory::MemoryStorage;
pub use backend::{LocalDestination, ObjectStoreBackend};

use std::future::Future;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use wheelhouse_core::error::StorageError;

/// Default number of objects per listing page.
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// A single listed object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectInfo {
    /// Full object key.
    pub key: String,
    /// Object size in bytes.
    pub size: u64,
    /// Last modification time, when the backend reports one.
    pub last_modified: Option<DateTime<Utc>>,
}

/// One page of a paginated listing.
#[derive(Debug, Clone, Default)]
pub struct ListPage {
    /// Objects on this page, in key order.
    pub objects: Vec<ObjectInfo>,
    /// Token for the next page; `None` when the listing is exhausted.
    pub continuation: Option<String>,
}

/// Bucket operations used by the indexer.
///
/// The bucket is bound when the implementing value is constructed.
///
/// # Error Handling
///
/// - **Missing objects**: `StorageError::NotFound`
/// - **Listing failures** (auth, network, missing bucket): `StorageError::List`
///   or `StorageError::Connection`
/// - **Write/read failures**: `StorageError::Write` / `StorageError::Read`
pub trait ObjectStorage: Send + Sync + 'static {
    /// Human readable location of the bucket (for logs), e.g. `s3://vllm-wheels`.
    fn location(&self) -> String;

    /// Lists one page of objects under `prefix`, starting after `continuation`.
    fn list_page(
        &self,
        prefix: Option<&str>,
        continuation: Option<&str>,
    ) -> impl Future<Output = Result<ListPage, StorageError>> + Send;

    /// Writes `body` to `key`, overwriting any existing object.
    fn put_object(
        &self,
        key: &str,
        body: Bytes,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Reads the whole object at `key`.
    fn get_object(&self, key: &str) -> impl Future<Output = Result<Bytes, StorageError>> + Send;
}

/// Normalizes a listing prefix to its directory form without the trailing `/`.
///
/// Returns `None` for an empty (whole bucket) prefix.
pub fn normalize_prefix(prefix: Option<&str>) -> Option<&str> {
    prefix
        .map(|p| p.trim_matches('/'))
        .filter(|p| !p.is_empty())
}

/// Returns `true` if `key` lies under the directory `prefix`.
pub fn key_under_prefix(key: &str, prefix: Option<&str>) -> bool {
    match normalize_prefix(prefix) {
        None => true,
        Some(dir) => key
            .strip_prefix(dir)
            .is_some_and(|rest| rest.starts_with('/')),
    }
}
