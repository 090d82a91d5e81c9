//! Object storage abstraction
//!
//! The core only needs two storage operations: paginated key listing and
//! single-object upload. Adapters (see `photosync-s3`) implement this trait
//! on top of a concrete SDK.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

/// Options for a single listing call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOptions {
    /// Only return keys starting with this prefix
    pub prefix: String,

    /// Cursor returned by the previous page
    pub continuation_token: Option<String>,

    /// Page size hint
    pub max_keys: Option<i32>,
}

/// One page of a listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListResult {
    /// Object keys on this page
    pub keys: Vec<String>,

    /// Whether more pages follow
    pub truncated: bool,

    /// Cursor for the next page, when truncated
    pub continuation_token: Option<String>,
}

/// Destination object storage
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List one page of object keys in `bucket`
    async fn list_objects(&self, bucket: &str, options: ListOptions) -> Result<ListResult>;

    /// Upload `data` under `key` with the given content type
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<()>;
}
