//! Remote photo account abstraction
//!
//! A remote account is reached through an [`AccountConnector`], which performs
//! the login and hands back an [`AccountSession`]. The session exposes the
//! verification challenge state and the photo collection; each element of the
//! collection is a [`SourceItem`].

use std::collections::HashMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use tokio::io::AsyncRead;

use crate::error::Result;

/// Attributes a source item may carry
///
/// Different item kinds populate different attributes, so callers probe them
/// in a fixed priority order (see [`IDENTIFIER_ATTRIBUTES`] and
/// [`FILENAME_ATTRIBUTES`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemAttribute {
    Id,
    AssetId,
    RecordName,
    Filename,
    OriginalFilename,
    FileName,
    Name,
}

/// Identifier attributes, highest priority first
pub const IDENTIFIER_ATTRIBUTES: [ItemAttribute; 3] = [
    ItemAttribute::Id,
    ItemAttribute::AssetId,
    ItemAttribute::RecordName,
];

/// Filename attributes, highest priority first
pub const FILENAME_ATTRIBUTES: [ItemAttribute; 4] = [
    ItemAttribute::Filename,
    ItemAttribute::OriginalFilename,
    ItemAttribute::FileName,
    ItemAttribute::Name,
];

/// Where a fetch should deliver its content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchTarget {
    /// Return the content in memory
    Memory,
    /// Materialize the content as a file inside this directory
    Directory(PathBuf),
}

/// Raw bytes held under a known key inside a [`FetchOutput::Record`]
pub const RECORD_DATA_FIELD: &str = "data";

/// Content returned by [`SourceItem::fetch`]
///
/// Items of different type or age come back in different shapes; each
/// variant maps to one retrieval strategy of the item fetcher.
pub enum FetchOutput {
    /// Complete content as a byte buffer
    Bytes(Bytes),
    /// Response body delivered as a stream of chunks
    Body(BoxStream<'static, Result<Bytes>>),
    /// Readable stream
    Reader(Box<dyn AsyncRead + Send + Unpin>),
    /// In-memory buffer wrapper
    Buffer(Cursor<Vec<u8>>),
    /// Keyed container; raw data lives under [`RECORD_DATA_FIELD`]
    Record(HashMap<String, Bytes>),
    /// Content written to local disk, if the path is known
    Saved(Option<PathBuf>),
}

impl std::fmt::Debug for FetchOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchOutput::Bytes(b) => f.debug_tuple("Bytes").field(&b.len()).finish(),
            FetchOutput::Body(_) => f.write_str("Body(..)"),
            FetchOutput::Reader(_) => f.write_str("Reader(..)"),
            FetchOutput::Buffer(c) => f.debug_tuple("Buffer").field(&c.get_ref().len()).finish(),
            FetchOutput::Record(m) => f.debug_tuple("Record").field(&m.keys()).finish(),
            FetchOutput::Saved(p) => f.debug_tuple("Saved").field(p).finish(),
        }
    }
}

/// One element of a remote photo collection
#[async_trait]
pub trait SourceItem: Send + Sync {
    /// Value of an attribute, if the item has it
    fn attribute(&self, attr: ItemAttribute) -> Option<String>;

    /// Retrieve the item's content
    async fn fetch(&self, target: FetchTarget) -> Result<FetchOutput>;
}

/// An authenticated (or challenge-pending) remote account
#[async_trait]
pub trait AccountSession: Send + Sync {
    /// Whether a verification code must be supplied before full access
    fn requires_challenge(&self) -> bool;

    /// Submit a verification code; `Ok(false)` means the code was rejected
    async fn validate_code(&mut self, code: &str) -> Result<bool>;

    /// The photo collection in the account's native order
    fn photos(&self) -> BoxStream<'_, Box<dyn SourceItem>>;
}

/// Entry point to a remote account
#[async_trait]
pub trait AccountConnector: Send + Sync {
    /// Log in, keeping transport-level session state inside `cache_dir`
    async fn login(
        &self,
        identifier: &str,
        secret: &str,
        cache_dir: &Path,
    ) -> Result<Box<dyn AccountSession>>;
}
