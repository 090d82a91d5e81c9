//! Item content retrieval
//!
//! A source item's in-memory fetch may come back in any [`FetchOutput`]
//! shape. When none of them yields bytes, the item is asked to save itself
//! into a private temporary directory and the file is read back from disk.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use futures::TryStreamExt;
use tokio::io::AsyncReadExt;

use crate::account::{FetchOutput, FetchTarget, RECORD_DATA_FIELD, SourceItem};
use crate::error::{Error, Result};

const FETCH_DIR_PREFIX: &str = "photosync-fetch-";

/// Fetch the raw content of `item`
///
/// `filename` is the item's resolved filename; it is used to locate the
/// saved file when the item does not report where it wrote it.
pub async fn fetch_item_bytes(item: &dyn SourceItem, filename: &str) -> Result<Bytes> {
    let output = item.fetch(FetchTarget::Memory).await?;
    tracing::debug!(filename, output = ?output, "In-memory fetch returned");

    if let Some(data) = read_output(output).await? {
        return Ok(data);
    }

    fetch_via_directory(item, filename).await
}

/// Bytes from an in-memory shape, `None` when the shape carries nothing usable
async fn read_output(output: FetchOutput) -> Result<Option<Bytes>> {
    match output {
        FetchOutput::Bytes(data) => Ok(Some(data)),
        FetchOutput::Body(stream) => {
            let data = stream
                .try_fold(Vec::new(), |mut acc, chunk| async move {
                    acc.extend_from_slice(&chunk);
                    Ok(acc)
                })
                .await?;
            Ok(Some(Bytes::from(data)))
        }
        FetchOutput::Reader(mut reader) => {
            let mut data = Vec::new();
            reader.read_to_end(&mut data).await?;
            Ok(Some(Bytes::from(data)))
        }
        FetchOutput::Buffer(cursor) => Ok(Some(Bytes::from(cursor.into_inner()))),
        FetchOutput::Record(mut record) => Ok(record.remove(RECORD_DATA_FIELD)),
        FetchOutput::Saved(Some(path)) => {
            if !exists(&path).await {
                return Ok(None);
            }
            Ok(Some(Bytes::from(tokio::fs::read(&path).await?)))
        }
        FetchOutput::Saved(None) => Ok(None),
    }
}

async fn fetch_via_directory(item: &dyn SourceItem, filename: &str) -> Result<Bytes> {
    // Removed on drop, once the content is in memory.
    let dir = tempfile::Builder::new().prefix(FETCH_DIR_PREFIX).tempdir()?;

    let output = item
        .fetch(FetchTarget::Directory(dir.path().to_path_buf()))
        .await?;

    let reported = match output {
        FetchOutput::Saved(path) => path,
        other => {
            if let Some(data) = read_output(other).await? {
                return Ok(data);
            }
            None
        }
    };

    let path = match reported {
        Some(path) if is_file(&path).await => Some(path),
        _ => locate_saved(dir.path(), filename).await,
    };

    match path {
        Some(path) => {
            tracing::debug!(filename, path = %path.display(), "Read item from disk");
            Ok(Bytes::from(tokio::fs::read(&path).await?))
        }
        None => Err(Error::Retrieval(format!(
            "no retrieval strategy produced content for {filename}"
        ))),
    }
}

async fn locate_saved(dir: &Path, filename: &str) -> Option<PathBuf> {
    let name = Path::new(filename).file_name()?;
    let candidate = dir.join(name);
    exists(&candidate).await.then_some(candidate)
}

async fn exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}
