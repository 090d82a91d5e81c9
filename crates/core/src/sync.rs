//! Sync engine
//!
//! Copies every photo of an account into the destination bucket unless its
//! key is already present. A failing item is recorded and skipped; only a
//! failure to establish the dedup baseline aborts the run.

use std::collections::HashSet;
use std::sync::Arc;

use futures::StreamExt;
use serde::{Deserialize, Serialize};

use crate::account::{AccountSession, SourceItem};
use crate::error::Result;
use crate::fetch::fetch_item_bytes;
use crate::key::{KeyBuilder, resolve_filename, resolve_identifier};
use crate::listing::list_existing_keys;
use crate::traits::ObjectStore;

/// Content type used when the key's extension is unknown
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Aggregate result of one sync run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncOutcome {
    /// Items uploaded during this run
    pub imported: usize,

    /// Items whose key already existed
    pub skipped: usize,

    /// One message per failed item, in processing order
    pub errors: Vec<String>,
}

impl SyncOutcome {
    /// Number of items that contributed to this outcome
    pub fn processed(&self) -> usize {
        self.imported + self.skipped + self.errors.len()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Uploads account photos into one bucket/prefix
pub struct SyncEngine {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    keys: KeyBuilder,
}

impl SyncEngine {
    pub fn new(store: Arc<dyn ObjectStore>, bucket: impl Into<String>, prefix: &str) -> Self {
        Self {
            store,
            bucket: bucket.into(),
            keys: KeyBuilder::new(prefix),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Normalized destination prefix
    pub fn prefix(&self) -> &str {
        self.keys.prefix()
    }

    /// Keys currently stored under the destination prefix
    pub async fn existing_keys(&self) -> Result<HashSet<String>> {
        list_existing_keys(self.store.as_ref(), &self.bucket, self.keys.prefix()).await
    }

    /// Sync at most `limit` photos (all of them when `None`)
    pub async fn run(
        &self,
        account: &dyn AccountSession,
        limit: Option<usize>,
    ) -> Result<SyncOutcome> {
        let mut existing = self.existing_keys().await?;
        let mut outcome = SyncOutcome::default();

        let mut photos = account.photos().take(limit.unwrap_or(usize::MAX));
        while let Some(item) = photos.next().await {
            let filename = resolve_filename(item.as_ref());
            let identifier = resolve_identifier(item.as_ref());
            let key = self.keys.key(identifier.as_deref(), &filename);

            if existing.contains(&key) {
                tracing::debug!(key = %key, "Already present, skipping");
                outcome.skipped += 1;
                continue;
            }

            match self.transfer(item.as_ref(), &filename, &key).await {
                Ok(()) => {
                    tracing::debug!(key = %key, "Imported");
                    existing.insert(key);
                    outcome.imported += 1;
                }
                Err(e) => {
                    tracing::warn!(filename = %filename, error = %e, "Item failed");
                    outcome.errors.push(format!("Failed {filename}: {e}"));
                }
            }
        }

        tracing::info!(
            bucket = %self.bucket,
            imported = outcome.imported,
            skipped = outcome.skipped,
            errors = outcome.errors.len(),
            "Sync complete"
        );
        Ok(outcome)
    }

    async fn transfer(&self, item: &dyn SourceItem, filename: &str, key: &str) -> Result<()> {
        let data = fetch_item_bytes(item, filename).await?;
        let content_type = mime_guess::from_path(key)
            .first_raw()
            .unwrap_or(DEFAULT_CONTENT_TYPE);

        self.store
            .put_object(&self.bucket, key, data, content_type)
            .await
    }
}
