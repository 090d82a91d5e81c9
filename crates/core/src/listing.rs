//! Existing-object listing
//!
//! Builds the dedup baseline: every key already stored under the destination
//! prefix, collected across all listing pages.

use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::traits::{ListOptions, ObjectStore};

/// Page size requested from the store
const LIST_PAGE_SIZE: i32 = 1000;

/// Collect all keys under `prefix` in `bucket`
///
/// Any listing failure is returned as-is; a partially built set is never
/// handed back.
pub async fn list_existing_keys(
    store: &dyn ObjectStore,
    bucket: &str,
    prefix: &str,
) -> Result<HashSet<String>> {
    let mut keys = HashSet::new();
    let mut continuation_token: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let options = ListOptions {
            prefix: prefix.to_string(),
            continuation_token: continuation_token.take(),
            max_keys: Some(LIST_PAGE_SIZE),
        };

        let result = store.list_objects(bucket, options).await?;
        pages += 1;

        tracing::debug!(page = pages, keys = result.keys.len(), "Listed page");
        keys.extend(result.keys.into_iter().filter(|k| !k.is_empty()));

        if !result.truncated {
            break;
        }

        match result.continuation_token {
            Some(token) => continuation_token = Some(token),
            None => {
                return Err(Error::Network(format!(
                    "listing of {bucket}/{prefix} truncated without a continuation token"
                )));
            }
        }
    }

    tracing::info!(bucket, prefix, pages, existing = keys.len(), "Dedup baseline ready");
    Ok(keys)
}
