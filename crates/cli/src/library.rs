//! Local photo library
//!
//! Treats a directory tree of exported photos as a photo account so it can
//! be fed through the sync engine. Items are ordered by relative path and
//! identified by a hash of that path, which keeps destination keys stable
//! across runs even when two folders contain the same file name.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::StreamExt;
use futures::stream::{self, BoxStream};
use photosync_core::{AccountSession, FetchOutput, FetchTarget, ItemAttribute, SourceItem};
use sha2::{Digest, Sha256};

/// Hex characters of the path hash used as item identifier
const IDENTIFIER_LEN: usize = 16;

/// A directory of photos, walked once at open time
#[derive(Debug)]
pub struct LocalLibrary {
    root: PathBuf,
    entries: Vec<String>,
}

impl LocalLibrary {
    /// Scan `root` recursively, skipping hidden files and directories
    pub fn open(root: &Path) -> Result<Self> {
        let mut entries = Vec::new();
        scan(root, root, &mut entries)
            .with_context(|| format!("Failed to scan library {}", root.display()))?;
        entries.sort();

        tracing::debug!(root = %root.display(), photos = entries.len(), "Library scanned");
        Ok(Self {
            root: root.to_path_buf(),
            entries,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn scan(root: &Path, dir: &Path, entries: &mut Vec<String>) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }

        let path = entry.path();
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            scan(root, &path, entries)?;
        } else if file_type.is_file() {
            let relative = path.strip_prefix(root).unwrap_or(&path);
            entries.push(
                relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/"),
            );
        }
    }
    Ok(())
}

#[async_trait]
impl AccountSession for LocalLibrary {
    fn requires_challenge(&self) -> bool {
        false
    }

    async fn validate_code(&mut self, _code: &str) -> photosync_core::Result<bool> {
        Ok(true)
    }

    fn photos(&self) -> BoxStream<'_, Box<dyn SourceItem>> {
        stream::iter(self.entries.iter().map(|relative| {
            Box::new(LibraryItem {
                path: self.root.join(relative),
                relative: relative.clone(),
            }) as Box<dyn SourceItem>
        }))
        .boxed()
    }
}

struct LibraryItem {
    path: PathBuf,
    relative: String,
}

impl LibraryItem {
    fn identifier(&self) -> String {
        let digest = Sha256::digest(self.relative.as_bytes());
        let mut id = hex::encode(digest);
        id.truncate(IDENTIFIER_LEN);
        id
    }

    fn file_name(&self) -> Option<String> {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
    }
}

#[async_trait]
impl SourceItem for LibraryItem {
    fn attribute(&self, attr: ItemAttribute) -> Option<String> {
        match attr {
            ItemAttribute::Id => Some(self.identifier()),
            ItemAttribute::Filename => self.file_name(),
            _ => None,
        }
    }

    async fn fetch(&self, target: FetchTarget) -> photosync_core::Result<FetchOutput> {
        match target {
            FetchTarget::Memory => {
                let file = tokio::fs::File::open(&self.path).await?;
                Ok(FetchOutput::Reader(Box::new(file)))
            }
            FetchTarget::Directory(dir) => {
                let Some(name) = self.path.file_name() else {
                    return Ok(FetchOutput::Saved(None));
                };
                let dest = dir.join(name);
                tokio::fs::copy(&self.path, &dest).await?;
                Ok(FetchOutput::Saved(Some(dest)))
            }
        }
    }
}
