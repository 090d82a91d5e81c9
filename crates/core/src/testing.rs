//! In-memory fakes for the collaborator traits

use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use futures::stream::{self, BoxStream};

use crate::account::{
    AccountConnector, AccountSession, FetchOutput, FetchTarget, ItemAttribute, SourceItem,
};
use crate::error::{Error, Result};
use crate::traits::{ListOptions, ListResult, ObjectStore};

/// How a fake item answers `fetch`
#[derive(Debug, Clone)]
pub enum FakeContent {
    Bytes(Vec<u8>),
    Body(Vec<Vec<u8>>),
    Reader(Vec<u8>),
    Buffer(Vec<u8>),
    Record(HashMap<String, Vec<u8>>),
    /// Only available by saving to a directory; the path is reported
    Saved(Vec<u8>),
    /// Saved under the item's filename, but no path is reported
    SavedUnnamed(Vec<u8>),
    /// Saved under the item's filename, but the directory is reported
    SavedReportingDir(Vec<u8>),
    /// Nothing is ever produced
    Missing,
    Fail(String),
}

#[derive(Clone)]
pub struct FakeItem {
    attrs: HashMap<ItemAttribute, String>,
    content: FakeContent,
    fetches: Arc<AtomicUsize>,
}

impl FakeItem {
    pub fn new() -> Self {
        Self {
            attrs: HashMap::new(),
            content: FakeContent::Bytes(b"photo".to_vec()),
            fetches: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Item with an `Id` and a `Filename`
    pub fn photo(id: Option<&str>, filename: &str) -> Self {
        let item = Self::new().with(ItemAttribute::Filename, filename);
        match id {
            Some(id) => item.with(ItemAttribute::Id, id),
            None => item,
        }
    }

    pub fn with(mut self, attr: ItemAttribute, value: &str) -> Self {
        self.attrs.insert(attr, value.to_string());
        self
    }

    pub fn content(mut self, content: FakeContent) -> Self {
        self.content = content;
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn filename(&self) -> String {
        self.attrs
            .get(&ItemAttribute::Filename)
            .cloned()
            .unwrap_or_else(|| "unnamed.jpg".to_string())
    }
}

#[async_trait]
impl SourceItem for FakeItem {
    fn attribute(&self, attr: ItemAttribute) -> Option<String> {
        self.attrs.get(&attr).cloned()
    }

    async fn fetch(&self, target: FetchTarget) -> Result<FetchOutput> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        let output = match (&self.content, target) {
            (FakeContent::Fail(msg), _) => return Err(Error::Network(msg.clone())),
            (FakeContent::Bytes(data), _) => FetchOutput::Bytes(Bytes::from(data.clone())),
            (FakeContent::Body(chunks), _) => {
                let chunks: Vec<Result<Bytes>> =
                    chunks.iter().map(|c| Ok(Bytes::from(c.clone()))).collect();
                FetchOutput::Body(stream::iter(chunks).boxed())
            }
            (FakeContent::Reader(data), _) => {
                FetchOutput::Reader(Box::new(Cursor::new(data.clone())))
            }
            (FakeContent::Buffer(data), _) => FetchOutput::Buffer(Cursor::new(data.clone())),
            (FakeContent::Record(map), _) => FetchOutput::Record(
                map.iter()
                    .map(|(k, v)| (k.clone(), Bytes::from(v.clone())))
                    .collect(),
            ),
            (FakeContent::Saved(data), FetchTarget::Directory(dir)) => {
                let path = dir.join(format!("saved-{}", self.filename()));
                std::fs::write(&path, data)?;
                FetchOutput::Saved(Some(path))
            }
            (FakeContent::SavedUnnamed(data), FetchTarget::Directory(dir)) => {
                std::fs::write(dir.join(self.filename()), data)?;
                FetchOutput::Saved(None)
            }
            (FakeContent::SavedReportingDir(data), FetchTarget::Directory(dir)) => {
                std::fs::write(dir.join(self.filename()), data)?;
                FetchOutput::Saved(Some(dir))
            }
            (
                FakeContent::Saved(_)
                | FakeContent::SavedUnnamed(_)
                | FakeContent::SavedReportingDir(_)
                | FakeContent::Missing,
                _,
            ) => {
                FetchOutput::Saved(None)
            }
        };
        Ok(output)
    }
}

/// Object store backed by a sorted map, paging `page_size` keys at a time
pub struct MemoryStore {
    objects: Mutex<BTreeMap<String, (Bytes, String)>>,
    page_size: usize,
    failing_keys: HashSet<String>,
    fail_listing: bool,
    list_calls: AtomicUsize,
    put_calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            objects: Mutex::new(BTreeMap::new()),
            page_size: 2,
            failing_keys: HashSet::new(),
            fail_listing: false,
            list_calls: AtomicUsize::new(0),
            put_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_objects(self, keys: &[&str]) -> Self {
        {
            let mut objects = self.objects.lock().unwrap();
            for key in keys {
                objects.insert(
                    key.to_string(),
                    (Bytes::new(), "application/octet-stream".to_string()),
                );
            }
        }
        self
    }

    pub fn page_size(mut self, size: usize) -> Self {
        self.page_size = size;
        self
    }

    pub fn failing_put(mut self, key: &str) -> Self {
        self.failing_keys.insert(key.to_string());
        self
    }

    pub fn failing_listing(mut self) -> Self {
        self.fail_listing = true;
        self
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }

    pub fn object(&self, key: &str) -> Option<(Bytes, String)> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn put_calls(&self) -> usize {
        self.put_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn list_objects(&self, _bucket: &str, options: ListOptions) -> Result<ListResult> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_listing {
            return Err(Error::Network("listing unavailable".to_string()));
        }

        let keys: Vec<String> = self
            .objects
            .lock()
            .unwrap()
            .keys()
            .filter(|k| k.starts_with(&options.prefix))
            .cloned()
            .collect();

        let start: usize = options
            .continuation_token
            .as_deref()
            .map(|t| t.parse().unwrap())
            .unwrap_or(0);
        let end = (start + self.page_size).min(keys.len());
        let truncated = end < keys.len();

        Ok(ListResult {
            keys: keys[start..end].to_vec(),
            truncated,
            continuation_token: truncated.then(|| end.to_string()),
        })
    }

    async fn put_object(
        &self,
        _bucket: &str,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<()> {
        self.put_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_keys.contains(key) {
            return Err(Error::Network("upload rejected".to_string()));
        }
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), (data, content_type.to_string()));
        Ok(())
    }
}

/// Name of the cache file the fake connector keeps in the cache directory
pub const FAKE_CACHE_FILE: &str = "session.json";

/// Connector whose sessions demand a code until one has been accepted
///
/// Acceptance is remembered in the cache directory, so a later login that
/// reuses the directory (or a replayed payload) skips the challenge.
pub struct FakeConnector {
    items: Vec<FakeItem>,
    challenge: bool,
    code: String,
    extra_cache_file: Option<(String, Vec<u8>)>,
    logins: Arc<AtomicUsize>,
    cache_dirs: Mutex<Vec<PathBuf>>,
}

impl FakeConnector {
    pub fn new(items: Vec<FakeItem>) -> Self {
        Self {
            items,
            challenge: false,
            code: "123456".to_string(),
            extra_cache_file: None,
            logins: Arc::new(AtomicUsize::new(0)),
            cache_dirs: Mutex::new(Vec::new()),
        }
    }

    pub fn with_challenge(mut self, code: &str) -> Self {
        self.challenge = true;
        self.code = code.to_string();
        self
    }

    /// Also drop `name` with raw `data` into the cache directory on login
    pub fn with_cache_file(mut self, name: &str, data: &[u8]) -> Self {
        self.extra_cache_file = Some((name.to_string(), data.to_vec()));
        self
    }

    pub fn logins(&self) -> usize {
        self.logins.load(Ordering::SeqCst)
    }

    pub fn cache_dirs(&self) -> Vec<PathBuf> {
        self.cache_dirs.lock().unwrap().clone()
    }
}

#[async_trait]
impl AccountConnector for FakeConnector {
    async fn login(
        &self,
        identifier: &str,
        secret: &str,
        cache_dir: &Path,
    ) -> Result<Box<dyn AccountSession>> {
        self.logins.fetch_add(1, Ordering::SeqCst);
        self.cache_dirs.lock().unwrap().push(cache_dir.to_path_buf());

        if secret == "wrong" {
            return Err(Error::Auth(format!("bad password for {identifier}")));
        }

        let cache_file = cache_dir.join(FAKE_CACHE_FILE);
        let trusted = std::fs::read_to_string(&cache_file)
            .map(|c| c == "trusted")
            .unwrap_or(false);
        if !trusted {
            std::fs::write(&cache_file, "pending")?;
        }
        if let Some((name, data)) = &self.extra_cache_file {
            std::fs::write(cache_dir.join(name), data)?;
        }

        Ok(Box::new(FakeAccount {
            items: self.items.clone(),
            pending: self.challenge && !trusted,
            code: self.code.clone(),
            cache_file,
        }))
    }
}

pub struct FakeAccount {
    items: Vec<FakeItem>,
    pending: bool,
    code: String,
    cache_file: PathBuf,
}

impl FakeAccount {
    pub fn new(items: Vec<FakeItem>) -> Self {
        Self {
            items,
            pending: false,
            code: String::new(),
            cache_file: PathBuf::new(),
        }
    }
}

#[async_trait]
impl AccountSession for FakeAccount {
    fn requires_challenge(&self) -> bool {
        self.pending
    }

    async fn validate_code(&mut self, code: &str) -> Result<bool> {
        if code != self.code {
            return Ok(false);
        }
        self.pending = false;
        std::fs::write(&self.cache_file, "trusted")?;
        Ok(true)
    }

    fn photos(&self) -> BoxStream<'_, Box<dyn SourceItem>> {
        stream::iter(
            self.items
                .iter()
                .cloned()
                .map(|item| Box::new(item) as Box<dyn SourceItem>),
        )
        .boxed()
    }
}
