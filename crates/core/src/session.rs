//! Pending login sessions and credential cache directories
//!
//! A login that stops at a verification challenge is parked as a
//! [`PendingAuthSession`] until the code arrives in a later request. Each
//! session owns a private credential cache directory that the remote account
//! client uses to carry transport state between the two requests.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use tempfile::TempDir;

use crate::error::{Error, Result};

const CACHE_DIR_PREFIX: &str = "photosync-session-";

/// A login waiting for its verification code
pub struct PendingAuthSession {
    session_id: String,
    account_identifier: String,
    secret: String,
    cache_dir: TempDir,
    created_at: Timestamp,
}

impl PendingAuthSession {
    pub fn new(
        session_id: String,
        account_identifier: String,
        secret: String,
        cache_dir: TempDir,
    ) -> Self {
        Self {
            session_id,
            account_identifier,
            secret,
            cache_dir,
            created_at: Timestamp::now(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn account_identifier(&self) -> &str {
        &self.account_identifier
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// Credential cache directory owned by this session
    pub fn cache_path(&self) -> &Path {
        self.cache_dir.path()
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }
}

impl std::fmt::Debug for PendingAuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingAuthSession")
            .field("session_id", &self.session_id)
            .field("account_identifier", &self.account_identifier)
            .field("secret", &"<redacted>")
            .field("cache_dir", &self.cache_dir.path())
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Single credential cache file, handed to the caller for later replay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialCachePayload {
    pub file_name: String,
    pub data: String,
}

/// Create a private cache directory, seeded with `payload` when given
///
/// Only the final component of the payload's file name is used, so a payload
/// can never write outside the directory.
pub async fn create_cache_dir(payload: Option<&CredentialCachePayload>) -> Result<TempDir> {
    let dir = tempfile::Builder::new().prefix(CACHE_DIR_PREFIX).tempdir()?;

    if let Some(payload) = payload {
        let name = Path::new(&payload.file_name)
            .file_name()
            .ok_or_else(|| {
                Error::InvalidPath(format!("cache file name: {:?}", payload.file_name))
            })?;
        tokio::fs::write(dir.path().join(name), &payload.data).await?;
        tracing::debug!(file = ?name, "Seeded credential cache");
    }

    Ok(dir)
}

/// Read back the cache file left in `dir`, if there is one
///
/// When several files exist the first by name is returned.
pub async fn extract_cache_payload(dir: &Path) -> Result<Option<CredentialCachePayload>> {
    let mut names = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_file() {
            names.push(entry.file_name());
        }
    }
    names.sort();

    let Some(name) = names.into_iter().next() else {
        return Ok(None);
    };

    let data = tokio::fs::read_to_string(dir.join(&name)).await?;
    Ok(Some(CredentialCachePayload {
        file_name: name.to_string_lossy().into_owned(),
        data,
    }))
}

/// Storage for pending sessions, keyed by session id
///
/// Operations on different ids are independent. Nothing serializes two
/// resumes of the same id; callers must not issue them concurrently.
pub trait SessionStore: Send + Sync {
    fn contains(&self, session_id: &str) -> bool;

    fn insert(&self, session: PendingAuthSession);

    fn get(&self, session_id: &str) -> Option<Arc<PendingAuthSession>>;

    fn remove(&self, session_id: &str) -> Option<Arc<PendingAuthSession>>;

    /// Drop every session created before `cutoff`, returning how many went
    fn purge_created_before(&self, cutoff: Timestamp) -> usize;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Process-local session store
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<String, Arc<PendingAuthSession>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<PendingAuthSession>>> {
        // The map holds no invariant a panicking holder could have broken.
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SessionStore for InMemorySessionStore {
    fn contains(&self, session_id: &str) -> bool {
        self.lock().contains_key(session_id)
    }

    fn insert(&self, session: PendingAuthSession) {
        self.lock()
            .insert(session.session_id.clone(), Arc::new(session));
    }

    fn get(&self, session_id: &str) -> Option<Arc<PendingAuthSession>> {
        self.lock().get(session_id).cloned()
    }

    fn remove(&self, session_id: &str) -> Option<Arc<PendingAuthSession>> {
        self.lock().remove(session_id)
    }

    fn purge_created_before(&self, cutoff: Timestamp) -> usize {
        let mut sessions = self.lock();
        let before = sessions.len();
        sessions.retain(|_, s| s.created_at >= cutoff);
        before - sessions.len()
    }

    fn len(&self) -> usize {
        self.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(id: &str) -> PendingAuthSession {
        let dir = tempfile::tempdir().unwrap();
        PendingAuthSession::new(
            id.to_string(),
            "user@example.com".to_string(),
            "hunter2".to_string(),
            dir,
        )
    }

    #[tokio::test]
    async fn test_cache_dir_round_trip() {
        let payload = CredentialCachePayload {
            file_name: "userexamplecom".to_string(),
            data: "{\"cookies\":[]}".to_string(),
        };

        let dir = create_cache_dir(Some(&payload)).await.unwrap();
        let extracted = extract_cache_payload(dir.path()).await.unwrap();

        assert_eq!(extracted, Some(payload));
    }

    #[tokio::test]
    async fn test_empty_cache_dir_has_no_payload() {
        let dir = create_cache_dir(None).await.unwrap();
        assert_eq!(extract_cache_payload(dir.path()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_payload_name_reduced_to_basename() {
        let payload = CredentialCachePayload {
            file_name: "../../etc/cookies".to_string(),
            data: "x".to_string(),
        };

        let dir = create_cache_dir(Some(&payload)).await.unwrap();
        assert!(dir.path().join("cookies").is_file());

        let extracted = extract_cache_payload(dir.path()).await.unwrap().unwrap();
        assert_eq!(extracted.file_name, "cookies");
    }

    #[tokio::test]
    async fn test_payload_without_file_name_rejected() {
        let payload = CredentialCachePayload {
            file_name: "..".to_string(),
            data: "x".to_string(),
        };
        let err = create_cache_dir(Some(&payload)).await.unwrap_err();
        assert!(matches!(err, Error::InvalidPath(_)));
    }

    #[tokio::test]
    async fn test_extract_ignores_directories_and_picks_first_name() {
        let dir = create_cache_dir(None).await.unwrap();
        std::fs::create_dir(dir.path().join("a-subdir")).unwrap();
        std::fs::write(dir.path().join("zeta"), "z").unwrap();
        std::fs::write(dir.path().join("beta"), "b").unwrap();

        let extracted = extract_cache_payload(dir.path()).await.unwrap().unwrap();
        assert_eq!(extracted.file_name, "beta");
        assert_eq!(extracted.data, "b");
    }

    #[test]
    fn test_store_insert_get_remove() {
        let store = InMemorySessionStore::new();
        store.insert(session("s1"));

        assert!(store.contains("s1"));
        assert_eq!(store.get("s1").unwrap().account_identifier(), "user@example.com");
        assert_eq!(store.len(), 1);

        let removed = store.remove("s1").unwrap();
        assert_eq!(removed.session_id(), "s1");
        assert!(store.get("s1").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_cache_dir_removed_with_last_reference() {
        let store = InMemorySessionStore::new();
        store.insert(session("s1"));
        let path = store.get("s1").unwrap().cache_path().to_path_buf();
        assert!(path.is_dir());

        drop(store.remove("s1"));
        assert!(!path.exists());
    }

    #[test]
    fn test_purge_created_before() {
        let store = InMemorySessionStore::new();
        store.insert(session("old"));
        std::thread::sleep(std::time::Duration::from_millis(5));
        let cutoff = Timestamp::now();
        std::thread::sleep(std::time::Duration::from_millis(5));
        store.insert(session("new"));

        assert_eq!(store.purge_created_before(cutoff), 1);
        assert!(!store.contains("old"));
        assert!(store.contains("new"));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let rendered = format!("{:?}", session("s1"));
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }
}
