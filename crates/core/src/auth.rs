//! Two-leg login flow in front of the sync engine
//!
//! `begin_login` either syncs immediately or, when the account asks for a
//! verification code, parks the login and returns a session id. A later
//! `resume_login` with that id and the code finishes the login and runs a
//! full sync.
//!
//! ```text
//! NoSession --begin (challenge)--> PendingChallenge --resume (valid code)--> Resolved
//!     \--begin (no challenge)--> sync, no session created
//! ```

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Serialize};

use crate::account::AccountConnector;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::session::{
    CredentialCachePayload, InMemorySessionStore, PendingAuthSession, SessionStore,
    create_cache_dir, extract_cache_payload,
};
use crate::sync::{SyncEngine, SyncOutcome};

/// Credentials submitted by the caller for the first leg
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    #[serde(alias = "apple_id")]
    pub identifier: String,

    #[serde(alias = "app_password")]
    pub secret: String,

    /// Cache payload returned by an earlier call
    #[serde(default)]
    pub session: Option<CredentialCachePayload>,

    /// Maximum number of photos to process
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Verification code submitted for a parked login
#[derive(Debug, Clone, Deserialize)]
pub struct ResumeRequest {
    pub session_id: String,
    pub code: String,
}

/// Result of either login leg
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LoginResponse {
    /// A code is required; resume with this id
    NeedsChallenge { session_id: String },

    /// The sync ran; `session` can be replayed on the next call
    #[serde(rename = "ok")]
    Completed {
        #[serde(flatten)]
        outcome: SyncOutcome,
        session: Option<CredentialCachePayload>,
    },
}

/// Bridges credential submission, code verification and sync
pub struct AuthSessionManager {
    connector: Arc<dyn AccountConnector>,
    engine: SyncEngine,
    sessions: Arc<dyn SessionStore>,
    session_ttl: Option<Duration>,
}

impl AuthSessionManager {
    pub fn new(connector: Arc<dyn AccountConnector>, engine: SyncEngine) -> Self {
        Self {
            connector,
            engine,
            sessions: Arc::new(InMemorySessionStore::new()),
            session_ttl: None,
        }
    }

    /// Manager honoring the configured session TTL, if any
    pub fn from_config(
        connector: Arc<dyn AccountConnector>,
        engine: SyncEngine,
        config: &Config,
    ) -> Self {
        let manager = Self::new(connector, engine);
        match config.session_ttl() {
            Some(ttl) => manager.with_session_ttl(ttl),
            None => manager,
        }
    }

    /// Use a caller-provided session store
    pub fn with_store(mut self, sessions: Arc<dyn SessionStore>) -> Self {
        self.sessions = sessions;
        self
    }

    /// Evict pending sessions older than `ttl`
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = Some(ttl);
        self
    }

    pub fn sessions(&self) -> &Arc<dyn SessionStore> {
        &self.sessions
    }

    pub fn engine(&self) -> &SyncEngine {
        &self.engine
    }

    /// First leg: log in with credentials, syncing unless a code is needed
    pub async fn begin_login(
        &self,
        identifier: &str,
        secret: &str,
        limit: Option<usize>,
        cache: Option<&CredentialCachePayload>,
    ) -> Result<LoginResponse> {
        self.purge_expired();

        let cache_dir = create_cache_dir(cache).await?;
        let account = self
            .connector
            .login(identifier, secret, cache_dir.path())
            .await?;

        if account.requires_challenge() {
            let session_id = self.fresh_session_id();
            self.sessions.insert(PendingAuthSession::new(
                session_id.clone(),
                identifier.to_string(),
                secret.to_string(),
                cache_dir,
            ));
            tracing::info!(session_id = %session_id, "Verification code required, login parked");
            return Ok(LoginResponse::NeedsChallenge { session_id });
        }

        let outcome = self.engine.run(account.as_ref(), limit).await?;
        let session = read_cache_payload(cache_dir.path()).await;

        Ok(LoginResponse::Completed { outcome, session })
    }

    /// Convenience wrapper taking a deserialized request
    pub async fn handle_login(&self, request: &LoginRequest) -> Result<LoginResponse> {
        self.begin_login(
            &request.identifier,
            &request.secret,
            request.limit,
            request.session.as_ref(),
        )
        .await
    }

    /// Second leg: supply the code for a parked login and run a full sync
    ///
    /// An unknown id is [`Error::NotFound`]; a rejected code is
    /// [`Error::Auth`] and leaves the session in place for another attempt.
    pub async fn resume_login(&self, session_id: &str, code: &str) -> Result<LoginResponse> {
        self.purge_expired();

        let pending = self
            .sessions
            .get(session_id)
            .ok_or_else(|| Error::NotFound(format!("Session not found: {session_id}")))?;

        let mut account = self
            .connector
            .login(
                pending.account_identifier(),
                pending.secret(),
                pending.cache_path(),
            )
            .await?;

        if account.requires_challenge() && !account.validate_code(code).await? {
            tracing::warn!(session_id, "Verification code rejected");
            return Err(Error::Auth("Invalid verification code".to_string()));
        }

        let outcome = self.engine.run(account.as_ref(), None).await?;
        let session = read_cache_payload(pending.cache_path()).await;

        self.sessions.remove(session_id);
        tracing::info!(session_id, "Parked login resolved");

        Ok(LoginResponse::Completed { outcome, session })
    }

    /// Convenience wrapper taking a deserialized request
    pub async fn handle_resume(&self, request: &ResumeRequest) -> Result<LoginResponse> {
        self.resume_login(&request.session_id, &request.code).await
    }

    fn fresh_session_id(&self) -> String {
        loop {
            let id = hex::encode(rand::random::<[u8; 16]>());
            if !self.sessions.contains(&id) {
                return id;
            }
        }
    }

    fn purge_expired(&self) {
        let Some(ttl) = self.session_ttl else {
            return;
        };
        let Some(cutoff) = SignedDuration::try_from(ttl)
            .ok()
            .and_then(|ttl| Timestamp::now().checked_sub(ttl).ok())
        else {
            return;
        };

        let purged = self.sessions.purge_created_before(cutoff);
        if purged > 0 {
            tracing::info!(purged, "Evicted expired pending sessions");
        }
    }
}

/// Payload to hand back after a sync; an unreadable cache is reported as none
async fn read_cache_payload(cache_dir: &Path) -> Option<CredentialCachePayload> {
    match extract_cache_payload(cache_dir).await {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!(error = %e, "Credential cache unreadable, returning no session");
            None
        }
    }
}
