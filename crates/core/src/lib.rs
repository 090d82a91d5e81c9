//! photosync-core: Core library for photosync
//!
//! This crate provides:
//! - Destination key derivation and dedup baseline listing
//! - Item content retrieval across the shapes a photo account returns
//! - The sync engine that uploads new photos and tolerates per-item failures
//! - The two-leg login flow for accounts protected by a verification code
//! - Configuration management
//!
//! Remote accounts and object storage are reached only through the traits in
//! [`account`] and [`traits`], so the crate does not depend on any SDK.

pub mod account;
pub mod auth;
pub mod config;
pub mod error;
pub mod fetch;
pub mod key;
pub mod listing;
pub mod session;
pub mod sync;
pub mod traits;

#[cfg(test)]
mod testing;

pub use account::{
    AccountConnector, AccountSession, FetchOutput, FetchTarget, ItemAttribute, SourceItem,
};
pub use auth::{AuthSessionManager, LoginRequest, LoginResponse, ResumeRequest};
pub use config::{Config, ConfigManager};
pub use error::{Error, Result};
pub use fetch::fetch_item_bytes;
pub use key::{KeyBuilder, resolve_filename, resolve_identifier};
pub use listing::list_existing_keys;
pub use session::{
    CredentialCachePayload, InMemorySessionStore, PendingAuthSession, SessionStore,
};
pub use sync::{SyncEngine, SyncOutcome};
pub use traits::{ListOptions, ListResult, ObjectStore};
