//! Narrow interfaces to the external credential and client stores.
//!
//! The core never caches principals or clients; each request reads a fresh
//! snapshot so staleness is the collaborator's concern, not ours. An
//! unreachable store is a distinct failure from a missing record so that
//! operators can tell outages from bad credentials.

pub mod memory;

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashSet;
use thiserror::Error;

/// The grant workflows a client may use at the token endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
    Password,
    RefreshToken,
}

impl GrantType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "password" => Some(GrantType::Password),
            "refresh_token" => Some(GrantType::RefreshToken),
            _ => None,
        }
    }
}

/// Immutable snapshot of a user, read per authentication attempt.
#[derive(Debug, Clone, Deserialize)]
pub struct Principal {
    pub username: String,
    /// Bcrypt hash; plaintext never reaches this type.
    pub password_hash: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub expired: bool,
}

impl Principal {
    /// A principal that is disabled, locked or expired must never
    /// authenticate, regardless of the password presented.
    pub fn is_usable(&self) -> bool {
        self.enabled && !self.locked && !self.expired
    }
}

/// Registered OAuth2 client, read per grant request.
#[derive(Debug, Clone, Deserialize)]
pub struct Client {
    pub client_id: String,
    /// Bcrypt hash of the client secret.
    pub secret_hash: String,
    pub grant_types: HashSet<GrantType>,
    pub scopes: HashSet<String>,
    /// Access-token lifetime in seconds.
    pub access_token_lifetime: u64,
    /// Refresh-token lifetime in seconds.
    pub refresh_token_lifetime: u64,
}

fn default_true() -> bool {
    true
}

/// Failure talking to an external store.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<Principal>, StoreError>;
}

#[async_trait]
pub trait ClientRegistry: Send + Sync {
    async fn find_by_client_id(&self, client_id: &str) -> Result<Option<Client>, StoreError>;
}
