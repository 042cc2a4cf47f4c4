//! In-memory store implementations for wiring and tests.
//!
//! The production deployment supplies database-backed implementations of the
//! store traits; these maps exist so the server runs standalone and so tests
//! never need a database. Both are read-only after construction.

use super::{Client, ClientRegistry, CredentialStore, Principal, StoreError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;

#[derive(Default)]
pub struct InMemoryUsers {
    users: HashMap<String, Principal>,
}

impl InMemoryUsers {
    pub fn new(users: Vec<Principal>) -> Self {
        Self {
            users: users
                .into_iter()
                .map(|u| (u.username.clone(), u))
                .collect(),
        }
    }

    /// Seed the store from a JSON array of principals.
    pub fn from_json_file(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let raw = std::fs::read(path)?;
        let users: Vec<Principal> = serde_json::from_slice(&raw)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        Ok(Self::new(users))
    }
}

#[async_trait]
impl CredentialStore for InMemoryUsers {
    async fn find_by_username(&self, username: &str) -> Result<Option<Principal>, StoreError> {
        Ok(self.users.get(username).cloned())
    }
}

#[derive(Default)]
pub struct InMemoryClients {
    clients: HashMap<String, Client>,
}

impl InMemoryClients {
    pub fn new(clients: Vec<Client>) -> Self {
        Self {
            clients: clients
                .into_iter()
                .map(|c| (c.client_id.clone(), c))
                .collect(),
        }
    }

    /// Seed the registry from a JSON array of clients.
    pub fn from_json_file(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let raw = std::fs::read(path)?;
        let clients: Vec<Client> = serde_json::from_slice(&raw)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        Ok(Self::new(clients))
    }
}

#[async_trait]
impl ClientRegistry for InMemoryClients {
    async fn find_by_client_id(&self, client_id: &str) -> Result<Option<Client>, StoreError> {
        Ok(self.clients.get(client_id).cloned())
    }
}

/// A store that is always unreachable, for exercising outage handling.
#[cfg(test)]
pub struct UnavailableStore;

#[cfg(test)]
#[async_trait]
impl CredentialStore for UnavailableStore {
    async fn find_by_username(&self, _username: &str) -> Result<Option<Principal>, StoreError> {
        Err(StoreError::Unavailable("credential store offline".to_string()))
    }
}

#[cfg(test)]
#[async_trait]
impl ClientRegistry for UnavailableStore {
    async fn find_by_client_id(&self, _client_id: &str) -> Result<Option<Client>, StoreError> {
        Err(StoreError::Unavailable("client registry offline".to_string()))
    }
}
