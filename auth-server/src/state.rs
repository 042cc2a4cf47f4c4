use crate::config::AuthServerConfig;
use crate::issuer::TokenIssuer;
use crate::session::SessionStore;
use crate::stores::memory::{InMemoryClients, InMemoryUsers};
use crate::stores::ClientRegistry;
use std::io;
use std::sync::Arc;
use token_core::TokenCodec;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AuthServerConfig>,
    pub issuer: Arc<TokenIssuer>,
    pub sessions: Arc<SessionStore>,
    pub clients: Arc<dyn ClientRegistry>,
}

impl AppState {
    /// Wire up the server from configuration: load the key pair once, seed
    /// the in-memory stores, and construct the issuer. Everything here is
    /// immutable after startup.
    pub fn new(config: AuthServerConfig) -> io::Result<Self> {
        let private_pem = std::fs::read(&config.keys.private_key_path)?;
        let public_pem = std::fs::read(&config.keys.public_key_path)?;
        let codec =
            TokenCodec::from_key_pair(&private_pem, &public_pem, config.keys.key_id.clone())
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;

        let users = match &config.users_file {
            Some(path) => InMemoryUsers::from_json_file(path)?,
            None => InMemoryUsers::default(),
        };
        let clients: Arc<InMemoryClients> = Arc::new(match &config.clients_file {
            Some(path) => InMemoryClients::from_json_file(path)?,
            None => InMemoryClients::default(),
        });

        let issuer = TokenIssuer::new(clients.clone(), Arc::new(users), codec);
        Ok(Self {
            config: Arc::new(config),
            issuer: Arc::new(issuer),
            sessions: Arc::new(SessionStore::new()),
            clients,
        })
    }
}
