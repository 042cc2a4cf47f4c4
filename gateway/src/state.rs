use crate::config::GatewayConfig;
use reqwest::Client;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use token_core::AccessTokenVerifier;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub verifier: Arc<AccessTokenVerifier>,
    pub upstream_client: Arc<Client>,
}

impl AppState {
    /// Wire up the gateway from configuration. The verifier holds only the
    /// public half of the key pair; this process can never mint tokens.
    pub fn new(config: GatewayConfig) -> io::Result<Self> {
        let public_pem = std::fs::read(&config.public_key_path)?;
        let verifier = AccessTokenVerifier::from_public_pem(&public_pem, config.key_id.clone())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;
        Ok(Self::with_verifier(config, verifier))
    }

    pub fn with_verifier(config: GatewayConfig, verifier: AccessTokenVerifier) -> Self {
        let upstream_client = Self::create_upstream_client(config.upstream.client_timeout);
        Self {
            config: Arc::new(config),
            verifier: Arc::new(verifier),
            upstream_client: Arc::new(upstream_client),
        }
    }

    fn create_upstream_client(timeout: u64) -> Client {
        // Create a specialized client for the upstream with appropriate configurations
        Client::builder()
            // Set reasonable timeouts
            .timeout(Duration::from_secs(timeout))
            .connect_timeout(Duration::from_secs(2)) // 2 seconds timeout for connections
            // Configure connection pool
            .pool_max_idle_per_host(10) // Keep up to 10 idle connections per host
            .pool_idle_timeout(Some(Duration::from_secs(90))) // Keep idle connections for 90 seconds
            // Build the client
            .build()
            .expect("Failed to create upstream client")
    }
}
