use confique::Config;

/// Main configuration for the gateway.
///
/// Loaded once at startup from the environment; immutable afterwards.
#[derive(Debug, Config, Clone)]
pub struct GatewayConfig {
    /// The port the gateway will listen on (default: 8081)
    #[config(env = "GATEWAY_PORT", default = 8081)]
    pub port: u16,

    /// Path to the RSA public key (PEM) used to verify access tokens
    #[config(env = "GATEWAY_PUBLIC_KEY_PATH")]
    pub public_key_path: String,

    /// Optional key id; tokens carrying a different `kid` are rejected
    #[config(env = "GATEWAY_KEY_ID")]
    pub key_id: Option<String>,

    /// Upstream service configuration
    #[config(nested)]
    pub upstream: UpstreamConfig,
}

/// The single protected upstream that authenticated traffic is forwarded to.
#[derive(Debug, Config, Clone)]
pub struct UpstreamConfig {
    /// Upstream host (default: localhost)
    #[config(env = "GATEWAY_UPSTREAM_HOST", default = "localhost")]
    pub host: String,

    /// Upstream port (default: 8080)
    #[config(env = "GATEWAY_UPSTREAM_PORT", default = 8080)]
    pub port: u16,

    /// Per-request client timeout in seconds (default: 30)
    #[config(env = "GATEWAY_UPSTREAM_CLIENT_TIMEOUT", default = 30)]
    pub client_timeout: u64,
}

impl UpstreamConfig {
    /// Returns a properly formatted URL to the upstream service with the given path
    pub fn get_url<S: Into<String>>(&self, path: S) -> String {
        let path = path.into();
        if path.starts_with("/") {
            format!("http://{}:{}{}", self.host, self.port, path)
        } else {
            format!("http://{}:{}/{}", self.host, self.port, path)
        }
    }
}

impl GatewayConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, confique::Error> {
        Self::builder().env().load()
    }
}
