use confique::Config;

/// Main configuration for the authorization server.
///
/// Loaded once at startup from the environment; immutable afterwards.
#[derive(Debug, Config, Clone)]
pub struct AuthServerConfig {
    /// The port the authorization server will listen on (default: 9999)
    #[config(env = "AUTH_PORT", default = 9999)]
    pub port: u16,

    /// Signing/verification key pair configuration
    #[config(nested)]
    pub keys: KeyPairConfig,

    /// Optional path to a JSON file seeding the in-memory credential store
    #[config(env = "AUTH_USERS_FILE")]
    pub users_file: Option<String>,

    /// Optional path to a JSON file seeding the in-memory client registry
    #[config(env = "AUTH_CLIENTS_FILE")]
    pub clients_file: Option<String>,
}

/// Key material for the token codec. A single active key pair; no rotation.
#[derive(Debug, Config, Clone)]
pub struct KeyPairConfig {
    /// Path to the RSA private key (PEM) used to sign tokens
    #[config(env = "AUTH_KEYS_PRIVATE_KEY_PATH")]
    pub private_key_path: String,

    /// Path to the RSA public key (PEM) used to verify tokens
    #[config(env = "AUTH_KEYS_PUBLIC_KEY_PATH")]
    pub public_key_path: String,

    /// Optional key id emitted in the JWT `kid` header
    #[config(env = "AUTH_KEYS_KEY_ID")]
    pub key_id: Option<String>,
}

impl AuthServerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, confique::Error> {
        Self::builder().env().load()
    }
}
