//! Stateless bearer-token authentication for the gateway edge.

use crate::claims::{TokenClaims, TokenKind};
use crate::codec::TokenCodec;
use crate::error::TokenError;

/// The tamper-evident identity assertion produced by verifying an access
/// token. Downstream role/scope policy decisions are made by collaborators;
/// this context only carries the trusted facts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub subject: String,
    pub client_id: String,
    pub scopes: Vec<String>,
    pub roles: Vec<String>,
    pub token_id: String,
}

impl From<TokenClaims> for AuthContext {
    fn from(claims: TokenClaims) -> Self {
        Self {
            scopes: claims.scopes().iter().map(|s| s.to_string()).collect(),
            subject: claims.sub,
            client_id: claims.client_id,
            roles: claims.roles,
            token_id: claims.jti,
        }
    }
}

/// Authenticates inbound requests from their bearer token alone.
///
/// Verification is self-contained: no store lookups, trading instant
/// revocation for a check that needs no round trip.
pub struct AccessTokenVerifier {
    codec: TokenCodec,
}

impl AccessTokenVerifier {
    /// Build a verifier from the public half of the signing key pair.
    pub fn from_public_pem(public_pem: &[u8], key_id: Option<String>) -> Result<Self, TokenError> {
        Ok(Self {
            codec: TokenCodec::verify_only(public_pem, key_id)?,
        })
    }

    /// Build a verifier sharing the authorization server's codec.
    pub fn from_codec(codec: TokenCodec) -> Self {
        Self { codec }
    }

    /// Verify a bearer token, requiring kind=access.
    pub fn authenticate(&self, bearer_token: &str) -> Result<AuthContext, TokenError> {
        let claims = self.codec.verify(bearer_token, TokenKind::Access)?;
        Ok(AuthContext::from(claims))
    }
}
