//! Grant validation and token-pair issuance.

use crate::stores::{Client, ClientRegistry, CredentialStore, GrantType, Principal, StoreError};
use log::{debug, info, warn};
use std::sync::Arc;
use thiserror::Error;
use token_core::{TokenClaims, TokenCodec, TokenError, TokenKind};

/// A parsed grant request, created per HTTP request and discarded after
/// processing. Exactly one of the credential fields is meaningful per grant
/// type; the handler enforces presence before constructing this.
#[derive(Debug)]
pub struct GrantRequest {
    pub grant_type: GrantType,
    pub client_id: String,
    pub client_secret: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub refresh_token: Option<String>,
    /// Requested scopes; empty means "grant the client's full allowed set".
    pub scopes: Vec<String>,
}

/// Why a grant was refused. The HTTP boundary collapses the user-facing
/// detail (see `crate::errors`); these kinds exist for logs and tests.
#[derive(Debug, Error)]
pub enum GrantError {
    #[error("unknown client or bad client secret")]
    InvalidClient,
    #[error("grant type not allowed for this client")]
    UnauthorizedGrant,
    #[error("unknown, disabled, locked or expired user")]
    InvalidUser,
    #[error("password verification failed")]
    InvalidCredentials,
    #[error("requested scope exceeds the client's allowed set")]
    InvalidScope,
    #[error("refresh token rejected: {0}")]
    InvalidToken(#[source] TokenError),
    #[error("missing {0} parameter")]
    MissingParameter(&'static str),
    #[error(transparent)]
    Upstream(#[from] StoreError),
    #[error("token issuance failed: {0}")]
    Internal(String),
}

/// A successfully issued access/refresh pair. Construction is atomic: a
/// failure signing either token yields an error and no tokens at all.
#[derive(Debug)]
pub struct IssuedTokens {
    pub access_token: String,
    pub refresh_token: String,
    /// Access-token lifetime in seconds, echoed to the client.
    pub expires_in: u64,
    /// Granted scopes, space-delimited.
    pub scope: String,
}

/// Orchestrates grant validation and produces signed token pairs.
///
/// Holds only immutable, read-mostly collaborators, so concurrent grant
/// requests need no synchronization. Issued tokens are not recorded
/// anywhere: there is deliberately no revocation list. A deployment that
/// needs revocation must bolt on an external store keyed by `jti` with
/// atomic check-and-insert semantics.
pub struct TokenIssuer {
    clients: Arc<dyn ClientRegistry>,
    users: Arc<dyn CredentialStore>,
    codec: TokenCodec,
}

impl TokenIssuer {
    pub fn new(
        clients: Arc<dyn ClientRegistry>,
        users: Arc<dyn CredentialStore>,
        codec: TokenCodec,
    ) -> Self {
        Self {
            clients,
            users,
            codec,
        }
    }

    /// Validate the grant and issue an access/refresh token pair.
    pub async fn issue(&self, request: &GrantRequest) -> Result<IssuedTokens, GrantError> {
        let client = self.authenticate_client(&request.client_id, &request.client_secret).await?;

        if !client.grant_types.contains(&request.grant_type) {
            warn!(
                "client `{}` attempted disallowed grant type {:?}",
                client.client_id, request.grant_type
            );
            return Err(GrantError::UnauthorizedGrant);
        }

        let principal = match request.grant_type {
            GrantType::Password => {
                let username = request
                    .username
                    .as_deref()
                    .ok_or(GrantError::MissingParameter("username"))?;
                let password = request
                    .password
                    .as_deref()
                    .ok_or(GrantError::MissingParameter("password"))?;
                self.authenticate_principal(username, password).await?
            }
            GrantType::RefreshToken => {
                let refresh = request
                    .refresh_token
                    .as_deref()
                    .ok_or(GrantError::MissingParameter("refresh_token"))?;
                let claims = self
                    .codec
                    .verify(refresh, TokenKind::Refresh)
                    .map_err(GrantError::InvalidToken)?;
                // Refresh tokens are bound to the client they were issued to.
                if claims.client_id != client.client_id {
                    return Err(GrantError::InvalidToken(TokenError::BadSignature));
                }
                self.resolve_principal(&claims.sub).await?
            }
        };

        let scopes = granted_scopes(&client, &request.scopes)?;
        let pair = self.sign_pair(&principal, &client, &scopes)?;
        info!(
            "issued token pair for `{}` via client `{}` (scopes: {})",
            principal.username, client.client_id, pair.scope
        );
        Ok(pair)
    }

    /// Resolve the client and check its secret. Secret comparison goes
    /// through bcrypt verification, which is constant-time with respect to
    /// the presented secret.
    async fn authenticate_client(
        &self,
        client_id: &str,
        client_secret: &str,
    ) -> Result<Client, GrantError> {
        let client = self
            .clients
            .find_by_client_id(client_id)
            .await?
            .ok_or(GrantError::InvalidClient)?;
        let matches =
            bcrypt::verify(client_secret, &client.secret_hash).unwrap_or_else(|e| {
                warn!("client `{client_id}` has an unverifiable secret hash: {e}");
                false
            });
        if !matches {
            return Err(GrantError::InvalidClient);
        }
        Ok(client)
    }

    /// Resolve a principal and verify the presented password. Shared by the
    /// password grant and the form-login path.
    pub async fn authenticate_principal(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Principal, GrantError> {
        let principal = self.resolve_principal(username).await?;
        let matches = bcrypt::verify(password, &principal.password_hash).unwrap_or_else(|e| {
            warn!("user `{username}` has an unverifiable password hash: {e}");
            false
        });
        if !matches {
            debug!("password mismatch for user `{username}`");
            return Err(GrantError::InvalidCredentials);
        }
        Ok(principal)
    }

    async fn resolve_principal(&self, username: &str) -> Result<Principal, GrantError> {
        let principal = self
            .users
            .find_by_username(username)
            .await?
            .ok_or(GrantError::InvalidUser)?;
        if !principal.is_usable() {
            debug!("user `{username}` is disabled, locked or expired");
            return Err(GrantError::InvalidUser);
        }
        Ok(principal)
    }

    fn sign_pair(
        &self,
        principal: &Principal,
        client: &Client,
        scopes: &[String],
    ) -> Result<IssuedTokens, GrantError> {
        let access = TokenClaims::new(
            &principal.username,
            &client.client_id,
            scopes,
            principal.roles.clone(),
            TokenKind::Access,
            client.access_token_lifetime,
        );
        let refresh = TokenClaims::new(
            &principal.username,
            &client.client_id,
            scopes,
            principal.roles.clone(),
            TokenKind::Refresh,
            client.refresh_token_lifetime,
        );
        // Sign both before returning either, so a failure cannot leave the
        // caller with half a pair.
        let access_token = self
            .codec
            .sign(&access)
            .map_err(|e| GrantError::Internal(e.to_string()))?;
        let refresh_token = self
            .codec
            .sign(&refresh)
            .map_err(|e| GrantError::Internal(e.to_string()))?;
        Ok(IssuedTokens {
            access_token,
            refresh_token,
            expires_in: client.access_token_lifetime,
            scope: access.scope,
        })
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }
}

/// Intersect requested scopes with the client's allowed set. Any disallowed
/// scope rejects the whole request; an empty request grants the full set.
fn granted_scopes(client: &Client, requested: &[String]) -> Result<Vec<String>, GrantError> {
    if requested.is_empty() {
        let mut all: Vec<String> = client.scopes.iter().cloned().collect();
        all.sort();
        return Ok(all);
    }
    for scope in requested {
        if !client.scopes.contains(scope) {
            return Err(GrantError::InvalidScope);
        }
    }
    Ok(requested.to_vec())
}
