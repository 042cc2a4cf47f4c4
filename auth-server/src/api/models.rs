//! Request/response models for the OAuth2 endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Form parameters accepted by the token endpoint (RFC 6749 Section 4.3/6).
#[derive(Debug, Deserialize, ToSchema)]
pub struct TokenRequestForm {
    /// "password" or "refresh_token"
    pub grant_type: Option<String>,
    /// Client identifier; may instead arrive via HTTP Basic
    pub client_id: Option<String>,
    /// Client secret; may instead arrive via HTTP Basic
    pub client_secret: Option<String>,
    /// Resource-owner username (password grant)
    pub username: Option<String>,
    /// Resource-owner password (password grant)
    pub password: Option<String>,
    /// Previously issued refresh token (refresh_token grant)
    pub refresh_token: Option<String>,
    /// Requested scopes, space-delimited
    pub scope: Option<String>,
}

/// Successful grant response (RFC 6749 Section 5.1).
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    /// The signed access token
    pub access_token: String,
    /// The signed refresh token
    pub refresh_token: String,
    /// Always "bearer"
    pub token_type: String,
    /// Access-token lifetime in seconds
    pub expires_in: u64,
    /// Granted scopes, space-delimited
    pub scope: String,
}

/// Structured error body (RFC 6749 Section 5.2), documentation model.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Error code, e.g. "invalid_grant"
    pub error: String,
    /// Human-readable detail, when safe to disclose
    pub error_description: Option<String>,
}

/// Browser login form fields.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Query parameters of the authorization endpoint.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AuthorizeParams {
    /// Must be "code"
    pub response_type: Option<String>,
    pub client_id: Option<String>,
    /// Target the browser is sent back to
    pub redirect_uri: Option<String>,
    /// Requested scopes, space-delimited
    pub scope: Option<String>,
    /// Opaque client state echoed back on the redirect
    pub state: Option<String>,
}
