//! Token claims and the access/refresh kind marker.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Whether a token grants resource access or only the right to mint a new
/// access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::Access => f.write_str("access"),
            TokenKind::Refresh => f.write_str("refresh"),
        }
    }
}

/// The facts encoded inside a signed token.
///
/// Claims are immutable once signed; any byte-level change to the encoded
/// payload invalidates the signature. Scopes travel as a single
/// space-delimited string per the OAuth2 wire convention, roles as an array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject: the principal this token represents.
    pub sub: String,
    /// The client the token was issued to.
    pub client_id: String,
    /// Granted scopes, space-delimited.
    pub scope: String,
    /// Roles of the principal at issuance time.
    pub roles: Vec<String>,
    /// Issued-at, unix seconds.
    pub iat: i64,
    /// Expiry, unix seconds. Always strictly greater than `iat`.
    pub exp: i64,
    /// Unique token id, fresh per issuance.
    pub jti: String,
    /// Access or refresh.
    pub kind: TokenKind,
}

impl TokenClaims {
    /// Build claims issued now, expiring after `lifetime_secs`.
    ///
    /// A zero lifetime still yields `exp > iat` by one second so that the
    /// expiry invariant holds; such a token is expired by the time anyone
    /// can present it.
    pub fn new(
        subject: impl Into<String>,
        client_id: impl Into<String>,
        scopes: &[String],
        roles: Vec<String>,
        kind: TokenKind,
        lifetime_secs: u64,
    ) -> Self {
        let now = Utc::now().timestamp();
        Self {
            sub: subject.into(),
            client_id: client_id.into(),
            scope: scopes.join(" "),
            roles,
            iat: now,
            exp: now + (lifetime_secs.max(1) as i64),
            jti: Uuid::new_v4().to_string(),
            kind,
        }
    }

    /// The individual scope names carried by this token.
    pub fn scopes(&self) -> Vec<&str> {
        self.scope.split_whitespace().collect()
    }

    pub fn is_expired_at(&self, now: i64) -> bool {
        self.exp <= now
    }
}
