use crate::claims::TokenKind;
use thiserror::Error;

/// Errors from signing or verifying tokens.
///
/// Verification checks run in a fixed order (structure, signature, expiry,
/// kind) and short-circuit at the first failure, so exactly one of these is
/// ever reported for a given token. `Malformed`, `BadSignature` and
/// `UnknownKeyId` are all presented externally as a generic invalid-token
/// failure; the distinction exists for logs and tests only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("token is structurally invalid")]
    Malformed,
    #[error("token signature does not verify against the configured key")]
    BadSignature,
    #[error("token was signed with unknown key id `{0}`")]
    UnknownKeyId(String),
    #[error("token has expired")]
    Expired,
    #[error("expected a {expected} token but got a {found} token")]
    WrongKind {
        expected: TokenKind,
        found: TokenKind,
    },
    #[error("invalid key material: {0}")]
    InvalidKey(String),
    #[error("token signing failed: {0}")]
    Signing(String),
}

impl TokenError {
    /// Whether this failure is in the externally visible "invalid token"
    /// group (as opposed to expiry or kind mismatch).
    pub fn is_invalid_token(&self) -> bool {
        matches!(
            self,
            TokenError::Malformed | TokenError::BadSignature | TokenError::UnknownKeyId(_)
        )
    }
}
