//! Signing and verification of bearer tokens (RS256 JWT).

use crate::claims::{TokenClaims, TokenKind};
use crate::error::TokenError;
use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{
    decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use log::debug;

const ALGORITHM: Algorithm = Algorithm::RS256;

/// Encodes and decodes signed tokens.
///
/// Key material is immutable process-wide configuration: the authorization
/// server constructs the codec from the full key pair, the gateway from the
/// public key alone (it must never hold signing secrets). A single key pair
/// is active at a time; the JWT `kid` header is emitted and checked as a
/// hint so that a future multi-key deployment stays wire compatible.
pub struct TokenCodec {
    encoding: Option<EncodingKey>,
    decoding: DecodingKey,
    key_id: Option<String>,
}

// Manual impl: the jsonwebtoken key types are not `Debug`, and key material
// must not be printed anyway.
impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("can_sign", &self.encoding.is_some())
            .field("key_id", &self.key_id)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    /// Build a codec that can both sign and verify.
    pub fn from_key_pair(
        private_pem: &[u8],
        public_pem: &[u8],
        key_id: Option<String>,
    ) -> Result<Self, TokenError> {
        let encoding = EncodingKey::from_rsa_pem(private_pem)
            .map_err(|e| TokenError::InvalidKey(format!("private key: {e}")))?;
        let decoding = DecodingKey::from_rsa_pem(public_pem)
            .map_err(|e| TokenError::InvalidKey(format!("public key: {e}")))?;
        Ok(Self {
            encoding: Some(encoding),
            decoding,
            key_id,
        })
    }

    /// Build a verify-only codec from the public key.
    pub fn verify_only(public_pem: &[u8], key_id: Option<String>) -> Result<Self, TokenError> {
        let decoding = DecodingKey::from_rsa_pem(public_pem)
            .map_err(|e| TokenError::InvalidKey(format!("public key: {e}")))?;
        Ok(Self {
            encoding: None,
            decoding,
            key_id,
        })
    }

    /// Canonicalize and sign the claims, producing the opaque bearer string.
    pub fn sign(&self, claims: &TokenClaims) -> Result<String, TokenError> {
        let encoding = self
            .encoding
            .as_ref()
            .ok_or_else(|| TokenError::Signing("codec holds no signing key".to_string()))?;
        let mut header = Header::new(ALGORITHM);
        header.kid = self.key_id.clone();
        encode(&header, claims, encoding).map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verify a token, requiring the given kind.
    ///
    /// Checks run in order: structural validity, signature, expiry, kind.
    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<TokenClaims, TokenError> {
        self.verify_at(token, expected, Utc::now().timestamp())
    }

    fn verify_at(
        &self,
        token: &str,
        expected: TokenKind,
        now: i64,
    ) -> Result<TokenClaims, TokenError> {
        let header = decode_header(token).map_err(|e| {
            debug!("rejecting structurally invalid token: {e}");
            TokenError::Malformed
        })?;
        if header.alg != ALGORITHM {
            return Err(TokenError::Malformed);
        }
        // A `kid` hint must match the active key when present. Tokens
        // without a hint verify against the active key unconditionally.
        if let Some(kid) = header.kid {
            if self.key_id.as_deref() != Some(kid.as_str()) {
                return Err(TokenError::UnknownKeyId(kid));
            }
        }

        // Expiry is checked manually below so that a bad signature is always
        // reported before expiry, keeping the check order deterministic.
        let mut validation = Validation::new(ALGORITHM);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let data = decode::<TokenClaims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidSignature => TokenError::BadSignature,
                _ => TokenError::Malformed,
            }
        })?;
        let claims = data.claims;

        if claims.is_expired_at(now) {
            return Err(TokenError::Expired);
        }
        if claims.kind != expected {
            return Err(TokenError::WrongKind {
                expected,
                found: claims.kind,
            });
        }
        Ok(claims)
    }
}
