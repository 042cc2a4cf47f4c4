//! Shared token model for the authorization server and the gateway.
//!
//! Both services are deployed independently and never share process memory;
//! the signed-token wire format defined here is the only contract between
//! them. The authorization server signs claims with the private half of a
//! single RSA key pair, the gateway verifies with the public half.

pub mod claims;
pub mod codec;
pub mod error;
pub mod verifier;

pub use claims::{TokenClaims, TokenKind};
pub use codec::TokenCodec;
pub use error::TokenError;
pub use verifier::{AccessTokenVerifier, AuthContext};
