//! # uauth-sso: Cross-Domain SSO Tokens
//!
//! A token is a short-lived, self-verifying assertion: "the holder of this
//! Ed25519 key, whose identifier is this `userId`, asks to sign in to this
//! domain". A relying origin verifies it with nothing but the token itself.
//!
//! - [`SsoTokenIssuer`] signs the canonical payload and base64-encodes the
//!   envelope.
//! - [`SsoTokenVerifier`] decodes, checks expiry, then checks the signature,
//!   and answers with a [`TokenVerification`] rather than an error.
//!
//! There is no registry or certificate authority behind the key. Binding a
//! `userId` to a known account is the relying party's concern.

pub mod error;
pub mod issuer;
pub mod token;
pub mod verifier;

pub use error::TokenError;
pub use issuer::SsoTokenIssuer;
pub use token::{SsoPayload, SsoToken, TokenDecodeError, TOKEN_TTL};
pub use verifier::{InvalidReason, SsoTokenVerifier, TokenVerification};
