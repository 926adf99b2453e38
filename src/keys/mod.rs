//! Verification keys for cached access tokens.

pub mod key_set;
pub mod provider;

pub use key_set::{KeySet, VerificationKey};
pub use provider::{KeySetProvider, KeySource};

/// JWK set published by the Red Hat SSO realms the handler talks to.
pub const EMBEDDED_JWKS: &str = include_str!("embedded_jwks.json");
