use std::fmt;

use jsonwebtoken::jwk::{Jwk, JwkSet, PublicKeyUse};
use jsonwebtoken::{Algorithm, DecodingKey};
use tracing::{debug, warn};

use crate::errors::KeySetParseError;

/// A single verification key taken from a JWK set.
#[derive(Clone)]
pub struct VerificationKey {
    pub kid: String,
    /// Algorithm the key is pinned to by its `alg` member, if any.
    pub algorithm: Option<String>,
    pub key: DecodingKey,
}

impl VerificationKey {
    /// Whether a token signed with `alg` may be checked against this key.
    pub fn accepts(&self, alg: Algorithm) -> bool {
        self.algorithm
            .as_deref()
            .map(|pinned| pinned == format!("{:?}", alg))
            .unwrap_or(true)
    }
}

impl fmt::Debug for VerificationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerificationKey")
            .field("kid", &self.kid)
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

/// Ordered, read-only collection of verification keys indexed by `kid`.
#[derive(Debug, Clone)]
pub struct KeySet {
    keys: Vec<VerificationKey>,
}

impl KeySet {
    /// Parse a JWK set document.
    ///
    /// Keys without a `kid` and keys published for encryption are skipped;
    /// any other key that cannot be turned into a decoding key fails the
    /// whole set.
    pub fn from_json(raw: &str) -> Result<Self, KeySetParseError> {
        let jwk_set: JwkSet = serde_json::from_str(raw)?;
        let mut keys = Vec::with_capacity(jwk_set.keys.len());

        for jwk in &jwk_set.keys {
            let Some(kid) = jwk.common.key_id.clone() else {
                warn!("skipping key without kid");
                continue;
            };
            if matches!(jwk.common.public_key_use, Some(PublicKeyUse::Encryption)) {
                debug!(kid = %kid, "skipping encryption key");
                continue;
            }
            keys.push(to_verification_key(kid, jwk)?);
        }

        if keys.is_empty() {
            return Err(KeySetParseError::Empty);
        }
        debug!(
            "key set loaded: {:?}",
            keys.iter().map(|k| k.kid.as_str()).collect::<Vec<&str>>()
        );
        Ok(Self { keys })
    }

    pub fn find(&self, kid: &str) -> Option<&VerificationKey> {
        self.keys.iter().find(|k| k.kid == kid)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn kids(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(|k| k.kid.as_str())
    }
}

fn to_verification_key(kid: String, jwk: &Jwk) -> Result<VerificationKey, KeySetParseError> {
    let key = DecodingKey::from_jwk(jwk).map_err(|e| KeySetParseError::InvalidKey {
        kid: kid.clone(),
        detail: e.to_string(),
    })?;
    let algorithm = jwk.common.key_algorithm.as_ref().map(|alg| format!("{:?}", alg));
    Ok(VerificationKey {
        kid,
        algorithm,
        key,
    })
}
