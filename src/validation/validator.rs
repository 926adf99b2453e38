use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, Validation};
use serde::Deserialize;
use tracing::debug;

use crate::cache::token::TokenRecord;
use crate::errors::ValidationError;
use crate::helpers::time::now_i64;
use crate::keys::key_set::KeySet;
use crate::utils::constants::DEFAULT_SAFETY_MARGIN_SECS;

/// Result of checking a cached token. The validator never fails past this
/// type; every problem ends up as `Invalid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationOutcome {
    Valid,
    Invalid(ValidationError),
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationOutcome::Valid)
    }
}

/// Which checks beyond the signature a cached token must pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ValidationPolicy {
    /// Reject tokens without an `exp` claim or expiring inside the margin.
    pub enforce_expiry: bool,
    /// Tokens this close to expiry are already treated as expired.
    pub safety_margin_seconds: u64,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            enforce_expiry: true,
            safety_margin_seconds: DEFAULT_SAFETY_MARGIN_SECS,
        }
    }
}

impl ValidationPolicy {
    /// Signature checks only.
    pub fn signature_only() -> Self {
        Self {
            enforce_expiry: false,
            safety_margin_seconds: 0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ExpiryClaims {
    #[serde(default)]
    exp: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct TokenValidator {
    policy: ValidationPolicy,
}

impl TokenValidator {
    pub fn new(policy: ValidationPolicy) -> Self {
        Self { policy }
    }

    pub fn validate(&self, token: &TokenRecord, keys: &KeySet) -> ValidationOutcome {
        match self.check(token, keys) {
            Ok(()) => ValidationOutcome::Valid,
            Err(reason) => ValidationOutcome::Invalid(reason),
        }
    }

    fn check(&self, token: &TokenRecord, keys: &KeySet) -> Result<(), ValidationError> {
        let header = decode_header(token.access_token.as_str()).map_err(|e| {
            debug!("token header undecodable: {}", e);
            ValidationError::Malformed
        })?;

        let kid = header.kid.as_deref().ok_or(ValidationError::Signature)?;
        let key = keys.find(kid).ok_or_else(|| {
            debug!(kid = %kid, "no verification key for kid");
            ValidationError::Signature
        })?;
        if !key.accepts(header.alg) {
            debug!(kid = %kid, alg = ?header.alg, "key is pinned to another algorithm");
            return Err(ValidationError::Signature);
        }

        // expiry is checked below against the safety margin
        let mut validation = Validation::new(header.alg);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        let no_claims: &[&str] = &[];
        validation.set_required_spec_claims(no_claims);

        let claims = decode::<ExpiryClaims>(token.access_token.as_str(), &key.key, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidToken
                | ErrorKind::Base64(_)
                | ErrorKind::Json(_)
                | ErrorKind::Utf8(_) => ValidationError::Malformed,
                _ => {
                    debug!("token signature rejected: {}", e);
                    ValidationError::Signature
                }
            })?
            .claims;

        if self.policy.enforce_expiry {
            let exp = claims.exp.ok_or(ValidationError::Expired)?;
            self.check_not_expiring(exp)?;
            if let Some(expires_at) = token.expires_at {
                self.check_not_expiring(expires_at)?;
            }
        }
        Ok(())
    }

    fn check_not_expiring(&self, expires_at: i64) -> Result<(), ValidationError> {
        let margin = i64::try_from(self.policy.safety_margin_seconds).unwrap_or(i64::MAX);
        let usable_until = expires_at.saturating_sub(margin);
        if usable_until <= now_i64() {
            debug!(expires_at, "token expired or inside safety margin");
            return Err(ValidationError::Expired);
        }
        Ok(())
    }
}

/// Check `token` against `keys` with the default policy.
pub fn validate(token: &TokenRecord, keys: &KeySet) -> ValidationOutcome {
    TokenValidator::default().validate(token, keys)
}
