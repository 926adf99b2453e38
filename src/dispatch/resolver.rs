use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use crate::cache::token::TokenUse;
use crate::cache::token_cache::TokenCache;
use crate::errors::AcquireError;
use crate::keys::key_set::KeySet;
use crate::observability::metrics::get_metrics;
use crate::sources::{AcquireToken, ClientCredentialsAcquirer};
use crate::validation::{TokenValidator, ValidationOutcome};

/// Token handed out by one resolution.
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedToken {
    pub access_token: String,
    /// `None` when authentication is disabled.
    pub usage: Option<TokenUse>,
}

impl ResolvedToken {
    fn disabled() -> Self {
        Self {
            access_token: String::new(),
            usage: None,
        }
    }

    fn used(access_token: String, usage: TokenUse) -> Self {
        Self {
            access_token,
            usage: Some(usage),
        }
    }

    pub fn is_refreshed(&self) -> bool {
        self.usage == Some(TokenUse::Refreshed)
    }
}

impl fmt::Debug for ResolvedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedToken")
            .field("access_token", &"***")
            .field("usage", &self.usage)
            .finish()
    }
}

enum Mode<A> {
    Disabled,
    Enabled {
        acquirer: A,
        keys: Arc<KeySet>,
        cache: Arc<TokenCache>,
    },
}

/// Picks the bearer token for a delivery: the cached one while it validates,
/// otherwise a fresh one from the acquirer.
pub struct TokenResolver<A = ClientCredentialsAcquirer> {
    mode: Mode<A>,
    validator: TokenValidator,
}

impl<A> TokenResolver<A> {
    pub fn disabled() -> Self {
        Self {
            mode: Mode::Disabled,
            validator: TokenValidator::default(),
        }
    }

    pub fn enabled(
        acquirer: A,
        keys: Arc<KeySet>,
        cache: Arc<TokenCache>,
        validator: TokenValidator,
    ) -> Self {
        Self {
            mode: Mode::Enabled {
                acquirer,
                keys,
                cache,
            },
            validator,
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self.mode, Mode::Enabled { .. })
    }

    pub fn acquirer(&self) -> Option<&A> {
        match &self.mode {
            Mode::Enabled { acquirer, .. } => Some(acquirer),
            Mode::Disabled => None,
        }
    }
}

impl<A: AcquireToken + Sync> TokenResolver<A> {
    /// Resolve one token.
    ///
    /// The cache stays locked from the first read until the slot has been
    /// rewritten, so concurrent callers never refresh the same stale token
    /// twice.
    pub async fn resolve_token(&self) -> Result<ResolvedToken, AcquireError> {
        let (acquirer, keys, cache) = match &self.mode {
            Mode::Disabled => return Ok(ResolvedToken::disabled()),
            Mode::Enabled {
                acquirer,
                keys,
                cache,
            } => (acquirer, keys, cache),
        };

        let metrics = get_metrics().await;
        let mut slot = cache.lock().await;

        match slot.get() {
            Some(record) => match self.validator.validate(&record, keys) {
                ValidationOutcome::Valid => {
                    debug!("using cached token");
                    metrics.token_cache_hits.inc();
                    slot.mark_used(TokenUse::Cached);
                    return Ok(ResolvedToken::used(record.access_token, TokenUse::Cached));
                }
                ValidationOutcome::Invalid(reason) => {
                    info!(%reason, "cached token rejected, requesting a new one");
                    metrics
                        .token_validation_failures
                        .with_label_values(&[reason.to_string().as_str()])
                        .inc();
                }
            },
            None => debug!("token cache empty"),
        }

        let record = acquirer.acquire().await?;
        let access_token = record.access_token.clone();
        slot.put(record);
        slot.mark_used(TokenUse::Refreshed);
        Ok(ResolvedToken::used(access_token, TokenUse::Refreshed))
    }
}
