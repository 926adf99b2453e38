use std::fmt;

use serde::{Deserialize, Deserializer};

/// Access token issued by the identity provider, together with the metadata
/// returned alongside it. Superseded, never mutated, on refresh.
#[derive(Clone, Default, Deserialize, PartialEq, Eq)]
pub struct TokenRecord {
    pub access_token: String,
    /// UNIX timestamp supplied by the provider
    #[serde(default)]
    pub expires_at: Option<i64>,
    #[serde(default)]
    pub refresh_expires_in: Option<i64>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub token_type: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub scope: String,
    #[serde(default, rename = "not-before-policy")]
    pub not_before_policy: Option<i64>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl TokenRecord {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            ..Default::default()
        }
    }

    pub fn with_expires_at(mut self, expires_at: i64) -> Self {
        self.expires_at = Some(expires_at);
        self
    }
}

// access_token stays out of logs
impl fmt::Debug for TokenRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenRecord")
            .field("access_token", &"***")
            .field("expires_at", &self.expires_at)
            .field("refresh_expires_in", &self.refresh_expires_in)
            .field("token_type", &self.token_type)
            .field("scope", &self.scope)
            .field("not_before_policy", &self.not_before_policy)
            .finish()
    }
}

/// How the token handed out by a resolution was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenUse {
    /// Reused from the cache slot after passing validation.
    Cached,
    /// Freshly minted by the identity provider.
    Refreshed,
}

impl TokenUse {
    pub fn as_str(&self) -> &'static str {
        match *self {
            TokenUse::Cached => "cached",
            TokenUse::Refreshed => "refreshed",
        }
    }
}
