use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tokio::sync::OnceCell;
use tracing::info;

use crate::errors::KeySetParseError;
use crate::keys::key_set::KeySet;
use crate::keys::EMBEDDED_JWKS;
use crate::utils::constants::DEFAULT_HTTP_TIMEOUT_MS;

/// Where the verification keys come from.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum KeySource {
    /// Key set compiled into the binary.
    #[default]
    Embedded,
    /// JWK set document on disk.
    File { path: String },
    /// JWK set document served over HTTP(S), fetched once per process.
    Url { url: String },
}

/// Loads the key set from its source at most once per process.
#[derive(Debug)]
pub struct KeySetProvider {
    source: KeySource,
    timeout: Duration,
    keys: OnceCell<Arc<KeySet>>,
}

impl KeySetProvider {
    pub fn new(source: KeySource, timeout: Duration) -> Self {
        Self {
            source,
            timeout,
            keys: OnceCell::new(),
        }
    }

    pub fn embedded() -> Self {
        Self::new(
            KeySource::Embedded,
            Duration::from_millis(DEFAULT_HTTP_TIMEOUT_MS),
        )
    }

    /// Return the key set, parsing the key material on first use.
    ///
    /// A failed load is not memoized, but callers treat it as fatal.
    pub async fn load(&self) -> Result<Arc<KeySet>, KeySetParseError> {
        self.keys
            .get_or_try_init(|| async {
                let raw = self.read_source().await?;
                let keys = KeySet::from_json(&raw)?;
                info!(keys = keys.len(), "verification key set loaded");
                Ok(Arc::new(keys))
            })
            .await
            .cloned()
    }

    async fn read_source(&self) -> Result<String, KeySetParseError> {
        match &self.source {
            KeySource::Embedded => Ok(EMBEDDED_JWKS.to_owned()),
            KeySource::File { path } => {
                tokio::fs::read_to_string(path)
                    .await
                    .map_err(|source| KeySetParseError::Io {
                        path: path.to_owned(),
                        source,
                    })
            }
            KeySource::Url { url } => fetch_key_set(url, self.timeout).await,
        }
    }
}

async fn fetch_key_set(url: &str, timeout: Duration) -> Result<String, KeySetParseError> {
    let client = Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| KeySetParseError::Fetch(e.to_string()))?;

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| KeySetParseError::Fetch(e.to_string()))?;
    if !response.status().is_success() {
        return Err(KeySetParseError::Fetch(format!(
            "key set endpoint answered with status {}",
            response.status()
        )));
    }
    response
        .text()
        .await
        .map_err(|e| KeySetParseError::Fetch(e.to_string()))
}
