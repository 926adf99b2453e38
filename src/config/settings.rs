use serde::Deserialize;

use crate::keys::provider::KeySource;
use crate::utils::constants::{DEFAULT_EVENT_SOURCE, DEFAULT_EVENT_TYPE, DEFAULT_HTTP_TIMEOUT_MS};
use crate::validation::validator::ValidationPolicy;

/// ================================
/// Optional settings file
/// ================================
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct SettingsConfig {
    pub logging: Option<LoggingConfig>,
    pub http: HttpConfig,
    /// cached token validation
    pub token: ValidationPolicy,
    pub keys: KeySource,
    pub envelope: EnvelopeConfig,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct HttpConfig {
    /// applies to the token request and the delivery, each
    pub timeout_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_ms: DEFAULT_HTTP_TIMEOUT_MS }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct EnvelopeConfig {
    pub source: String,
    #[serde(rename = "type")]
    pub event_type: String,
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            source: DEFAULT_EVENT_SOURCE.to_owned(),
            event_type: DEFAULT_EVENT_TYPE.to_owned(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct MetricsConfig {
    /// node-exporter textfile collector target
    pub textfile: Option<String>,
}

/// ================================
/// Logging
/// ================================
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: String, // allowed: trace, debug, info, warn, error
    #[serde(default)]
    pub format: LogFormat,
}

impl LoggingConfig {
    pub fn new (level: String, format: LogFormat) -> Self {
        Self { level, format }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self::new("info".to_owned(), LogFormat::Compact)
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    #[default]
    Compact,
}
