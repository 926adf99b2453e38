use thiserror::Error;

/// Handler configuration could not be resolved.
///
/// Raised before any network activity takes place.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("--{option} or {env} environment variable is required")]
    MissingRequired {
        option: &'static str,
        env: &'static str,
    },

    #[error("invalid value '{value}' for {option}: {reason}")]
    InvalidValue {
        option: &'static str,
        value: String,
        reason: String,
    },

    #[error("failed to read settings file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings file: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Key material could not be turned into a usable key set.
#[derive(Debug, Error)]
pub enum KeySetParseError {
    #[error("key set is not a valid JWK set: {0}")]
    Json(#[from] serde_json::Error),

    #[error("key '{kid}' is unusable: {detail}")]
    InvalidKey { kid: String, detail: String },

    #[error("key set contains no signing keys")]
    Empty,

    #[error("failed to read key set from '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to fetch key set: {0}")]
    Fetch(String),
}

/// Reason a cached token was rejected. Never surfaced to callers of the
/// dispatcher; it only selects the refresh path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("malformed")]
    Malformed,
    #[error("signature")]
    Signature,
    #[error("expired")]
    Expired,
}

/// Client-credentials exchange with the identity provider failed.
#[derive(Debug, Error)]
pub enum AcquireError {
    #[error("token request transport failure: {0}")]
    Transport(String),

    #[error("identity provider rejected the token request with status {status}")]
    Rejected { status: u16 },

    #[error("failed to decode token response: {0}")]
    Decode(String),
}

/// The final POST to the ingestion endpoint failed.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("failed to encode event envelope: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("delivery transport failure: {0}")]
    Transport(String),

    #[error("ingestion endpoint answered with status {status}")]
    Status { status: u16 },
}

/// One event could not be dispatched.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("failed to get token from sso: {0}")]
    Token(#[from] AcquireError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

/// The metrics textfile could not be written.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("failed to write metrics textfile '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// The monitoring event input could not be read.
#[derive(Debug, Error)]
pub enum EventError {
    #[error("failed to read event: {0}")]
    Io(#[from] std::io::Error),

    #[error("event is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("event must be a JSON object")]
    NotAnObject,
}
