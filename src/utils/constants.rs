//! Shared constants and invariants

pub const DEFAULT_SAFETY_MARGIN_SECS: u64 = 10;
pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 5000;

// CloudEvents envelope
pub const CLOUDEVENTS_SPEC_VERSION: &str = "1.0";
pub const DEFAULT_EVENT_SOURCE: &str = "sensu/sensu-rhose-handler";
pub const DEFAULT_EVENT_TYPE: &str = "example.type";

// Client-credentials grant
pub const GRANT_TYPE_CLIENT_CREDENTIALS: &str = "client_credentials";
