// src/tests/common/mod.rs
pub use serde_json::json;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use clap::Parser;
use httpmock::MockServer;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::Serialize;

use crate::cache::token::TokenRecord;
use crate::cache::token_cache::TokenCache;
use crate::config::handler::{Args, Authentication, ClientCredentials, HandlerConfig};
use crate::config::settings::SettingsConfig;
use crate::dispatch::{Delivery, Dispatcher, TokenResolver};
use crate::errors::AcquireError;
use crate::event::MonitoringEvent;
use crate::keys::key_set::KeySet;
use crate::sources::{AcquireToken, ClientCredentialsAcquirer};
use crate::validation::TokenValidator;

pub const TEST_KID: &str = "rhose-test-key";
pub const TEST_SECRET: &[u8] = b"rhose-handler-test-signing-secret-01234567";
/// `TEST_SECRET` in base64; same text in the standard and URL-safe alphabets
pub const TEST_SECRET_B64: &str = "cmhvc2UtaGFuZGxlci10ZXN0LXNpZ25pbmctc2VjcmV0LTAxMjM0NTY3";

pub const TOKEN_PATH: &str = "/auth/realms/redhat-external/protocol/openid-connect/token";
pub const EVENTS_PATH: &str = "/events";

/// JWK set publishing `TEST_SECRET` as an HS256 key.
pub fn test_jwks_json() -> String {
    json!({
        "keys": [
            { "kty": "oct", "kid": TEST_KID, "alg": "HS256", "use": "sig", "k": TEST_SECRET_B64 }
        ]
    })
    .to_string()
}

pub fn test_key_set() -> KeySet {
    KeySet::from_json(&test_jwks_json()).expect("test key set")
}

#[derive(Serialize)]
struct TestClaims {
    sub: String,
    exp: i64,
}

/// UNIX time `secs` from now; negative goes into the past.
pub fn unix_in(secs: i64) -> i64 {
    Utc::now().timestamp() + secs
}

/// Token signed with the test key, expiring at `exp`.
pub fn mint_token(exp: i64) -> String {
    mint_token_with_secret(TEST_SECRET, TEST_KID, Algorithm::HS256, exp)
}

pub fn mint_token_with_secret(secret: &[u8], kid: &str, alg: Algorithm, exp: i64) -> String {
    let mut header = Header::new(alg);
    header.kid = Some(kid.to_owned());
    let claims = TestClaims {
        sub: "service-account-rhose".to_owned(),
        exp,
    };
    encode(&header, &claims, &EncodingKey::from_secret(secret)).expect("mint token")
}

/// Identity provider response body carrying `access_token`.
pub fn token_response(access_token: &str) -> String {
    json!({
        "access_token": access_token,
        "expires_at": unix_in(300),
        "refresh_expires_in": 0,
        "token_type": "Bearer",
        "scope": "profile email",
        "not-before-policy": 0
    })
    .to_string()
}

/// A trimmed-down Sensu check event.
pub fn sensu_event() -> MonitoringEvent {
    MonitoringEvent::from_value(json!({
        "entity": {
            "entity_class": "agent",
            "metadata": { "name": "webserver01", "namespace": "default" }
        },
        "check": {
            "metadata": { "name": "check-cpu" },
            "command": "check-cpu.sh -w 75 -c 90",
            "status": 2,
            "output": "CPU CRITICAL - 93%"
        },
        "timestamp": 1700000000
    }))
    .expect("fixture event is an object")
}

/// Handler configuration pointed at mock servers.
///
/// `sso` of `None` leaves authentication disabled.
pub fn handler_config(ingress: &MockServer, sso: Option<&MockServer>) -> HandlerConfig {
    let authentication = match sso {
        Some(sso) => Authentication::ClientCredentials(ClientCredentials {
            sso_url: sso.url(TOKEN_PATH),
            client_id: "rhose-client".to_owned(),
            client_secret: "rhose-secret".to_owned(),
        }),
        None => Authentication::Disabled,
    };
    HandlerConfig {
        webhook_url: ingress.url(EVENTS_PATH),
        authentication,
        timeout: Duration::from_secs(5),
        settings: SettingsConfig::default(),
    }
}

pub fn shared_test_keys() -> Arc<KeySet> {
    Arc::new(test_key_set())
}

const HANDLER_ENV: [&str; 7] = [
    "RHOSE_WEBHOOK_URL",
    "RHOSE_CLIENT_ID",
    "RHOSE_CLIENT_SECRET",
    "SSO_URL",
    "AUTHENTICATION_ENABLED",
    "RHOSE_HANDLER_CONFIG",
    "LOG_LEVEL",
];

/// Parse a handler command line with every handler variable cleared from the
/// environment. Callers must be `#[serial]`.
pub fn handler_args(argv: &[&str]) -> Args {
    for var in HANDLER_ENV {
        std::env::remove_var(var);
    }
    Args::try_parse_from(std::iter::once("sensu-rhose-handler").chain(argv.iter().copied()))
        .expect("handler arguments")
}

/// Production dispatcher for `config`, verifying against the test key set.
pub fn dispatcher_for(config: &HandlerConfig, cache: Arc<TokenCache>) -> Dispatcher {
    let resolver = match &config.authentication {
        Authentication::Disabled => TokenResolver::disabled(),
        Authentication::ClientCredentials(credentials) => TokenResolver::enabled(
            ClientCredentialsAcquirer::with_client(build_reqwest_client(), credentials.clone()),
            shared_test_keys(),
            cache,
            TokenValidator::new(config.settings.token),
        ),
    };
    Dispatcher::new(
        resolver,
        Delivery::with_client(build_reqwest_client(), config.webhook_url.as_str()),
        config.settings.envelope.clone(),
    )
}

/// Acquirer double handing out freshly signed tokens and counting calls.
#[derive(Debug, Default)]
pub struct CountingAcquirer {
    calls: AtomicUsize,
    reject_with: Option<u16>,
    delay: Duration,
}

impl CountingAcquirer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call fails as if the identity provider answered `status`.
    pub fn rejecting(status: u16) -> Self {
        Self {
            reject_with: Some(status),
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl AcquireToken for CountingAcquirer {
    async fn acquire(&self) -> Result<TokenRecord, AcquireError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) as i64 + 1;
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if let Some(status) = self.reject_with {
            return Err(AcquireError::Rejected { status });
        }
        // distinct exp per call keeps every minted token unique
        Ok(TokenRecord::new(mint_token(unix_in(3600 + n))).with_expires_at(unix_in(3600)))
    }
}

pub fn build_reqwest_client() -> Client {
    Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .expect("reqwest client")
}
