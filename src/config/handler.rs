use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use reqwest::Url;

use crate::config::settings::SettingsConfig;
use crate::errors::ConfigError;
use crate::utils::logging::LogLevel;

pub const WEBHOOK_URL: &str = "webhook-url";
pub const CLIENT_ID: &str = "client-id";
pub const CLIENT_SECRET: &str = "client-secret";
pub const SSO_URL: &str = "sso-url";

pub const WEBHOOK_URL_ENV: &str = "RHOSE_WEBHOOK_URL";
pub const CLIENT_ID_ENV: &str = "RHOSE_CLIENT_ID";
pub const CLIENT_SECRET_ENV: &str = "RHOSE_CLIENT_SECRET";
pub const SSO_URL_ENV: &str = "SSO_URL";
pub const AUTHENTICATION_ENABLED_ENV: &str = "AUTHENTICATION_ENABLED";

/// Sensu handler forwarding events to a Red Hat OpenShift Smart Events ingress
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// The webhook url to send messages to
    #[arg(short = 'w', long = WEBHOOK_URL, env = WEBHOOK_URL_ENV, hide_env_values = true)]
    pub webhook_url: Option<String>,

    /// The client id
    #[arg(short = 'c', long = CLIENT_ID, env = CLIENT_ID_ENV, hide_env_values = true)]
    pub client_id: Option<String>,

    /// The client secret
    #[arg(short = 's', long = CLIENT_SECRET, env = CLIENT_SECRET_ENV, hide_env_values = true)]
    pub client_secret: Option<String>,

    /// The sso to use to retrieve the token
    #[arg(short = 'o', long = SSO_URL, env = SSO_URL_ENV, hide_env_values = true)]
    pub sso_url: Option<String>,

    /// Is the authentication enabled (yes/no)
    #[arg(
        short = 'a',
        long = "authentication-enabled",
        env = AUTHENTICATION_ENABLED_ENV,
        default_value = "no",
        action = clap::ArgAction::Set,
        value_parser = parse_switch
    )]
    pub authentication_enabled: bool,

    /// Optional YAML settings file
    #[arg(long, env = "RHOSE_HANDLER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Read the event from this file instead of stdin
    #[arg(long)]
    pub event_file: Option<PathBuf>,

    /// Read newline-delimited events and dispatch them one after another
    #[arg(long)]
    pub stream: bool,

    #[arg(long, env = "LOG_LEVEL", value_enum)]
    pub log_level: Option<LogLevel>,
}

fn parse_switch(value: &str) -> Result<bool, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "yes" | "true" | "1" | "on" => Ok(true),
        "no" | "false" | "0" | "off" | "" => Ok(false),
        other => Err(format!("expected yes or no, got '{}'", other)),
    }
}

/// Identity provider coordinates for the client-credentials grant.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    pub sso_url: String,
    pub client_id: String,
    pub client_secret: String,
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("sso_url", &self.sso_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authentication {
    Disabled,
    ClientCredentials(ClientCredentials),
}

impl Authentication {
    pub fn is_enabled(&self) -> bool {
        matches!(self, Authentication::ClientCredentials(_))
    }
}

/// Fully resolved handler configuration.
#[derive(Debug, Clone)]
pub struct HandlerConfig {
    pub webhook_url: String,
    pub authentication: Authentication,
    pub timeout: Duration,
    pub settings: SettingsConfig,
}

impl HandlerConfig {
    /// Check required options and merge the settings file.
    ///
    /// Credentials are only required when authentication is enabled.
    pub fn resolve(args: &Args, settings: SettingsConfig) -> Result<Self, ConfigError> {
        let webhook_url = required(&args.webhook_url, WEBHOOK_URL, WEBHOOK_URL_ENV)?;
        check_url(WEBHOOK_URL, &webhook_url)?;

        let authentication = if args.authentication_enabled {
            let client_id = required(&args.client_id, CLIENT_ID, CLIENT_ID_ENV)?;
            let client_secret = required(&args.client_secret, CLIENT_SECRET, CLIENT_SECRET_ENV)?;
            let sso_url = required(&args.sso_url, SSO_URL, SSO_URL_ENV)?;
            check_url(SSO_URL, &sso_url)?;
            Authentication::ClientCredentials(ClientCredentials {
                sso_url,
                client_id,
                client_secret,
            })
        } else {
            Authentication::Disabled
        };

        Ok(Self {
            webhook_url,
            authentication,
            timeout: Duration::from_millis(settings.http.timeout_ms),
            settings,
        })
    }
}

fn required(
    value: &Option<String>,
    option: &'static str,
    env: &'static str,
) -> Result<String, ConfigError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
        .ok_or(ConfigError::MissingRequired { option, env })
}

fn check_url(option: &'static str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value).map_err(|e| ConfigError::InvalidValue {
        option,
        value: value.to_owned(),
        reason: e.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(ConfigError::InvalidValue {
            option,
            value: value.to_owned(),
            reason: format!("unsupported scheme '{}'", scheme),
        }),
    }
}
