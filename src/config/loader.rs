use std::fs;
use std::path::Path;

use regex::Regex;
use tracing::debug;

use crate::config::settings::SettingsConfig;
use crate::errors::ConfigError;

/// Load the optional YAML settings file. No path means all defaults.
pub fn load_settings(path: Option<&Path>) -> Result<SettingsConfig, ConfigError> {
    let Some(path) = path else {
        return Ok(SettingsConfig::default());
    };
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_settings(&content)
}

pub fn parse_settings(content: &str) -> Result<SettingsConfig, ConfigError> {
    let expanded = expand_env_vars(content);
    // an empty document is a valid, all-defaults settings file
    if expanded.trim().is_empty() {
        return Ok(SettingsConfig::default());
    }
    let settings: SettingsConfig = serde_yaml::from_str(&expanded)?;
    validate_settings(&settings)?;
    debug!("settings loaded: {:?}", settings);
    Ok(settings)
}

fn validate_settings(settings: &SettingsConfig) -> Result<(), ConfigError> {
    if settings.http.timeout_ms == 0 {
        return Err(ConfigError::InvalidValue {
            option: "http.timeout_ms",
            value: "0".to_owned(),
            reason: "must be greater than zero".to_owned(),
        });
    }
    if settings.envelope.source.trim().is_empty() {
        return Err(ConfigError::InvalidValue {
            option: "envelope.source",
            value: settings.envelope.source.to_owned(),
            reason: "must not be empty".to_owned(),
        });
    }
    if settings.envelope.event_type.trim().is_empty() {
        return Err(ConfigError::InvalidValue {
            option: "envelope.type",
            value: settings.envelope.event_type.to_owned(),
            reason: "must not be empty".to_owned(),
        });
    }
    Ok(())
}

/// Replace `${VAR}` and `${VAR:default}` with the environment value.
fn expand_env_vars(input: &str) -> String {
    let re = Regex::new(r"\$\{(\w+)(?::([^\}]+))?\}").expect("static regex");
    re.replace_all(input, |caps: &regex::Captures| {
        let var = &caps[1];
        let default = caps.get(2).map(|m| m.as_str()).unwrap_or("");
        std::env::var(var).unwrap_or_else(|_| default.to_string())
    })
    .to_string()
}
