use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::config::settings::EnvelopeConfig;
use crate::errors::DeliveryError;
use crate::event::MonitoringEvent;
use crate::utils::constants::CLOUDEVENTS_SPEC_VERSION;

const DATA_CONTENT_TYPE: &str = "application/json";

/// CloudEvents 1.0 structured-mode envelope around one monitoring event.
#[derive(Debug, Serialize)]
pub struct CloudEvent<'a> {
    pub specversion: &'static str,
    pub id: String,
    pub source: &'a str,
    #[serde(rename = "type")]
    pub event_type: &'a str,
    pub time: DateTime<Utc>,
    pub datacontenttype: &'static str,
    pub data: &'a MonitoringEvent,
    /// "yes" when this dispatch minted a new token
    pub refreshed: &'static str,
}

impl<'a> CloudEvent<'a> {
    pub fn new(config: &'a EnvelopeConfig, data: &'a MonitoringEvent, refreshed: bool) -> Self {
        Self {
            specversion: CLOUDEVENTS_SPEC_VERSION,
            id: Uuid::new_v4().to_string(),
            source: &config.source,
            event_type: &config.event_type,
            time: Utc::now(),
            datacontenttype: DATA_CONTENT_TYPE,
            data,
            refreshed: if refreshed { "yes" } else { "no" },
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, DeliveryError> {
        Ok(serde_json::to_vec(self)?)
    }
}
